//! Repository implementations for domain entities
//!
//! This module provides concrete repository implementations that handle
//! database access for each domain aggregate. Repositories encapsulate
//! SQL queries and map between database rows and domain types.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Rows are read into `#[derive(FromRow)]` structs and converted to
//!   domain types, failing with [`DatabaseError::CorruptRow`] on bad data
//! - Enumerations round-trip through their `as_str`/`FromStr` spelling
//! - Multi-statement writes run in a transaction

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

pub mod users;
pub mod tokens;
pub mod clients;
pub mod vendors;
pub mod cases;
pub mod intake;
pub mod evidence;

pub use users::UserRepository;
pub use tokens::TokenRepository;
pub use clients::ClientRepository;
pub use vendors::VendorRepository;
pub use cases::{CaseRepository, CaseFilter};
pub use intake::IntakeRepository;
pub use evidence::EvidenceRepository;

/// Page request for list queries, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Builds a page request, clamping out-of-range values
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results with the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self { items, total, page: pagination.page, per_page: pagination.per_page }
    }

    pub fn total_pages(&self) -> i64 {
        let per_page = i64::from(self.per_page.max(1));
        (self.total + per_page - 1) / per_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Parses a stored enumeration, reporting the table on failure
pub(crate) fn parse_column<T>(table: &'static str, value: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| DatabaseError::corrupt(table, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 20);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);

        let p = Pagination::new(Some(3), Some(0));
        assert_eq!(p.per_page, 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_page_offsets() {
        let p = Pagination::new(Some(4), Some(25));
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 75);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 41, Pagination::new(Some(1), Some(20)));
        assert_eq!(page.total_pages(), 3);

        let empty: Page<u8> = Page::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn test_parse_column_reports_table() {
        let err = parse_column::<domain_cases::CaseStatus>("cases", "Lost").unwrap_err();
        assert!(err.to_string().contains("cases"));
    }
}
