//! Infrastructure Database Layer
//!
//! This crate provides the database infrastructure for the claims desk,
//! storing users, vendors, cases, inbound email and evidence on PostgreSQL
//! using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern, providing data access abstractions
//! that hide the database implementation details from the domain layer.
//! Repositories speak in domain types; the `*Row` structs next to them are
//! the only place that knows about column layout.
//!
//! Domain ports (the intake pipeline's [`domain_intake::IntakeStore`] and
//! [`domain_intake::CaseStore`]) are implemented in [`adapters`].
//!
//! # Schema
//!
//! The schema lives in the workspace `migrations/` directory and is applied
//! with [`run_migrations`] when the server starts. Enumerations are stored as
//! text and the nested case sections (claimant, insured, police, ...) as JSONB.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::repositories::CaseRepository;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims_desk")).await?;
//! run_migrations(&pool).await?;
//! let cases = CaseRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;
pub mod files;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use files::FileStore;
pub use repositories::{Page, Pagination};
