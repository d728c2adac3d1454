//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements a port trait of the intake pipeline
//! - Delegates to the repository layer for database operations
//! - Translates `DatabaseError` into the port's error type
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PgCaseStore, PgIntakeStore};
//! use domain_intake::IntakeService;
//!
//! let service = IntakeService::new(
//!     Arc::new(PgIntakeStore::new(pool.clone(), Some(FileStore::new("uploads")))),
//!     Arc::new(PgCaseStore::new(pool)),
//! );
//! ```

pub mod intake;
pub mod cases;

pub use intake::PgIntakeStore;
pub use cases::PgCaseStore;
