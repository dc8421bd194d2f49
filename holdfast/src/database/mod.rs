//! Database layer for the shared reservation store.
//!
//! This module provides a SQLite-based storage layer holding inventory,
//! reservations, holds, sequence counters, and payments, including
//! connection management, schema versioning, and row operations.
//!
//! # Examples
//!
//! ```no_run
//! use holdfast::database::{Database, DatabaseConfig};
//! use holdfast::ReservationStatus;
//!
//! let db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
//!
//! let pending = Database::list_reservations(db.connection(), Some(ReservationStatus::Pending))
//!     .unwrap();
//! for reservation in pending {
//!     println!("{}", reservation.id());
//! }
//! ```

mod config;
mod connection;
pub mod migrations;
mod operations;
mod schema;
mod transaction;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export public API
pub use config::{
    default_data_dir, resolve_data_dir, resolve_database_path, DatabaseConfig,
    DATABASE_FILE_NAME, DATA_DIR_ENV,
};
pub use connection::Database;
pub use operations::StatusChange;

pub(crate) use operations::{
    date_to_sql, sql_to_date, systemtime_to_unix_secs, unix_secs_to_systemtime,
};

// Re-export migration functions for advanced use cases
pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
