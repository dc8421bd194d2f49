//! Error types for the holdfast library.
//!
//! This module provides the error hierarchy shared by the inventory ledger,
//! the sequence counter, and the reservation state machine, using `thiserror`
//! for ergonomic error handling.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::payment::PaymentStatus;
use crate::reservation::ReservationStatus;

/// Result type alias for operations that may fail with a holdfast error.
///
/// # Examples
///
/// ```
/// use holdfast::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the holdfast library.
///
/// Callers are expected to tell "sold out" ([`Error::InsufficientInventory`])
/// apart from "this booking can no longer be changed"
/// ([`Error::InvalidStateTransition`]); the two are separate variants.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested units are not available.
    #[error("insufficient inventory for {unit_id}: {detail}")]
    InsufficientInventory {
        /// The unit that could not be reserved.
        unit_id: String,
        /// Which date or seat fell short, and by how much.
        detail: String,
    },

    /// A status change was attempted from a status that does not allow it.
    #[error("reservation {reservation_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// The reservation whose status was not changed.
        reservation_id: String,
        /// The status the reservation was found in.
        from: ReservationStatus,
        /// The status that was requested.
        to: ReservationStatus,
    },

    /// Waiting for the store's write lock exceeded the configured bound.
    #[error("database lock timeout after {seconds}s")]
    LockTimeout {
        /// The number of seconds waited before timing out.
        seconds: u64,
    },

    /// Two callers raced to create the same sequence counter row and the
    /// internal retry also lost.
    #[error("sequence counter {category}/{date_key} could not be created")]
    DuplicateSequenceRequest {
        /// Counter category.
        category: String,
        /// Counter day key (`yyyyMMdd`).
        date_key: String,
    },

    /// The requested resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// The payment collaborator has not reached the status the transition needs.
    #[error("payment {merchant_id} is {status}")]
    PaymentNotSettled {
        /// The merchant id of the payment.
        merchant_id: String,
        /// The status reported by the payment collaborator.
        status: PaymentStatus,
    },

    /// The settled amount differs from the reservation total.
    #[error("payment {merchant_id} amount {actual} does not match reservation total {expected}")]
    PaymentAmountMismatch {
        /// The merchant id of the payment.
        merchant_id: String,
        /// The reservation total.
        expected: i64,
        /// The amount recorded by the payment collaborator.
        actual: i64,
    },

    /// The payment was taken for, or already settled, another reservation.
    #[error("payment {merchant_id} belongs to reservation {owner}")]
    PaymentBelongsToAnother {
        /// The merchant id of the payment.
        merchant_id: String,
        /// The reservation the payment is tied to.
        owner: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data directory was not found and auto-initialization is disabled.
    #[error("data directory not found: {}", path.display())]
    DataDirectoryNotFound {
        /// The expected path to the data directory.
        path: PathBuf,
    },

    /// An unsupported schema version was encountered.
    #[error("unsupported schema version: expected {expected}, found {found}")]
    UnsupportedSchemaVersion {
        /// The expected schema version.
        expected: u32,
        /// The schema version found in the database.
        found: u32,
    },
}

impl From<crate::reservation::ValidationError> for Error {
    fn from(err: crate::reservation::ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl Error {
    /// Returns true when retrying the same call later may succeed.
    ///
    /// Only lock timeouts qualify; every other failure is deterministic for
    /// the current state of the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Error;
    ///
    /// assert!(Error::LockTimeout { seconds: 5 }.is_retryable());
    /// assert!(!Error::NotFound { resource: "R1".into() }.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Returns true for the "sold out" family of failures.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        matches!(self, Self::InsufficientInventory { .. })
    }

    /// Returns true when the reservation can no longer be changed this way.
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidStateTransition { .. })
    }

    /// Check if error indicates a missing reservation, unit, or payment.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Reclassifies SQLite busy/locked failures as [`Error::LockTimeout`].
    ///
    /// The connection's busy handler has already waited `waited` by the time
    /// SQLite reports `SQLITE_BUSY`, so the wait bound is exhausted.
    #[must_use]
    pub(crate) fn into_lock_timeout(self, waited: Duration) -> Self {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(ref failure, _))
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::LockTimeout {
                    seconds: waited.as_secs(),
                }
            }
            other => other,
        }
    }
}
