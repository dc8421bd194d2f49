//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use holdfast::Error as LibError;
use std::fmt;
use std::path::PathBuf;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Timeout waiting for the store's write lock.
    Timeout(u64),

    /// Store not found (and auto-init disabled).
    NoDataDirectory(PathBuf),

    /// Configuration error.
    Config(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Semantic failure (sold out, invalid transition, unsettled payment)
    /// - 2: Timeout waiting for the write lock
    /// - 3: No data directory found
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Configuration error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(lib_err) => match lib_err {
                LibError::InsufficientInventory { .. }
                | LibError::InvalidStateTransition { .. }
                | LibError::PaymentNotSettled { .. }
                | LibError::PaymentAmountMismatch { .. }
                | LibError::PaymentBelongsToAnother { .. }
                | LibError::NotFound { .. } => 1,
                LibError::Validation { .. } => 4,
                LibError::Io(_) => 5,
                LibError::Configuration(_) => 7,
                _ => 6,
            },
            CliError::Timeout(_) => 2,
            CliError::NoDataDirectory(_) => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Timeout(seconds) => {
                write!(f, "Timeout waiting for database lock after {seconds}s")
            }
            CliError::NoDataDirectory(path) => write!(
                f,
                "Data directory not found at {} (run `holdfast init` or drop --disable-autoinit)",
                path.display()
            ),
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        match e {
            LibError::LockTimeout { seconds } => CliError::Timeout(seconds),
            LibError::DataDirectoryNotFound { path } => CliError::NoDataDirectory(path),
            other => CliError::Library(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<holdfast::ValidationError> for CliError {
    fn from(e: holdfast::ValidationError) -> Self {
        CliError::InvalidArguments(format!("{}: {}", e.field, e.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_failures_exit_with_one() {
        let sold_out = CliError::from(LibError::InsufficientInventory {
            unit_id: "deluxe".into(),
            detail: "2026-10-18 has 0".into(),
        });
        assert_eq!(sold_out.exit_code(), 1);

        let transition = CliError::from(LibError::InvalidStateTransition {
            reservation_id: "R20261018000001".into(),
            from: holdfast::ReservationStatus::Cancelled,
            to: holdfast::ReservationStatus::Confirmed,
        });
        assert_eq!(transition.exit_code(), 1);

        let reused = CliError::from(LibError::PaymentBelongsToAnother {
            merchant_id: "P20261018000001".into(),
            owner: "R20261018000001".into(),
        });
        assert_eq!(reused.exit_code(), 1);
    }

    #[test]
    fn test_lock_timeout_and_missing_store_have_their_own_codes() {
        let timeout = CliError::from(LibError::LockTimeout { seconds: 5 });
        assert!(matches!(timeout, CliError::Timeout(5)));
        assert_eq!(timeout.exit_code(), 2);

        let missing = CliError::from(LibError::DataDirectoryNotFound {
            path: PathBuf::from("/nowhere"),
        });
        assert_eq!(missing.exit_code(), 3);
        assert!(missing.to_string().contains("/nowhere"));
    }

    #[test]
    fn test_remaining_codes() {
        assert_eq!(CliError::InvalidArguments("x".into()).exit_code(), 4);
        assert_eq!(
            CliError::from(LibError::Validation {
                field: "quantity".into(),
                message: "must be positive".into(),
            })
            .exit_code(),
            4
        );
        assert_eq!(CliError::Io(std::io::Error::other("disk")).exit_code(), 5);
        assert_eq!(
            CliError::from(LibError::UnsupportedSchemaVersion {
                expected: 1,
                found: 9
            })
            .exit_code(),
            6
        );
        assert_eq!(CliError::Config("bad".into()).exit_code(), 7);
    }
}
