//! Per-day, per-category sequence counters for human-readable identifiers.
//!
//! Counters live in the `sequence_counters` table keyed by
//! `(date_key, category)`. Every increment is a read-modify-write inside the
//! store's exclusive write transaction, so concurrent callers (threads or
//! processes) never observe the same value twice.

use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::database::Database;
use crate::error::{Error, Result};

/// Category prefix for payment merchant ids.
pub const PAYMENT_CATEGORY: &str = "P";

const SELECT_NEXT_VALUE: &str =
    "SELECT next_value FROM sequence_counters WHERE date_key = ? AND category = ?";

const INSERT_COUNTER: &str =
    "INSERT INTO sequence_counters (date_key, category, next_value) VALUES (?, ?, 2)";

const UPDATE_COUNTER: &str =
    "UPDATE sequence_counters SET next_value = ? WHERE date_key = ? AND category = ?";

/// Formats `<category><date_key><6-digit sequence>`.
///
/// Sequences past 999 999 keep all their digits.
///
/// # Examples
///
/// ```
/// use holdfast::sequence::format_identifier;
///
/// assert_eq!(format_identifier("S", "20261018", 7), "S20261018000007");
/// ```
#[must_use]
pub fn format_identifier(category: &str, date_key: &str, sequence: u64) -> String {
    format!("{category}{date_key}{sequence:06}")
}

/// Returns the `yyyyMMdd` key of the UTC day containing `time`.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use holdfast::sequence::date_key;
///
/// let time = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400 * 365);
/// assert_eq!(date_key(time), "19710101");
/// ```
#[must_use]
pub fn date_key(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%Y%m%d").to_string()
}

/// Returns the `yyyyMMdd` key of a calendar date.
#[must_use]
pub fn date_key_for(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Issues strictly increasing integers per `(category, date_key)`.
///
/// # Examples
///
/// ```no_run
/// use holdfast::database::{Database, DatabaseConfig};
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
/// let first = db.next_sequence("R", "20261018").unwrap();
/// let second = db.next_sequence("R", "20261018").unwrap();
/// assert!(second > first);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceCounter;

impl SequenceCounter {
    /// Draws the next value inside the caller's write transaction.
    ///
    /// The first value for a fresh key is 1. If creating the counter row
    /// collides with a concurrent creator the draw is retried once; a
    /// second collision surfaces as [`Error::DuplicateSequenceRequest`].
    ///
    /// `conn` must be inside an immediate transaction (see
    /// [`Database::write`]); otherwise two callers may read the same value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed, if the counter row cannot
    /// be created after one retry, or on any database failure.
    pub fn next_in(conn: &Connection, category: &str, date_key: &str) -> Result<u64> {
        validate_key(category, date_key)?;

        match Self::draw(conn, category, date_key) {
            Err(err) if is_constraint_violation(&err) => {
                log::debug!("sequence {category}/{date_key} created concurrently, retrying");
                Self::draw(conn, category, date_key).map_err(|err| {
                    if is_constraint_violation(&err) {
                        Error::DuplicateSequenceRequest {
                            category: category.to_string(),
                            date_key: date_key.to_string(),
                        }
                    } else {
                        err
                    }
                })
            }
            other => other,
        }
    }

    fn draw(conn: &Connection, category: &str, date_key: &str) -> Result<u64> {
        let current: Option<i64> = conn
            .query_row(SELECT_NEXT_VALUE, params![date_key, category], |row| {
                row.get(0)
            })
            .optional()?;

        match current {
            None => {
                conn.execute(INSERT_COUNTER, params![date_key, category])?;
                Ok(1)
            }
            Some(value) => {
                conn.execute(UPDATE_COUNTER, params![value + 1, date_key, category])?;
                #[allow(clippy::cast_sign_loss)]
                Ok(value.max(1) as u64)
            }
        }
    }
}

fn is_constraint_violation(err: &Error) -> bool {
    matches!(
        err,
        Error::Database(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == ErrorCode::ConstraintViolation
    )
}

fn validate_key(category: &str, date_key: &str) -> Result<()> {
    if category.is_empty() || !category.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::Validation {
            field: "category".into(),
            message: format!("category must be uppercase ASCII letters, got '{category}'"),
        });
    }
    if date_key.len() != 8 || !date_key.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation {
            field: "date_key".into(),
            message: format!("date key must be yyyyMMdd, got '{date_key}'"),
        });
    }
    Ok(())
}

impl Database {
    /// Draws the next sequence value in its own write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the write lock is not obtained in
    /// time, or any error from [`SequenceCounter::next_in`].
    pub fn next_sequence(&mut self, category: &str, date_key: &str) -> Result<u64> {
        self.write(|tx| SequenceCounter::next_in(tx, category, date_key))
    }
}
