//! The payment collaborator seam.
//!
//! Confirmation and refunds consult a [`PaymentGateway`] for the status of a
//! merchant payment. [`PaymentLedger`] is the bundled implementation: it
//! keeps payments in the same SQLite store through its own connection, so
//! it can be queried while a reservation transaction is open elsewhere.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::database::{systemtime_to_unix_secs, unix_secs_to_systemtime, Database, DatabaseConfig};
use crate::error::{Error, Result};
use crate::reservation::{ReservationId, ValidationError};
use crate::sequence::{date_key, format_identifier, SequenceCounter, PAYMENT_CATEGORY};

/// Status of a merchant payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Recorded, not yet paid.
    Ready,
    /// Paid in full.
    Paid,
    /// The payment attempt failed.
    Failed,
    /// Fully refunded.
    Refunded,
    /// Part of the amount was refunded.
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
        }
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ready, Self::Paid | Self::Failed)
                | (
                    Self::Paid | Self::PartiallyRefunded,
                    Self::Refunded | Self::PartiallyRefunded
                )
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "READY" => Ok(Self::Ready),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            "PARTIALLY_REFUNDED" => Ok(Self::PartiallyRefunded),
            _ => Err(ValidationError {
                field: "payment_status".into(),
                message: format!("unknown payment status: {s}"),
            }),
        }
    }
}

/// A merchant payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Merchant id, e.g. `P20261018000001`.
    pub merchant_id: String,
    /// Reservation the payment was taken for, if known.
    pub reservation_id: Option<String>,
    /// Amount charged, in minor currency units.
    pub amount: i64,
    /// Amount refunded so far.
    pub refunded_amount: i64,
    /// Current status.
    pub status: PaymentStatus,
    /// Time of the last change.
    pub updated_at: SystemTime,
}

/// Source of truth for payment status.
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGateway {
    /// Looks up a payment by merchant id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown merchant id, or any error
    /// from the underlying source.
    fn payment(&self, merchant_id: &str) -> Result<PaymentRecord>;
}

const INSERT_PAYMENT: &str = r"
    INSERT INTO payments (merchant_id, reservation_id, amount, refunded_amount, status, updated_at)
    VALUES (?, ?, ?, 0, 'READY', ?)
";

const SELECT_PAYMENT: &str = r"
    SELECT merchant_id, reservation_id, amount, refunded_amount, status, updated_at
    FROM payments
    WHERE merchant_id = ?
";

const UPDATE_PAYMENT: &str = r"
    UPDATE payments
    SET status = ?1, refunded_amount = ?2, updated_at = ?3
    WHERE merchant_id = ?4 AND status = ?5
";

fn row_to_payment(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaymentRecord> {
    let status: String = row.get(4)?;
    let updated_secs: i64 = row.get(5)?;
    Ok(PaymentRecord {
        merchant_id: row.get(0)?,
        reservation_id: row.get(1)?,
        amount: row.get(2)?,
        refunded_amount: row.get(3)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        updated_at: unix_secs_to_systemtime(updated_secs),
    })
}

fn load(conn: &Connection, merchant_id: &str) -> Result<PaymentRecord> {
    conn.query_row(SELECT_PAYMENT, [merchant_id], row_to_payment)
        .optional()?
        .ok_or_else(|| Error::NotFound {
            resource: format!("payment {merchant_id}"),
        })
}

/// SQLite-backed payment records sharing the reservation store.
///
/// # Examples
///
/// ```no_run
/// use holdfast::database::DatabaseConfig;
/// use holdfast::payment::{PaymentGateway, PaymentLedger, PaymentStatus};
///
/// let mut payments = PaymentLedger::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
/// let record = payments.record(None, 24_000).unwrap();
/// payments.settle(&record.merchant_id).unwrap();
/// assert_eq!(payments.payment(&record.merchant_id).unwrap().status, PaymentStatus::Paid);
/// ```
#[derive(Debug)]
pub struct PaymentLedger {
    db: Database,
}

impl PaymentLedger {
    /// Opens a dedicated connection to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        Ok(Self::new(Database::open(config)?))
    }

    /// Wraps an existing connection.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Records a new `READY` payment and issues its merchant id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative amount, or a store error.
    pub fn record(
        &mut self,
        reservation_id: Option<&ReservationId>,
        amount: i64,
    ) -> Result<PaymentRecord> {
        self.record_at(reservation_id, amount, SystemTime::now())
    }

    /// Same as [`record`](Self::record) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative amount, or a store error.
    pub fn record_at(
        &mut self,
        reservation_id: Option<&ReservationId>,
        amount: i64,
        now: SystemTime,
    ) -> Result<PaymentRecord> {
        if amount < 0 {
            return Err(Error::Validation {
                field: "amount".into(),
                message: "payment amount must not be negative".into(),
            });
        }

        let key = date_key(now);
        let merchant_id = self.db.write(|tx| {
            let sequence = SequenceCounter::next_in(tx, PAYMENT_CATEGORY, &key)?;
            let merchant_id = format_identifier(PAYMENT_CATEGORY, &key, sequence);
            tx.execute(
                INSERT_PAYMENT,
                params![
                    merchant_id,
                    reservation_id.map(ReservationId::as_str),
                    amount,
                    systemtime_to_unix_secs(now)?,
                ],
            )?;
            Ok(merchant_id)
        })?;

        log::debug!("recorded payment {merchant_id} for {amount}");
        load(self.db.connection(), &merchant_id)
    }

    /// Marks a `READY` payment as paid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a validation error
    /// if the payment is not `READY`.
    pub fn settle(&mut self, merchant_id: &str) -> Result<PaymentRecord> {
        self.transition(merchant_id, |_| Ok((PaymentStatus::Paid, 0)))
    }

    /// Marks a `READY` payment as failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a validation error
    /// if the payment is not `READY`.
    pub fn mark_failed(&mut self, merchant_id: &str) -> Result<PaymentRecord> {
        self.transition(merchant_id, |_| Ok((PaymentStatus::Failed, 0)))
    }

    /// Refunds `amount` of a paid payment.
    ///
    /// The payment becomes `REFUNDED` once the whole amount has been
    /// returned, `PARTIALLY_REFUNDED` before that.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, an amount above
    /// what is left to refund, or a payment that was never paid.
    pub fn refund(&mut self, merchant_id: &str, amount: i64) -> Result<PaymentRecord> {
        if amount <= 0 {
            return Err(Error::Validation {
                field: "amount".into(),
                message: "refund amount must be positive".into(),
            });
        }
        self.transition(merchant_id, |current| {
            let refunded = current.refunded_amount + amount;
            if refunded > current.amount {
                return Err(Error::Validation {
                    field: "amount".into(),
                    message: format!(
                        "refund of {amount} exceeds the {} left on {merchant_id}",
                        current.amount - current.refunded_amount
                    ),
                });
            }
            let status = if refunded == current.amount {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            };
            Ok((status, amount))
        })
    }

    /// Looks up a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, merchant_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self
            .db
            .connection()
            .query_row(SELECT_PAYMENT, [merchant_id], row_to_payment)
            .optional()?)
    }

    fn transition<F>(&mut self, merchant_id: &str, next: F) -> Result<PaymentRecord>
    where
        F: FnOnce(&PaymentRecord) -> Result<(PaymentStatus, i64)>,
    {
        let now = systemtime_to_unix_secs(SystemTime::now())?;
        let record = self.db.write(|tx| {
            let current = load(tx, merchant_id)?;
            let (status, refund) = next(&current)?;
            if !current.status.can_transition_to(status) {
                return Err(Error::Validation {
                    field: "payment_status".into(),
                    message: format!(
                        "payment {merchant_id} cannot move from {} to {status}",
                        current.status
                    ),
                });
            }
            tx.execute(
                UPDATE_PAYMENT,
                params![
                    status.as_str(),
                    current.refunded_amount + refund,
                    now,
                    merchant_id,
                    current.status.as_str(),
                ],
            )?;
            load(tx, merchant_id)
        })?;

        log::debug!("payment {merchant_id} is now {}", record.status);
        Ok(record)
    }
}

impl PaymentGateway for PaymentLedger {
    fn payment(&self, merchant_id: &str) -> Result<PaymentRecord> {
        load(self.db.connection(), merchant_id)
    }
}
