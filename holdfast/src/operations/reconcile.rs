//! Expiration sweep for abandoned PENDING reservations.
//!
//! A sweep selects reservations that have been PENDING longer than the hold
//! timeout and expires each one in its own transaction. Items are
//! independent: a failure is logged and recorded, and the sweep moves on.
//! A reservation confirmed or cancelled between selection and expiry is
//! reported as skipped.

use std::time::{Duration, SystemTime};

use crate::config::Config;
use crate::database::Database;
use crate::error::Result;
use crate::reservation::{ReservationId, ReservationStatus};

use super::create::ReservationOperations;
use super::transition::EXPIRED_REASON;

/// One reservation the sweep could not expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    /// The reservation that was left untouched.
    pub reservation_id: ReservationId,
    /// Why it failed.
    pub error: String,
}

/// Result of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepResult {
    /// Number of stale PENDING reservations selected.
    pub examined: usize,
    /// Reservations expired (or that would be, in dry-run mode).
    pub expired: Vec<ReservationId>,
    /// Reservations that changed status before they could be expired.
    pub skipped: Vec<ReservationId>,
    /// Reservations whose expiry failed.
    pub failures: Vec<SweepFailure>,
    /// Whether the sweep only reported candidates.
    pub dry_run: bool,
}

/// Periodically expires reservations whose hold timed out.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use holdfast::database::{Database, DatabaseConfig};
/// use holdfast::operations::ExpirationReconciler;
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
/// let reconciler = ExpirationReconciler::new(Duration::from_secs(300));
/// let result = reconciler.sweep(&mut db).unwrap();
/// println!("expired {} reservations", result.expired.len());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationReconciler {
    hold_timeout: Duration,
}

impl ExpirationReconciler {
    /// Creates a reconciler that expires reservations PENDING longer than `hold_timeout`.
    #[must_use]
    pub const fn new(hold_timeout: Duration) -> Self {
        Self { hold_timeout }
    }

    /// Creates a reconciler using the configured hold timeout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.hold_timeout())
    }

    /// Returns the hold timeout.
    #[must_use]
    pub const fn hold_timeout(&self) -> Duration {
        self.hold_timeout
    }

    /// Runs one sweep now.
    ///
    /// # Errors
    ///
    /// Returns an error only if the candidates cannot be selected; per-item
    /// failures are reported in [`SweepResult::failures`].
    pub fn sweep(&self, db: &mut Database) -> Result<SweepResult> {
        self.sweep_at(db, SystemTime::now(), false)
    }

    /// Runs one sweep as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Self::sweep`].
    pub fn sweep_at(
        &self,
        db: &mut Database,
        now: SystemTime,
        dry_run: bool,
    ) -> Result<SweepResult> {
        let cutoff = now.checked_sub(self.hold_timeout).unwrap_or(SystemTime::UNIX_EPOCH);
        let candidates = Database::find_stale_pending(db.connection(), cutoff)?;

        let mut result = SweepResult {
            examined: candidates.len(),
            dry_run,
            ..SweepResult::default()
        };

        if dry_run {
            result.expired = candidates;
            return Ok(result);
        }

        for id in candidates {
            match ReservationOperations::release_transition(
                db,
                &id,
                ReservationStatus::Cancelled,
                EXPIRED_REASON,
                now,
            ) {
                Ok(released) if released.changed => result.expired.push(id),
                Ok(_) => {
                    log::debug!("{id} was cancelled before the sweep reached it");
                    result.skipped.push(id);
                }
                Err(err) if err.is_invalid_transition() => {
                    log::debug!("skipping {id}: {err}");
                    result.skipped.push(id);
                }
                Err(err) => {
                    log::warn!("failed to expire {id}: {err}");
                    result.failures.push(SweepFailure {
                        reservation_id: id,
                        error: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "sweep examined {}, expired {}, skipped {}, failed {}",
            result.examined,
            result.expired.len(),
            result.skipped.len(),
            result.failures.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_test_database, two_nights};
    use crate::inventory::{BookableUnit, InventoryLedger};
    use crate::operations::{CancelReservationRequest, CreateReservationRequest};
    use crate::reservation::TargetType;

    const TIMEOUT: Duration = Duration::from_secs(300);

    fn setup(db: &mut Database) {
        db.write(|tx| {
            InventoryLedger::register_unit(tx, &BookableUnit::new("deluxe", TargetType::Room, 5)?)?;
            InventoryLedger::materialize_dates(tx, "deluxe", two_nights(), None)
        })
        .unwrap();
    }

    fn book_at(db: &mut Database, created: SystemTime) -> ReservationId {
        let request =
            CreateReservationRequest::dated(TargetType::Room, "deluxe", two_nights(), 1, "guest");
        ReservationOperations::create_at(db, &request, created)
            .unwrap()
            .id()
            .clone()
    }

    fn remaining(db: &Database) -> u32 {
        InventoryLedger::date_inventory(db.connection(), "deluxe", two_nights()).unwrap()[0]
            .remaining
    }

    #[test]
    fn test_sweep_expires_only_stale_reservations() {
        let mut db = create_test_database();
        setup(&mut db);
        let now = SystemTime::now();

        let stale = book_at(&mut db, now - Duration::from_secs(600));
        let fresh = book_at(&mut db, now - Duration::from_secs(60));
        assert_eq!(remaining(&db), 3);

        let result = ExpirationReconciler::new(TIMEOUT).sweep_at(&mut db, now, false).unwrap();
        assert_eq!(result.examined, 1);
        assert_eq!(result.expired, vec![stale.clone()]);
        assert!(result.failures.is_empty());
        assert_eq!(remaining(&db), 4);

        let expired = ReservationOperations::get(&db, &stale).unwrap();
        assert_eq!(expired.status(), ReservationStatus::Cancelled);
        assert_eq!(expired.status_reason(), Some(EXPIRED_REASON));
        assert_eq!(
            ReservationOperations::get(&db, &fresh).unwrap().status(),
            ReservationStatus::Pending
        );
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let mut db = create_test_database();
        setup(&mut db);
        let now = SystemTime::now();
        let stale = book_at(&mut db, now - Duration::from_secs(600));

        let result = ExpirationReconciler::new(TIMEOUT).sweep_at(&mut db, now, true).unwrap();
        assert!(result.dry_run);
        assert_eq!(result.expired, vec![stale.clone()]);
        assert_eq!(remaining(&db), 4);
        assert_eq!(
            ReservationOperations::get(&db, &stale).unwrap().status(),
            ReservationStatus::Pending
        );
    }

    #[test]
    fn test_second_sweep_finds_nothing() {
        let mut db = create_test_database();
        setup(&mut db);
        let now = SystemTime::now();
        book_at(&mut db, now - Duration::from_secs(600));

        let reconciler = ExpirationReconciler::new(TIMEOUT);
        assert_eq!(reconciler.sweep_at(&mut db, now, false).unwrap().expired.len(), 1);
        let second = reconciler.sweep_at(&mut db, now, false).unwrap();
        assert_eq!(second.examined, 0);
        assert_eq!(remaining(&db), 5);
    }

    #[test]
    fn test_cancelled_reservations_are_not_selected() {
        let mut db = create_test_database();
        setup(&mut db);
        let now = SystemTime::now();
        let id = book_at(&mut db, now - Duration::from_secs(600));
        ReservationOperations::cancel(&mut db, &CancelReservationRequest::new(id, "user")).unwrap();

        let result = ExpirationReconciler::new(TIMEOUT).sweep_at(&mut db, now, false).unwrap();
        assert_eq!(result.examined, 0);
        assert_eq!(remaining(&db), 5);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            hold_timeout_seconds: Some(42),
            ..Default::default()
        };
        assert_eq!(
            ExpirationReconciler::from_config(&config).hold_timeout(),
            Duration::from_secs(42)
        );
    }
}
