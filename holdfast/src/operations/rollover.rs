//! Daily advance of the bookable date window.
//!
//! A run deletes past-dated inventory rows that no live reservation holds,
//! and materializes the row `horizon_days` ahead for every sellable unit.
//! The two steps are independent and both run in one write transaction.

use chrono::{Days, NaiveDate, Utc};
use rusqlite::Connection;

use crate::config::Config;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::inventory::{DateInventory, InventoryLedger, StayPeriod};

/// Result of one rollover run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverResult {
    /// Rows deleted (or that would be, in dry-run mode).
    pub purged: Vec<DateInventory>,
    /// Rows created (or that would be, in dry-run mode).
    pub materialized: usize,
    /// Sellable units rolled forward.
    pub units: usize,
    /// Last date of the window.
    pub horizon: NaiveDate,
    /// Whether the run only reported changes.
    pub dry_run: bool,
}

/// Keeps a fixed-width window of dated inventory ahead of today.
///
/// # Examples
///
/// ```no_run
/// use holdfast::database::{Database, DatabaseConfig};
/// use holdfast::operations::InventoryRollover;
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
/// let result = InventoryRollover::new(30).with_backfill(true).run(&mut db, false).unwrap();
/// println!("purged {}, materialized {}", result.purged.len(), result.materialized);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRollover {
    horizon_days: u32,
    backfill: bool,
}

impl InventoryRollover {
    /// Creates a rollover that materializes the date `horizon_days` ahead.
    #[must_use]
    pub const fn new(horizon_days: u32) -> Self {
        Self {
            horizon_days,
            backfill: false,
        }
    }

    /// Creates a rollover using the configured horizon.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.horizon_days())
    }

    /// Materializes every missing date from today through the horizon,
    /// instead of the horizon date alone.
    #[must_use]
    pub const fn with_backfill(mut self, backfill: bool) -> Self {
        self.backfill = backfill;
        self
    }

    /// Returns the horizon in days.
    #[must_use]
    pub const fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Runs one rollover for the current UTC day.
    ///
    /// # Errors
    ///
    /// See [`Self::run_at`].
    pub fn run(&self, db: &mut Database, dry_run: bool) -> Result<RolloverResult> {
        self.run_at(db, Utc::now().date_naive(), dry_run)
    }

    /// Runs one rollover as if `today` were the current day.
    ///
    /// Rows dated strictly before `today` are purged unless a PENDING,
    /// CONFIRMED, or PARTIALLY_REFUNDED reservation still holds them.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the horizon overflows the calendar,
    /// [`Error::LockTimeout`] if the write lock is not obtained in time, or
    /// a database error. Nothing is changed when an error is returned.
    pub fn run_at(
        &self,
        db: &mut Database,
        today: NaiveDate,
        dry_run: bool,
    ) -> Result<RolloverResult> {
        let horizon = today
            .checked_add_days(Days::new(u64::from(self.horizon_days)))
            .ok_or_else(|| Error::Validation {
                field: "horizon_days".into(),
                message: format!("{} days after {today} is out of range", self.horizon_days),
            })?;
        let window = if self.backfill {
            let end = horizon.succ_opt().ok_or_else(|| Error::Validation {
                field: "horizon_days".into(),
                message: format!("{horizon} is the last representable date"),
            })?;
            StayPeriod::new(today, end)?
        } else {
            StayPeriod::single_day(horizon)?
        };

        let (purged, materialized, units) = if dry_run {
            Self::roll(db.connection(), today, window, false)?
        } else {
            db.write(|tx| Self::roll(tx, today, window, true))?
        };

        log::info!(
            "rollover{} to {horizon}: purged {} rows, \
             materialized {materialized} rows for {units} units",
            if dry_run { " (dry run)" } else { "" },
            purged.len(),
        );

        Ok(RolloverResult {
            purged,
            materialized,
            units,
            horizon,
            dry_run,
        })
    }

    fn roll(
        conn: &Connection,
        today: NaiveDate,
        window: StayPeriod,
        apply: bool,
    ) -> Result<(Vec<DateInventory>, usize, usize)> {
        let purged = InventoryLedger::purgeable_dates(conn, today)?;
        if apply {
            InventoryLedger::purge_dates(conn, today)?;
        }

        let mut materialized = 0;
        let mut units = 0;
        for unit in InventoryLedger::list_units(conn)? {
            if unit.seed_capacity().is_none() {
                continue;
            }
            units += 1;
            materialized += if apply {
                InventoryLedger::materialize_dates(conn, &unit.unit_id, window, None)?
            } else {
                let existing = InventoryLedger::date_inventory(conn, &unit.unit_id, window)?.len();
                (window.nights() as usize).saturating_sub(existing)
            };
        }

        Ok((purged, materialized, units))
    }
}
