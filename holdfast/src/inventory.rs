//! Inventory types: dated availability rows, discrete seats, and holds.
//!
//! Two shapes share one contract. A [`DateInventory`] row counts how many
//! units of a room type (or delivery slot) remain for one date; a
//! [`DiscreteUnit`] is a single seat that is either free or held. The
//! [`InventoryLedger`] reserves and releases both shapes atomically.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reservation::{TargetType, ValidationError};

pub mod ledger;

#[cfg(test)]
mod proptests;

pub use ledger::InventoryLedger;

/// Half-open date range `[check_in, check_out)`.
///
/// A hotel stay from the 18th to the 20th holds the nights of the 18th and
/// the 19th.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use holdfast::StayPeriod;
///
/// let period = StayPeriod::new(
///     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
/// ).unwrap();
/// assert_eq!(period.nights(), 2);
/// assert_eq!(period.dates().count(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayPeriod {
    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns an error if `check_out` is not after `check_in`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_out <= check_in {
            return Err(ValidationError {
                field: "period".into(),
                message: format!("check-out {check_out} must be after check-in {check_in}"),
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// A period covering exactly one date.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is the last representable date.
    pub fn single_day(date: NaiveDate) -> Result<Self, ValidationError> {
        let check_out = date.succ_opt().ok_or_else(|| ValidationError {
            field: "period".into(),
            message: format!("{date} is the last representable date"),
        })?;
        Ok(Self {
            check_in: date,
            check_out,
        })
    }

    /// First held date.
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Date after the last held date.
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of held dates.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days() as u32
    }

    /// Iterates the held dates in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d < end)
    }
}

impl fmt::Display for StayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

/// Cabin class of a seat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    /// Economy cabin.
    Economy,
    /// Business cabin.
    Business,
    /// First cabin.
    First,
}

impl SeatClass {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::Business => "BUSINESS",
            Self::First => "FIRST",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ECONOMY" => Ok(Self::Economy),
            "BUSINESS" => Ok(Self::Business),
            "FIRST" => Ok(Self::First),
            _ => Err(ValidationError {
                field: "seat_class".into(),
                message: format!("unknown seat class: {s}"),
            }),
        }
    }
}

/// Catalog entry for a dated unit (room type or delivery slot).
///
/// Rollover seeds new [`DateInventory`] rows at `baseline_capacity`; units
/// with a baseline of zero or less are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookableUnit {
    /// Unit identifier.
    pub unit_id: String,
    /// Either `ROOM` or `DELIVERY`.
    pub target_type: TargetType,
    /// Units sellable per date.
    pub baseline_capacity: i64,
    /// Inactive units are not rolled forward.
    pub active: bool,
}

impl BookableUnit {
    /// Creates an active unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or the target type is not dated.
    pub fn new(
        unit_id: impl Into<String>,
        target_type: TargetType,
        baseline_capacity: i64,
    ) -> Result<Self, ValidationError> {
        let unit_id = unit_id.into().trim().to_string();
        if unit_id.is_empty() {
            return Err(ValidationError {
                field: "unit_id".into(),
                message: "unit id must be non-empty".into(),
            });
        }
        if !target_type.is_dated() {
            return Err(ValidationError {
                field: "target_type".into(),
                message: format!("{target_type} units are materialized as seats"),
            });
        }
        Ok(Self {
            unit_id,
            target_type,
            baseline_capacity,
            active: true,
        })
    }

    /// Capacity new rows are seeded with, or `None` if the unit is not sellable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn seed_capacity(&self) -> Option<u32> {
        (self.active && self.baseline_capacity > 0)
            .then(|| self.baseline_capacity.min(i64::from(u32::MAX)) as u32)
    }
}

/// Availability of one unit on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInventory {
    /// Unit identifier.
    pub unit_id: String,
    /// The date this row counts.
    pub date: NaiveDate,
    /// Units still sellable.
    pub remaining: u32,
    /// Units the row was materialized with.
    pub capacity: u32,
    /// Closed rows refuse new holds regardless of `remaining`.
    pub available: bool,
}

impl DateInventory {
    /// Units currently held against this row.
    #[must_use]
    pub const fn held(&self) -> u32 {
        self.capacity.saturating_sub(self.remaining)
    }
}

/// One physical seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteUnit {
    /// Seat identifier, unique across parents.
    pub unit_id: String,
    /// Trip or flight the seat belongs to.
    pub parent_id: String,
    /// Cabin class.
    pub seat_class: SeatClass,
    /// Reservation currently holding the seat.
    pub held_by: Option<String>,
}

impl DiscreteUnit {
    /// Returns true if some reservation holds the seat.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held_by.is_some()
    }
}

/// The inventory taken by one reservation on one unit (and date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    /// Reservation that owns the hold.
    pub reservation_id: String,
    /// Unit held.
    pub unit_id: String,
    /// Held date, `None` for seats.
    pub date: Option<NaiveDate>,
    /// Units held.
    pub quantity: u32,
    /// When the hold was given back.
    pub released_at: Option<SystemTime>,
}

impl Hold {
    /// Returns true while the hold still counts against inventory.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.released_at.is_none()
    }
}
