//! Reservation types and the booking status machine.
//!
//! A [`Reservation`] is the audit record of one booking attempt. Its status
//! only ever moves along the edges allowed by
//! [`ReservationStatus::can_transition_to`]; rows are never deleted.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::inventory::StayPeriod;

/// What kind of inventory a reservation targets.
///
/// # Examples
///
/// ```
/// use holdfast::TargetType;
///
/// let target: TargetType = "ROOM".parse().unwrap();
/// assert_eq!(target, TargetType::Room);
/// assert!(target.is_dated());
/// assert_eq!(target.id_category(), "R");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    /// A room type, booked per night.
    Room,
    /// A physical seat on a trip or flight.
    Seat,
    /// A courier delivery slot, booked per day.
    Delivery,
}

impl TargetType {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Room => "ROOM",
            Self::Seat => "SEAT",
            Self::Delivery => "DELIVERY",
        }
    }

    /// Returns the identifier prefix used for reservation numbers.
    #[must_use]
    pub const fn id_category(self) -> &'static str {
        match self {
            Self::Room => "R",
            Self::Seat => "S",
            Self::Delivery => "D",
        }
    }

    /// Returns true when the target is counted per date rather than per unit.
    #[must_use]
    pub const fn is_dated(self) -> bool {
        matches!(self, Self::Room | Self::Delivery)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ROOM" => Ok(Self::Room),
            "SEAT" => Ok(Self::Seat),
            "DELIVERY" => Ok(Self::Delivery),
            _ => Err(ValidationError {
                field: "target_type".into(),
                message: format!("unknown target type: {s}"),
            }),
        }
    }
}

/// Lifecycle status of a reservation.
///
/// `PENDING → {CONFIRMED, CANCELLED, FAILED}` and
/// `CONFIRMED → {REFUNDED, PARTIALLY_REFUNDED}` are the only legal moves.
///
/// # Examples
///
/// ```
/// use holdfast::ReservationStatus;
///
/// assert!(ReservationStatus::Pending.can_transition_to(ReservationStatus::Confirmed));
/// assert!(!ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Cancelled));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Inventory is held, payment has not been confirmed.
    Pending,
    /// Payment confirmed; the hold is final.
    Confirmed,
    /// Cancelled by the user or expired by the reconciler.
    Cancelled,
    /// Payment failed.
    Failed,
    /// Fully refunded after confirmation.
    Refunded,
    /// Partially refunded after confirmation.
    PartiallyRefunded,
}

impl ReservationStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
        }
    }

    /// Returns true if `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled | Self::Failed)
                | (Self::Confirmed, Self::Refunded | Self::PartiallyRefunded)
        )
    }

    /// Returns true for every status except `PENDING`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if a reservation in this status releases its holds on entry.
    #[must_use]
    pub const fn releases_inventory(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed | Self::Refunded)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            "PARTIALLY_REFUNDED" => Ok(Self::PartiallyRefunded),
            _ => Err(ValidationError {
                field: "status".into(),
                message: format!("unknown reservation status: {s}"),
            }),
        }
    }
}

/// Human-readable reservation identifier, e.g. `R20261018000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    /// Wraps an existing identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty after trimming whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError {
                field: "reservation_id".into(),
                message: "reservation id must be non-empty".into(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds `<category><dateKey><6-digit sequence>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::ReservationId;
    ///
    /// let id = ReservationId::from_parts("R", "20261018", 42);
    /// assert_eq!(id.as_str(), "R20261018000042");
    /// ```
    #[must_use]
    pub fn from_parts(category: &str, date_key: &str, sequence: u64) -> Self {
        Self(crate::sequence::format_identifier(category, date_key, sequence))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A booking attempt and its audit trail.
///
/// # Examples
///
/// ```
/// use holdfast::{Reservation, ReservationId, ReservationStatus, StayPeriod, TargetType};
/// use chrono::NaiveDate;
///
/// let period = StayPeriod::new(
///     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
/// ).unwrap();
///
/// let reservation = Reservation::builder(
///     ReservationId::from_parts("R", "20261018", 1),
///     TargetType::Room,
///     "deluxe-twin",
/// )
/// .actor_id("guest-17")
/// .period(Some(period))
/// .quantity(2)
/// .unit_price(12_000)
/// .build()
/// .unwrap();
///
/// assert_eq!(reservation.status(), ReservationStatus::Pending);
/// assert_eq!(reservation.total_price(), 48_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    actor_id: String,
    target_type: TargetType,
    target_id: String,
    period: Option<StayPeriod>,
    quantity: u32,
    unit_price: i64,
    total_price: i64,
    status: ReservationStatus,
    status_reason: Option<String>,
    payment_ref: Option<String>,
    created_at: SystemTime,
    updated_at: SystemTime,
    confirmed_at: Option<SystemTime>,
}

impl Reservation {
    /// Creates a new reservation builder.
    #[must_use]
    pub fn builder(
        id: ReservationId,
        target_type: TargetType,
        target_id: impl Into<String>,
    ) -> ReservationBuilder {
        ReservationBuilder {
            id,
            actor_id: String::new(),
            target_type,
            target_id: target_id.into(),
            period: None,
            quantity: 1,
            unit_price: 0,
            total_price: None,
            status: ReservationStatus::Pending,
            status_reason: None,
            payment_ref: None,
            created_at: None,
            updated_at: None,
            confirmed_at: None,
        }
    }

    /// Returns the reservation identifier.
    #[must_use]
    pub const fn id(&self) -> &ReservationId {
        &self.id
    }

    /// Returns the actor the reservation is attributed to.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Returns the kind of inventory held.
    #[must_use]
    pub const fn target_type(&self) -> TargetType {
        self.target_type
    }

    /// Returns the unit id (dated targets) or parent trip id (seats).
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Returns the held period for dated targets.
    #[must_use]
    pub const fn period(&self) -> Option<StayPeriod> {
        self.period
    }

    /// Returns the number of units held per date, or the number of seats.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the price of one unit for one date, in minor currency units.
    #[must_use]
    pub const fn unit_price(&self) -> i64 {
        self.unit_price
    }

    /// Returns the total price, in minor currency units.
    #[must_use]
    pub const fn total_price(&self) -> i64 {
        self.total_price
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Returns why the reservation reached its current status, if recorded.
    #[must_use]
    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    /// Returns the payment merchant id used to confirm the reservation.
    #[must_use]
    pub fn payment_ref(&self) -> Option<&str> {
        self.payment_ref.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Returns the timestamp of the last status change.
    #[must_use]
    pub const fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    /// Returns the confirmation timestamp.
    #[must_use]
    pub const fn confirmed_at(&self) -> Option<SystemTime> {
        self.confirmed_at
    }

    /// Checks if a pending reservation has outlived its payment window at `now`.
    ///
    /// Reservations in any other status never expire.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::{Duration, SystemTime};
    /// use holdfast::{Reservation, ReservationId, TargetType};
    ///
    /// let created = SystemTime::now() - Duration::from_secs(600);
    /// let reservation = Reservation::builder(
    ///     ReservationId::from_parts("S", "20261018", 1),
    ///     TargetType::Seat,
    ///     "KE123-20261018",
    /// )
    /// .actor_id("traveller")
    /// .created_at(created)
    /// .build()
    /// .unwrap();
    ///
    /// assert!(reservation.is_expired(Duration::from_secs(300), SystemTime::now()));
    /// ```
    #[must_use]
    pub fn is_expired(&self, hold_timeout: Duration, now: SystemTime) -> bool {
        self.status == ReservationStatus::Pending
            && now
                .duration_since(self.created_at)
                .map(|age| age > hold_timeout)
                .unwrap_or(false)
    }
}

/// Builder for creating `Reservation` instances.
#[derive(Debug)]
pub struct ReservationBuilder {
    id: ReservationId,
    actor_id: String,
    target_type: TargetType,
    target_id: String,
    period: Option<StayPeriod>,
    quantity: u32,
    unit_price: i64,
    total_price: Option<i64>,
    status: ReservationStatus,
    status_reason: Option<String>,
    payment_ref: Option<String>,
    created_at: Option<SystemTime>,
    updated_at: Option<SystemTime>,
    confirmed_at: Option<SystemTime>,
}

impl ReservationBuilder {
    /// Sets the actor. Trimmed of surrounding whitespace.
    #[must_use]
    pub fn actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into().trim().to_string();
        self
    }

    /// Sets the held period.
    #[must_use]
    pub const fn period(mut self, period: Option<StayPeriod>) -> Self {
        self.period = period;
        self
    }

    /// Sets the quantity.
    #[must_use]
    pub const fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the unit price.
    #[must_use]
    pub const fn unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// Overrides the computed total price (used when loading stored rows).
    #[must_use]
    pub const fn total_price(mut self, total_price: i64) -> Self {
        self.total_price = Some(total_price);
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the status reason.
    #[must_use]
    pub fn status_reason(mut self, reason: Option<String>) -> Self {
        self.status_reason = reason;
        self
    }

    /// Sets the payment reference.
    #[must_use]
    pub fn payment_ref(mut self, payment_ref: Option<String>) -> Self {
        self.payment_ref = payment_ref;
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, created_at: SystemTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the last-update timestamp.
    #[must_use]
    pub fn updated_at(mut self, updated_at: SystemTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Sets the confirmation timestamp.
    #[must_use]
    pub fn confirmed_at(mut self, confirmed_at: Option<SystemTime>) -> Self {
        self.confirmed_at = confirmed_at;
        self
    }

    /// Builds the reservation.
    ///
    /// When no total is given it is `unit_price × quantity × nights`, where
    /// seats count as a single night.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The actor or target id is empty
    /// - The quantity is zero or the unit price negative
    /// - A dated target has no period, or a seat target has one
    /// - The total price overflows
    pub fn build(self) -> Result<Reservation, ValidationError> {
        if self.actor_id.is_empty() {
            return Err(ValidationError {
                field: "actor_id".into(),
                message: "actor id must be non-empty after trimming whitespace".into(),
            });
        }

        if self.target_id.trim().is_empty() {
            return Err(ValidationError {
                field: "target_id".into(),
                message: "target id must be non-empty".into(),
            });
        }

        if self.quantity == 0 {
            return Err(ValidationError {
                field: "quantity".into(),
                message: "quantity must be at least 1".into(),
            });
        }

        if self.unit_price < 0 {
            return Err(ValidationError {
                field: "unit_price".into(),
                message: "unit price must not be negative".into(),
            });
        }

        let nights = match (self.target_type.is_dated(), self.period) {
            (true, Some(period)) => period.nights(),
            (true, None) => {
                return Err(ValidationError {
                    field: "period".into(),
                    message: format!("{} reservations require a period", self.target_type),
                });
            }
            (false, Some(_)) => {
                return Err(ValidationError {
                    field: "period".into(),
                    message: "seat reservations do not take a period".into(),
                });
            }
            (false, None) => 1,
        };

        let total_price = match self.total_price {
            Some(total) => total,
            None => self
                .unit_price
                .checked_mul(i64::from(self.quantity))
                .and_then(|p| p.checked_mul(i64::from(nights)))
                .ok_or_else(|| ValidationError {
                    field: "total_price".into(),
                    message: "total price overflows".into(),
                })?,
        };

        let now = SystemTime::now();
        let created_at = self.created_at.unwrap_or(now);
        Ok(Reservation {
            id: self.id,
            actor_id: self.actor_id,
            target_type: self.target_type,
            target_id: self.target_id.trim().to_string(),
            period: self.period,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price,
            status: self.status,
            status_reason: self.status_reason,
            payment_ref: self.payment_ref,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            confirmed_at: self.confirmed_at,
        })
    }
}

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// A description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod proptests;
