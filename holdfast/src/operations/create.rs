//! Creating reservations.
//!
//! A create is one write transaction: the reservation number is drawn, the
//! PENDING row is inserted, and every date or seat is held. Any failure rolls
//! the whole transaction back, including the sequence draw, so a sold-out
//! attempt leaves no trace in the store.

use std::time::SystemTime;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::inventory::{Hold, InventoryLedger, StayPeriod};
use crate::reservation::{Reservation, ReservationId, TargetType};
use crate::sequence::{date_key, SequenceCounter};

/// Request to hold inventory for a new PENDING reservation.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use holdfast::operations::CreateReservationRequest;
/// use holdfast::{StayPeriod, TargetType};
///
/// let period = StayPeriod::new(
///     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
/// ).unwrap();
///
/// let request = CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest-17")
///     .with_unit_price(12_000);
/// assert_eq!(request.quantity, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReservationRequest {
    /// What kind of inventory is booked.
    pub target_type: TargetType,
    /// The room type or delivery slot id, or the trip id for seats.
    pub target_id: String,
    /// Dates held, for room and delivery targets.
    pub period: Option<StayPeriod>,
    /// Seats held, for seat targets.
    pub seats: Vec<String>,
    /// Units held per date, or the number of seats.
    pub quantity: u32,
    /// Price of one unit for one date.
    pub unit_price: i64,
    /// Who the reservation is attributed to.
    pub actor_id: String,
}

impl CreateReservationRequest {
    /// Request for `quantity` units of a room type or delivery slot.
    #[must_use]
    pub fn dated(
        target_type: TargetType,
        target_id: impl Into<String>,
        period: StayPeriod,
        quantity: u32,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            target_type,
            target_id: target_id.into(),
            period: Some(period),
            seats: Vec::new(),
            quantity,
            unit_price: 0,
            actor_id: actor_id.into(),
        }
    }

    /// Request for specific seats of one trip.
    #[must_use]
    pub fn seats(
        trip_id: impl Into<String>,
        seats: Vec<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let quantity = seats.len().min(u32::MAX as usize) as u32;
        Self {
            target_type: TargetType::Seat,
            target_id: trip_id.into(),
            period: None,
            seats,
            quantity,
            unit_price: 0,
            actor_id: actor_id.into(),
        }
    }

    /// Sets the unit price.
    #[must_use]
    pub const fn with_unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// Overrides the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    fn validate(&self) -> Result<()> {
        match self.target_type {
            TargetType::Seat => {
                if self.period.is_some() {
                    return Err(Error::Validation {
                        field: "period".into(),
                        message: "seat reservations do not take a period".into(),
                    });
                }
                if self.seats.is_empty() {
                    return Err(Error::Validation {
                        field: "seats".into(),
                        message: "at least one seat is required".into(),
                    });
                }
                if self.seats.len() != self.quantity as usize {
                    return Err(Error::Validation {
                        field: "quantity".into(),
                        message: format!(
                            "quantity {} does not match {} requested seats",
                            self.quantity,
                            self.seats.len()
                        ),
                    });
                }
            }
            TargetType::Room | TargetType::Delivery => {
                if !self.seats.is_empty() {
                    return Err(Error::Validation {
                        field: "seats".into(),
                        message: format!("{} reservations do not take seats", self.target_type),
                    });
                }
                if self.target_type == TargetType::Delivery
                    && self.period.is_some_and(|p| p.nights() != 1)
                {
                    return Err(Error::Validation {
                        field: "period".into(),
                        message: "a delivery slot covers exactly one day".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Creates, transitions, and looks up reservations.
///
/// All operations are static methods that work on a database instance.
/// Each mutating operation runs in its own write transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationOperations;

impl ReservationOperations {
    /// Holds inventory and records a new PENDING reservation.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a malformed request
    /// - [`Error::NotFound`] for an unknown unit, trip, or seat
    /// - [`Error::InsufficientInventory`] if any date or seat is unavailable
    /// - [`Error::LockTimeout`] if the write lock is not obtained in time
    ///
    /// Nothing is written when any of these is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chrono::NaiveDate;
    /// use holdfast::database::{Database, DatabaseConfig};
    /// use holdfast::operations::{CreateReservationRequest, ReservationOperations};
    /// use holdfast::{StayPeriod, TargetType};
    ///
    /// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
    /// let period = StayPeriod::new(
    ///     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
    ///     NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
    /// ).unwrap();
    ///
    /// let request =
    ///     CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest-17");
    /// let reservation = ReservationOperations::create(&mut db, &request).unwrap();
    /// println!("held {}", reservation.id());
    /// ```
    pub fn create(db: &mut Database, request: &CreateReservationRequest) -> Result<Reservation> {
        Self::create_at(db, request, SystemTime::now())
    }

    /// Same as [`Self::create`] with an explicit creation time.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub fn create_at(
        db: &mut Database,
        request: &CreateReservationRequest,
        now: SystemTime,
    ) -> Result<Reservation> {
        request.validate()?;
        let category = request.target_type.id_category();
        let key = date_key(now);

        let reservation = db.write(|tx| {
            if request.target_type.is_dated() {
                InventoryLedger::require_unit(tx, request.target_id.trim(), request.target_type)?;
            }

            let sequence = SequenceCounter::next_in(tx, category, &key)?;
            let reservation = Reservation::builder(
                ReservationId::from_parts(category, &key, sequence),
                request.target_type,
                request.target_id.as_str(),
            )
            .actor_id(request.actor_id.trim())
            .period(request.period)
            .quantity(request.quantity)
            .unit_price(request.unit_price)
            .created_at(now)
            .build()?;

            Database::insert_reservation(tx, &reservation)?;

            let id = reservation.id().as_str();
            let unit_id = reservation.target_id();
            if let Some(period) = reservation.period() {
                InventoryLedger::reserve_dates(tx, unit_id, period, reservation.quantity())?;
                for date in period.dates() {
                    Database::insert_hold(
                        tx,
                        &Hold {
                            reservation_id: id.to_string(),
                            unit_id: unit_id.to_string(),
                            date: Some(date),
                            quantity: reservation.quantity(),
                            released_at: None,
                        },
                    )?;
                }
            } else {
                InventoryLedger::hold_seats(tx, unit_id, &request.seats, id)?;
                for seat in &request.seats {
                    Database::insert_hold(
                        tx,
                        &Hold {
                            reservation_id: id.to_string(),
                            unit_id: seat.clone(),
                            date: None,
                            quantity: 1,
                            released_at: None,
                        },
                    )?;
                }
            }

            Ok(reservation)
        })?;

        log::debug!(
            "created {} for {} on {} {}",
            reservation.id(),
            reservation.actor_id(),
            reservation.target_type(),
            reservation.target_id()
        );
        Ok(reservation)
    }
}
