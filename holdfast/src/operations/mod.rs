//! Reservation operations: the booking state machine and its periodic jobs.
//!
//! [`ReservationOperations`] creates reservations and moves them through
//! their lifecycle. Each mutating call is one write transaction, so a caller
//! either sees the whole effect or none of it.
//!
//! [`ExpirationReconciler`] and [`InventoryRollover`] are the periodic jobs;
//! [`BackgroundTasks`] runs both on their own threads.
//!
//! # Examples
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use holdfast::database::{Database, DatabaseConfig};
//! use holdfast::operations::{
//!     CancelReservationRequest, CreateReservationRequest, ReservationOperations,
//! };
//! use holdfast::{StayPeriod, TargetType};
//!
//! let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
//! let period = StayPeriod::new(
//!     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
//!     NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
//! ).unwrap();
//!
//! let request = CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest-17")
//!     .with_unit_price(12_000);
//! let reservation = ReservationOperations::create(&mut db, &request).unwrap();
//!
//! let cancel = CancelReservationRequest::new(reservation.id().clone(), "changed plans");
//! ReservationOperations::cancel(&mut db, &cancel).unwrap();
//! ```

pub mod create;
pub mod init;
pub mod query;
pub mod reconcile;
pub mod rollover;
pub mod scheduler;
pub mod transition;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use create::{CreateReservationRequest, ReservationOperations};
pub use init::{init_database, InitOptions, InitResult};
pub use reconcile::{ExpirationReconciler, SweepFailure, SweepResult};
pub use rollover::{InventoryRollover, RolloverResult};
pub use scheduler::{BackgroundTasks, ScheduleConfig};
pub use transition::{CancelReservationRequest, ConfirmReservationRequest, EXPIRED_REASON};
