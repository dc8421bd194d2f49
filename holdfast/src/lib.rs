#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # holdfast
//!
//! A reservation and inventory engine for perishable, capacity-limited
//! inventory: room nights, event tickets, and per-seat trip inventory.
//!
//! Many processes may share one store. Inventory is decremented atomically,
//! seats are never held twice, and reservation numbers are unique per
//! category and day, however the callers interleave.
//!
//! ## Core Types
//!
//! - [`InventoryLedger`], [`BookableUnit`], [`DateInventory`], and
//!   [`DiscreteUnit`]: capacity per date and per seat
//! - [`Reservation`], [`ReservationId`], and [`ReservationStatus`]: the
//!   booking record and its lifecycle
//! - [`ReservationOperations`]: create, confirm, cancel, expire, fail, refund
//! - [`ExpirationReconciler`] and [`InventoryRollover`]: periodic jobs
//! - [`SequenceCounter`]: per-category, per-day reservation numbers
//! - [`PaymentGateway`]: the payment collaborator seam
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use holdfast::{ReservationStatus, StayPeriod};
//!
//! let period = StayPeriod::new(
//!     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
//!     NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(period.nights(), 3);
//!
//! assert!(ReservationStatus::Pending.can_transition_to(ReservationStatus::Confirmed));
//! assert!(!ReservationStatus::Cancelled.can_transition_to(ReservationStatus::Confirmed));
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod operations;
pub mod payment;
pub mod reservation;
pub mod sequence;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigBuilder, OutputFormat};
pub use database::{Database, DatabaseConfig};
pub use error::{Error, Result};
pub use inventory::{
    BookableUnit, DateInventory, DiscreteUnit, Hold, InventoryLedger, SeatClass, StayPeriod,
};
pub use logging::{init_logger, LogLevel, Logger};
pub use operations::{
    BackgroundTasks, CancelReservationRequest, ConfirmReservationRequest,
    CreateReservationRequest, ExpirationReconciler, InventoryRollover, ReservationOperations,
    RolloverResult, ScheduleConfig, SweepFailure, SweepResult,
};
pub use payment::{PaymentGateway, PaymentLedger, PaymentRecord, PaymentStatus};
pub use reservation::{Reservation, ReservationId, ReservationStatus, TargetType, ValidationError};
pub use sequence::SequenceCounter;
