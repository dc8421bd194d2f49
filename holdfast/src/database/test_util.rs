//! Shared test utilities for database unit tests.
//!
//! This module provides helper functions used across multiple test modules.

use chrono::NaiveDate;
use tempfile::tempdir;

use crate::database::{Database, DatabaseConfig};
use crate::inventory::StayPeriod;
use crate::{Reservation, ReservationId, TargetType};

/// Creates a temporary test database that will be cleaned up automatically.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
/// This is acceptable in test code where we want to fail fast.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::new(path);
    let db = Database::open(config).unwrap();

    // Prevent the TempDir from being dropped immediately
    std::mem::forget(dir);

    db
}

/// Builds a date, panicking on invalid input.
#[must_use]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two nights from 2026-10-18.
#[must_use]
pub fn two_nights() -> StayPeriod {
    StayPeriod::new(date(2026, 10, 18), date(2026, 10, 20)).unwrap()
}

/// Creates a pending two-night room reservation for `deluxe` at 10 000 a night.
///
/// # Panics
///
/// Panics if the reservation cannot be built.
#[must_use]
pub fn create_test_reservation(sequence: u64, actor: &str) -> Reservation {
    Reservation::builder(
        ReservationId::from_parts("R", "20261018", sequence),
        TargetType::Room,
        "deluxe",
    )
    .actor_id(actor)
    .period(Some(two_nights()))
    .unit_price(10_000)
    .build()
    .unwrap()
}
