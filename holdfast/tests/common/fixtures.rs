//! Inventory fixtures shared by the integration tests.

use chrono::NaiveDate;

use holdfast::database::Database;
use holdfast::{BookableUnit, InventoryLedger, SeatClass, StayPeriod, TargetType};

/// Builds a date, panicking on invalid input.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Builds a stay from `check_in` to `check_out`.
pub fn stay(check_in: NaiveDate, check_out: NaiveDate) -> StayPeriod {
    StayPeriod::new(check_in, check_out).unwrap()
}

/// Registers a room type and materializes `period` at `capacity`.
#[allow(dead_code)]
pub fn add_room(db: &mut Database, unit_id: &str, capacity: u32, period: StayPeriod) {
    db.write(|tx| {
        InventoryLedger::register_unit(
            tx,
            &BookableUnit::new(unit_id, TargetType::Room, i64::from(capacity))?,
        )?;
        InventoryLedger::materialize_dates(tx, unit_id, period, None)
    })
    .unwrap();
}

/// Creates `count` economy seats named `<trip>-<n>` for a trip.
#[allow(dead_code)]
pub fn add_seats(db: &mut Database, trip_id: &str, count: usize) -> Vec<String> {
    let seats: Vec<(String, SeatClass)> = (1..=count)
        .map(|n| (format!("{trip_id}-{n}"), SeatClass::Economy))
        .collect();
    db.write(|tx| InventoryLedger::materialize_seats(tx, trip_id, &seats))
        .unwrap();
    seats.into_iter().map(|(id, _)| id).collect()
}

/// Remaining inventory of a unit on one date.
#[allow(dead_code)]
pub fn remaining(db: &Database, unit_id: &str, on: NaiveDate) -> u32 {
    InventoryLedger::date_row(db.connection(), unit_id, on)
        .unwrap()
        .unwrap()
        .remaining
}
