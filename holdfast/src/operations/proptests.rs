//! Property-based tests for the reservation state machine.
//!
//! Random create/cancel/expire/fail sequences are applied to one room type;
//! after every step the inventory on each date must equal capacity minus the
//! quantity held by live reservations.

use super::{CancelReservationRequest, CreateReservationRequest, ReservationOperations};
use crate::database::test_util::create_test_database;
use crate::database::Database;
use crate::inventory::{BookableUnit, InventoryLedger, StayPeriod};
use crate::reservation::{ReservationStatus, TargetType};
use chrono::{Duration as ChronoDuration, NaiveDate};
use proptest::prelude::*;

const CAPACITY: u32 = 4;
const WINDOW_DAYS: i64 = 6;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn window() -> StayPeriod {
    StayPeriod::new(base_date(), base_date() + ChronoDuration::days(WINDOW_DAYS)).unwrap()
}

#[derive(Debug, Clone)]
enum Action {
    Create { offset: i64, nights: i64, quantity: u32 },
    Cancel(usize),
    Expire(usize),
    Fail(usize),
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0i64..WINDOW_DAYS, 1i64..=3, 1u32..=3).prop_map(|(offset, nights, quantity)| {
            Action::Create { offset, nights, quantity }
        }),
        1 => any::<usize>().prop_map(Action::Cancel),
        1 => any::<usize>().prop_map(Action::Expire),
        1 => any::<usize>().prop_map(Action::Fail),
    ]
}

fn held_on(db: &Database, date: NaiveDate) -> u32 {
    ReservationOperations::list_all(db, Some(ReservationStatus::Pending))
        .unwrap()
        .iter()
        .filter(|r| r.period().is_some_and(|p| p.dates().any(|d| d == date)))
        .map(|r| r.quantity())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    // Remaining inventory always equals capacity minus live holds
    #[test]
    fn inventory_matches_live_reservations(
        actions in prop::collection::vec(action_strategy(), 1..30)
    ) {
        let mut db = create_test_database();
        db.write(|tx| {
            InventoryLedger::register_unit(
                tx,
                &BookableUnit::new("suite", TargetType::Room, i64::from(CAPACITY))?,
            )?;
            InventoryLedger::materialize_dates(tx, "suite", window(), None)
        })
        .unwrap();

        let mut created = Vec::new();

        for action in actions {
            match action {
                Action::Create { offset, nights, quantity } => {
                    let check_in = base_date() + ChronoDuration::days(offset);
                    let check_out =
                        (check_in + ChronoDuration::days(nights)).min(window().check_out());
                    let period = StayPeriod::new(check_in, check_out).unwrap();
                    let request = CreateReservationRequest::dated(
                        TargetType::Room,
                        "suite",
                        period,
                        quantity,
                        "guest",
                    );
                    match ReservationOperations::create(&mut db, &request) {
                        Ok(reservation) => created.push(reservation.id().clone()),
                        Err(err) => prop_assert!(err.is_sold_out(), "unexpected error {err}"),
                    }
                }
                Action::Cancel(_) | Action::Expire(_) | Action::Fail(_) if created.is_empty() => {}
                Action::Cancel(pick) => {
                    let id = created[pick % created.len()].clone();
                    let request = CancelReservationRequest::new(id, "test");
                    let result = ReservationOperations::cancel(&mut db, &request);
                    if let Err(err) = result {
                        prop_assert!(err.is_invalid_transition());
                    }
                }
                Action::Expire(pick) => {
                    let id = &created[pick % created.len()];
                    if let Err(err) = ReservationOperations::expire(&mut db, id) {
                        prop_assert!(err.is_invalid_transition());
                    }
                }
                Action::Fail(pick) => {
                    let id = &created[pick % created.len()];
                    if let Err(err) = ReservationOperations::fail(&mut db, id, "declined") {
                        prop_assert!(err.is_invalid_transition());
                    }
                }
            }

            let rows = InventoryLedger::date_inventory(db.connection(), "suite", window()).unwrap();
            for row in rows {
                prop_assert_eq!(row.remaining + held_on(&db, row.date), CAPACITY);
            }
        }
    }
}
