//! Property-based tests for stay periods and the inventory ledger.
//!
//! The ledger properties replay random reserve/release sequences against a
//! real store and compare every row with a simple counting model.

use super::{BookableUnit, InventoryLedger, StayPeriod};
use crate::database::test_util::create_test_database;
use crate::reservation::TargetType;
use chrono::{Duration as ChronoDuration, NaiveDate};
use proptest::prelude::*;

// ============================================================================
// STRATEGY DEFINITIONS
// ============================================================================

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
}

/// Periods inside a ten-day window starting at `base_date`.
fn window_period_strategy() -> impl Strategy<Value = StayPeriod> {
    (0i64..9, 1i64..=4).prop_map(|(offset, nights)| {
        let check_in = base_date() + ChronoDuration::days(offset);
        let check_out = (check_in + ChronoDuration::days(nights))
            .min(base_date() + ChronoDuration::days(10));
        StayPeriod::new(check_in, check_out).unwrap()
    })
}

#[derive(Debug, Clone)]
enum Step {
    Reserve(StayPeriod, u32),
    Release(StayPeriod, u32),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (window_period_strategy(), 1u32..=3).prop_map(|(p, q)| Step::Reserve(p, q)),
        1 => (window_period_strategy(), 1u32..=3).prop_map(|(p, q)| Step::Release(p, q)),
    ]
}

fn day_index(date: NaiveDate) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (date - base_date()).num_days() as usize;
    index
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // A period holds exactly `nights` consecutive dates, starting at check-in
    #[test]
    fn period_dates_are_consecutive(
        offset in 0i64..3650,
        nights in 1i64..60
    ) {
        let check_in = base_date() + ChronoDuration::days(offset);
        let period = StayPeriod::new(check_in, check_in + ChronoDuration::days(nights)).unwrap();
        let dates: Vec<_> = period.dates().collect();

        prop_assert_eq!(dates.len(), period.nights() as usize);
        prop_assert_eq!(dates[0], check_in);
        for pair in dates.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], ChronoDuration::days(1));
        }
        prop_assert!(*dates.last().unwrap() < period.check_out());
    }

    // A period never accepts check-out on or before check-in
    #[test]
    fn period_rejects_non_positive_length(offset in 0i64..3650, back in 0i64..30) {
        let check_in = base_date() + ChronoDuration::days(offset);
        prop_assert!(StayPeriod::new(check_in, check_in - ChronoDuration::days(back)).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    // Every row tracks the model exactly and stays within 0..=capacity
    #[test]
    fn ledger_matches_counting_model(
        capacity in 1u32..=5,
        steps in prop::collection::vec(step_strategy(), 1..25)
    ) {
        let mut db = create_test_database();
        let window = StayPeriod::new(base_date(), base_date() + ChronoDuration::days(10)).unwrap();
        db.write(|tx| {
            InventoryLedger::register_unit(
                tx,
                &BookableUnit::new("suite", TargetType::Room, i64::from(capacity))?,
            )?;
            InventoryLedger::materialize_dates(tx, "suite", window, None)
        })
        .unwrap();

        let mut model = vec![capacity; 10];

        for step in steps {
            match step {
                Step::Reserve(period, quantity) => {
                    let fits = period.dates().all(|d| model[day_index(d)] >= quantity);
                    let result = db.reserve("suite", period, quantity);
                    prop_assert_eq!(result.is_ok(), fits);
                    if fits {
                        for d in period.dates() {
                            model[day_index(d)] -= quantity;
                        }
                    } else {
                        prop_assert!(result.unwrap_err().is_sold_out());
                    }
                }
                Step::Release(period, quantity) => {
                    db.release("suite", period, quantity).unwrap();
                    for d in period.dates() {
                        let slot = &mut model[day_index(d)];
                        *slot = (*slot + quantity).min(capacity);
                    }
                }
            }
        }

        let rows = InventoryLedger::date_inventory(db.connection(), "suite", window).unwrap();
        prop_assert_eq!(rows.len(), 10);
        for row in rows {
            prop_assert!(row.remaining <= row.capacity);
            prop_assert_eq!(row.remaining, model[day_index(row.date)]);
        }
    }

    // A failed reserve leaves every row exactly as it was
    #[test]
    fn failed_reserve_changes_nothing(
        period in window_period_strategy(),
        blocked_offset in 0usize..4
    ) {
        let mut db = create_test_database();
        let window = StayPeriod::new(base_date(), base_date() + ChronoDuration::days(10)).unwrap();
        db.write(|tx| {
            InventoryLedger::register_unit(tx, &BookableUnit::new("suite", TargetType::Room, 1)?)?;
            InventoryLedger::materialize_dates(tx, "suite", window, None)
        })
        .unwrap();

        let dates: Vec<_> = period.dates().collect();
        let blocked = dates[blocked_offset.min(dates.len() - 1)];
        db.reserve("suite", StayPeriod::single_day(blocked).unwrap(), 1).unwrap();

        let before = InventoryLedger::date_inventory(db.connection(), "suite", window).unwrap();
        prop_assert!(db.reserve("suite", period, 1).is_err());
        let after = InventoryLedger::date_inventory(db.connection(), "suite", window).unwrap();
        prop_assert_eq!(before, after);
    }
}
