//! Property-based tests for `Reservation` and `ReservationStatus`.

use super::{Reservation, ReservationId, ReservationStatus, TargetType};
use crate::inventory::StayPeriod;
use chrono::{Duration as ChronoDuration, NaiveDate};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = ReservationStatus> {
    prop_oneof![
        Just(ReservationStatus::Pending),
        Just(ReservationStatus::Confirmed),
        Just(ReservationStatus::Cancelled),
        Just(ReservationStatus::Failed),
        Just(ReservationStatus::Refunded),
        Just(ReservationStatus::PartiallyRefunded),
    ]
}

fn period_strategy() -> impl Strategy<Value = StayPeriod> {
    (0i64..3650, 1i64..30).prop_map(|(offset, nights)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let check_in = base + ChronoDuration::days(offset);
        StayPeriod::new(check_in, check_in + ChronoDuration::days(nights)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Terminal statuses never lead back to PENDING, and nothing leads into it
    #[test]
    fn nothing_transitions_into_pending(from in status_strategy()) {
        prop_assert!(!from.can_transition_to(ReservationStatus::Pending));
    }

    // Every legal transition starts from PENDING or CONFIRMED
    #[test]
    fn transitions_only_leave_pending_or_confirmed(
        from in status_strategy(),
        to in status_strategy()
    ) {
        if from.can_transition_to(to) {
            prop_assert!(matches!(from, ReservationStatus::Pending | ReservationStatus::Confirmed));
            prop_assert_ne!(from, to);
        }
    }

    // Status text is stable
    #[test]
    fn status_parse_inverts_as_str(status in status_strategy()) {
        prop_assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
    }

    // Total price is unit price times quantity times nights
    #[test]
    fn total_is_price_times_quantity_times_nights(
        period in period_strategy(),
        quantity in 1u32..50,
        unit_price in 0i64..1_000_000
    ) {
        let reservation = Reservation::builder(
            ReservationId::from_parts("R", "20240101", 1),
            TargetType::Room,
            "suite",
        )
        .actor_id("guest")
        .period(Some(period))
        .quantity(quantity)
        .unit_price(unit_price)
        .build()
        .unwrap();

        prop_assert_eq!(
            reservation.total_price(),
            unit_price * i64::from(quantity) * i64::from(period.nights())
        );
    }

    // Identifiers sort in issue order within one day and category
    #[test]
    fn identifiers_sort_by_sequence(a in 1u64..999_999, b in 1u64..999_999) {
        let left = ReservationId::from_parts("R", "20261018", a);
        let right = ReservationId::from_parts("R", "20261018", b);
        prop_assert_eq!(left.cmp(&right), a.cmp(&b));
    }
}
