//! End-to-end reservation lifecycle tests.
//!
//! These tests drive reservations through confirmation, cancellation,
//! failure, and refunds against the bundled payment ledger, which shares
//! the store file through its own connection.

mod common;

use common::fixtures::{add_room, add_seats, date, remaining, stay};
use common::TestStore;
use holdfast::operations::{
    CancelReservationRequest, ConfirmReservationRequest, CreateReservationRequest,
    ReservationOperations,
};
use holdfast::{
    BookableUnit, Error, InventoryLedger, PaymentLedger, PaymentStatus, ReservationStatus,
    TargetType,
};

#[test]
fn test_confirm_then_full_refund_releases_inventory() {
    let store = TestStore::new();
    let mut db = store.open();
    let mut payments = PaymentLedger::open(store.config()).unwrap();
    let period = stay(date(2026, 10, 18), date(2026, 10, 20));
    add_room(&mut db, "deluxe", 3, period);

    let request = CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 2, "guest-17")
        .with_unit_price(12_000);
    let reservation = ReservationOperations::create(&mut db, &request).unwrap();
    assert_eq!(reservation.total_price(), 48_000);
    assert_eq!(remaining(&db, "deluxe", date(2026, 10, 18)), 1);

    let payment = payments.record(Some(reservation.id()), 48_000).unwrap();
    payments.settle(&payment.merchant_id).unwrap();

    let confirmed = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(reservation.id().clone(), payment.merchant_id.clone()),
    )
    .unwrap();
    assert_eq!(confirmed.status(), ReservationStatus::Confirmed);
    assert_eq!(confirmed.payment_ref(), Some(payment.merchant_id.as_str()));
    assert!(confirmed.confirmed_at().is_some());
    // Confirmation keeps the holds
    assert_eq!(remaining(&db, "deluxe", date(2026, 10, 18)), 1);

    payments.refund(&payment.merchant_id, 48_000).unwrap();
    let refunded = ReservationOperations::refund(&mut db, &payments, reservation.id()).unwrap();
    assert_eq!(refunded.status(), ReservationStatus::Refunded);
    for night in period.dates() {
        assert_eq!(remaining(&db, "deluxe", night), 3);
    }
}

#[test]
fn test_payment_settles_only_one_reservation() {
    let store = TestStore::new();
    let mut db = store.open();
    let mut payments = PaymentLedger::open(store.config()).unwrap();
    let period = stay(date(2026, 10, 18), date(2026, 10, 19));
    add_room(&mut db, "deluxe", 3, period);

    let request = CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest")
        .with_unit_price(100);
    let first = ReservationOperations::create(&mut db, &request).unwrap();
    let second = ReservationOperations::create(&mut db, &request).unwrap();
    let third = ReservationOperations::create(&mut db, &request).unwrap();

    // Taken for the first reservation, so it cannot pay for the second
    let linked = payments.record(Some(first.id()), 100).unwrap();
    payments.settle(&linked.merchant_id).unwrap();
    let err = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(second.id().clone(), linked.merchant_id.clone()),
    )
    .unwrap_err();
    match err {
        Error::PaymentBelongsToAnother { owner, .. } => assert_eq!(owner, first.id().as_str()),
        other => panic!("unexpected error: {other}"),
    }
    ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(first.id().clone(), linked.merchant_id),
    )
    .unwrap();

    // An unlinked payment is consumed by the first reservation it confirms
    let unlinked = payments.record(None, 100).unwrap();
    payments.settle(&unlinked.merchant_id).unwrap();
    ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(second.id().clone(), unlinked.merchant_id.clone()),
    )
    .unwrap();
    let err = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(third.id().clone(), unlinked.merchant_id),
    )
    .unwrap_err();
    match err {
        Error::PaymentBelongsToAnother { owner, .. } => assert_eq!(owner, second.id().as_str()),
        other => panic!("unexpected error: {other}"),
    }

    let third = ReservationOperations::get(&db, third.id()).unwrap();
    assert_eq!(third.status(), ReservationStatus::Pending);
    assert_eq!(third.payment_ref(), None);
}

#[test]
fn test_partial_refund_keeps_holds_and_is_terminal() {
    let store = TestStore::new();
    let mut db = store.open();
    let mut payments = PaymentLedger::open(store.config()).unwrap();
    let period = stay(date(2026, 10, 18), date(2026, 10, 19));
    add_room(&mut db, "twin", 2, period);

    let request = CreateReservationRequest::dated(TargetType::Room, "twin", period, 1, "guest")
        .with_unit_price(9_000);
    let reservation = ReservationOperations::create(&mut db, &request).unwrap();
    let payment = payments.record(Some(reservation.id()), 9_000).unwrap();
    payments.settle(&payment.merchant_id).unwrap();
    ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(reservation.id().clone(), payment.merchant_id.clone()),
    )
    .unwrap();

    let record = payments.refund(&payment.merchant_id, 3_000).unwrap();
    assert_eq!(record.status, PaymentStatus::PartiallyRefunded);

    let partial = ReservationOperations::refund(&mut db, &payments, reservation.id()).unwrap();
    assert_eq!(partial.status(), ReservationStatus::PartiallyRefunded);
    assert_eq!(remaining(&db, "twin", date(2026, 10, 18)), 1);

    payments.refund(&payment.merchant_id, 6_000).unwrap();
    let err = ReservationOperations::refund(&mut db, &payments, reservation.id()).unwrap_err();
    assert!(err.is_invalid_transition());
}

#[test]
fn test_confirm_rejects_unsettled_and_mismatched_payments() {
    let store = TestStore::new();
    let mut db = store.open();
    let mut payments = PaymentLedger::open(store.config()).unwrap();
    let period = stay(date(2026, 10, 18), date(2026, 10, 19));
    add_room(&mut db, "deluxe", 1, period);

    let request = CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest")
        .with_unit_price(10_000);
    let reservation = ReservationOperations::create(&mut db, &request).unwrap();

    let unpaid = payments.record(Some(reservation.id()), 10_000).unwrap();
    let err = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(reservation.id().clone(), unpaid.merchant_id.clone()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::PaymentNotSettled {
            status: PaymentStatus::Ready,
            ..
        }
    ));

    let short = payments.record(Some(reservation.id()), 9_999).unwrap();
    payments.settle(&short.merchant_id).unwrap();
    let err = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(reservation.id().clone(), short.merchant_id),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::PaymentAmountMismatch {
            expected: 10_000,
            actual: 9_999,
            ..
        }
    ));

    let err = ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(reservation.id().clone(), "P20261018999999"),
    )
    .unwrap_err();
    assert!(err.is_not_found());

    let still_pending = ReservationOperations::get(&db, reservation.id()).unwrap();
    assert_eq!(still_pending.status(), ReservationStatus::Pending);
    assert_eq!(still_pending.payment_ref(), None);
}

#[test]
fn test_failed_payment_releases_seats() {
    let store = TestStore::new();
    let mut db = store.open();
    let seats = add_seats(&mut db, "KE123", 3);

    let request = CreateReservationRequest::seats("KE123", seats[..2].to_vec(), "traveller")
        .with_unit_price(55_000);
    let reservation = ReservationOperations::create(&mut db, &request).unwrap();
    assert_eq!(reservation.total_price(), 110_000);

    let failed = ReservationOperations::fail(&mut db, reservation.id(), "card declined").unwrap();
    assert_eq!(failed.status(), ReservationStatus::Failed);
    assert_eq!(failed.status_reason(), Some("card declined"));

    let held = InventoryLedger::seats(db.connection(), "KE123")
        .unwrap()
        .into_iter()
        .filter(|seat| seat.is_held())
        .count();
    assert_eq!(held, 0);

    // The released seats can be sold again
    let again = CreateReservationRequest::seats("KE123", seats[..2].to_vec(), "someone-else");
    ReservationOperations::create(&mut db, &again).unwrap();
}

#[test]
fn test_cancel_is_idempotent_and_confirmed_cannot_be_cancelled() {
    let store = TestStore::new();
    let mut db = store.open();
    let mut payments = PaymentLedger::open(store.config()).unwrap();
    let period = stay(date(2026, 10, 18), date(2026, 10, 20));
    add_room(&mut db, "deluxe", 2, period);

    let first = ReservationOperations::create(
        &mut db,
        &CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "a"),
    )
    .unwrap();
    let cancel = CancelReservationRequest::new(first.id().clone(), "changed plans");
    ReservationOperations::cancel(&mut db, &cancel).unwrap();
    let again = ReservationOperations::cancel(&mut db, &cancel).unwrap();
    assert_eq!(again.status(), ReservationStatus::Cancelled);
    // A repeated cancel must not give the inventory back twice
    assert_eq!(remaining(&db, "deluxe", date(2026, 10, 18)), 2);

    let second = ReservationOperations::create(
        &mut db,
        &CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "b"),
    )
    .unwrap();
    let payment = payments.record(Some(second.id()), 0).unwrap();
    payments.settle(&payment.merchant_id).unwrap();
    ReservationOperations::confirm(
        &mut db,
        &payments,
        &ConfirmReservationRequest::new(second.id().clone(), payment.merchant_id),
    )
    .unwrap();

    let err = ReservationOperations::cancel(
        &mut db,
        &CancelReservationRequest::new(second.id().clone(), "too late"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidStateTransition {
            from: ReservationStatus::Confirmed,
            to: ReservationStatus::Cancelled,
            ..
        }
    ));
    assert_eq!(remaining(&db, "deluxe", date(2026, 10, 18)), 1);
}

#[test]
fn test_delivery_slot_books_a_single_day() {
    let store = TestStore::new();
    let mut db = store.open();
    db.write(|tx| {
        let slot = BookableUnit::new("slot-am", TargetType::Delivery, 4)?;
        InventoryLedger::register_unit(tx, &slot)?;
        InventoryLedger::materialize_dates(
            tx,
            "slot-am",
            stay(date(2026, 10, 18), date(2026, 10, 25)),
            None,
        )
    })
    .unwrap();

    let day = stay(date(2026, 10, 20), date(2026, 10, 21));
    let reservation = ReservationOperations::create(
        &mut db,
        &CreateReservationRequest::dated(TargetType::Delivery, "slot-am", day, 1, "customer-3"),
    )
    .unwrap();
    assert!(reservation.id().as_str().starts_with('D'));
    assert_eq!(remaining(&db, "slot-am", date(2026, 10, 20)), 3);
    assert_eq!(remaining(&db, "slot-am", date(2026, 10, 21)), 4);

    let week = stay(date(2026, 10, 20), date(2026, 10, 22));
    let err = ReservationOperations::create(
        &mut db,
        &CreateReservationRequest::dated(TargetType::Delivery, "slot-am", week, 1, "customer-3"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_closed_date_refuses_new_holds() {
    let store = TestStore::new();
    let mut db = store.open();
    let period = stay(date(2026, 10, 18), date(2026, 10, 21));
    add_room(&mut db, "deluxe", 5, period);
    db.write(|tx| InventoryLedger::set_availability(tx, "deluxe", date(2026, 10, 19), false))
        .unwrap();

    let err = ReservationOperations::create(
        &mut db,
        &CreateReservationRequest::dated(TargetType::Room, "deluxe", period, 1, "guest"),
    )
    .unwrap_err();
    assert!(err.is_sold_out());
    assert_eq!(remaining(&db, "deluxe", date(2026, 10, 18)), 5);
}
