//! Status transitions of existing reservations.
//!
//! Every transition is a compare-and-swap on the reservation's current
//! status, applied inside one write transaction together with any release of
//! holds. When two callers race to move the same PENDING reservation, the
//! first to swap wins and the other receives
//! [`Error::InvalidStateTransition`].
//!
//! Releasing is idempotent. Holds are marked released as they are handed
//! back, so a repeated cancel, expire, or fail returns the reservation
//! unchanged and never gives inventory back twice.

use std::time::SystemTime;

use crate::database::{Database, StatusChange};
use crate::error::{Error, Result};
use crate::inventory::InventoryLedger;
use crate::payment::{PaymentGateway, PaymentStatus};
use crate::reservation::{Reservation, ReservationId, ReservationStatus};

use super::create::ReservationOperations;

/// Reason recorded on reservations cancelled by the expiration sweep.
pub const EXPIRED_REASON: &str = "expired";

/// Request to confirm a PENDING reservation against a settled payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmReservationRequest {
    /// Reservation to confirm.
    pub reservation_id: ReservationId,
    /// Merchant id of the payment that settles it.
    pub payment_ref: String,
}

impl ConfirmReservationRequest {
    /// Creates a confirm request.
    #[must_use]
    pub fn new(reservation_id: ReservationId, payment_ref: impl Into<String>) -> Self {
        Self {
            reservation_id,
            payment_ref: payment_ref.into(),
        }
    }
}

/// Request to cancel a PENDING reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReservationRequest {
    /// Reservation to cancel.
    pub reservation_id: ReservationId,
    /// Why it was cancelled.
    pub reason: String,
}

impl CancelReservationRequest {
    /// Creates a cancel request.
    #[must_use]
    pub fn new(reservation_id: ReservationId, reason: impl Into<String>) -> Self {
        Self {
            reservation_id,
            reason: reason.into(),
        }
    }
}

/// Outcome of a transition that releases holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Released {
    pub reservation: Reservation,
    /// False when the reservation was already in the requested status.
    pub changed: bool,
}

fn invalid_transition(
    conn: &rusqlite::Connection,
    id: &ReservationId,
    to: ReservationStatus,
) -> Error {
    match Database::require_reservation(conn, id) {
        Ok(found) => Error::InvalidStateTransition {
            reservation_id: id.to_string(),
            from: found.status(),
            to,
        },
        Err(err) => err,
    }
}

fn release_holds(conn: &rusqlite::Connection, id: &ReservationId, at: SystemTime) -> Result<usize> {
    let holds = Database::take_unreleased_holds(conn, id, at)?;
    for hold in &holds {
        InventoryLedger::release_hold(conn, hold)?;
    }
    Ok(holds.len())
}

impl ReservationOperations {
    /// Moves a PENDING reservation to CONFIRMED once its payment is PAID.
    ///
    /// The payment is read before the write lock is taken; the status change
    /// itself is a compare-and-swap, so a reservation expired in between is
    /// reported as [`Error::InvalidStateTransition`]. Inventory is not
    /// touched.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for an unknown reservation or payment
    /// - [`Error::InvalidStateTransition`] if the reservation is not PENDING
    /// - [`Error::PaymentNotSettled`] if the payment is not PAID
    /// - [`Error::PaymentAmountMismatch`] if the paid amount differs from the total
    /// - [`Error::PaymentBelongsToAnother`] if the payment was taken for, or
    ///   already confirmed, a different reservation
    ///
    /// Nothing is written when any of these is returned.
    pub fn confirm<G: PaymentGateway + ?Sized>(
        db: &mut Database,
        gateway: &G,
        request: &ConfirmReservationRequest,
    ) -> Result<Reservation> {
        Self::confirm_at(db, gateway, request, SystemTime::now())
    }

    /// Same as [`Self::confirm`] with an explicit confirmation time.
    ///
    /// # Errors
    ///
    /// See [`Self::confirm`].
    pub fn confirm_at<G: PaymentGateway + ?Sized>(
        db: &mut Database,
        gateway: &G,
        request: &ConfirmReservationRequest,
        now: SystemTime,
    ) -> Result<Reservation> {
        let id = &request.reservation_id;
        let current = Database::require_reservation(db.connection(), id)?;
        if current.status() != ReservationStatus::Pending {
            return Err(Error::InvalidStateTransition {
                reservation_id: id.to_string(),
                from: current.status(),
                to: ReservationStatus::Confirmed,
            });
        }

        let payment = gateway.payment(&request.payment_ref)?;
        if payment.status != PaymentStatus::Paid {
            return Err(Error::PaymentNotSettled {
                merchant_id: payment.merchant_id,
                status: payment.status,
            });
        }
        if payment.amount != current.total_price() {
            return Err(Error::PaymentAmountMismatch {
                merchant_id: payment.merchant_id,
                expected: current.total_price(),
                actual: payment.amount,
            });
        }
        if let Some(owner) = payment.reservation_id {
            if owner != id.as_str() {
                return Err(Error::PaymentBelongsToAnother {
                    merchant_id: payment.merchant_id,
                    owner,
                });
            }
        }

        let reservation = db.write(|tx| {
            if let Some(owner) = Database::reservation_for_payment(tx, &request.payment_ref)? {
                if owner != *id {
                    return Err(Error::PaymentBelongsToAnother {
                        merchant_id: request.payment_ref.clone(),
                        owner: owner.to_string(),
                    });
                }
            }
            let change = StatusChange {
                id,
                from: ReservationStatus::Pending,
                to: ReservationStatus::Confirmed,
                reason: None,
                payment_ref: Some(&request.payment_ref),
                at: now,
            };
            if !Database::compare_and_set_status(tx, &change)? {
                return Err(invalid_transition(tx, id, ReservationStatus::Confirmed));
            }
            Database::require_reservation(tx, id)
        })?;

        log::debug!("confirmed {id} with payment {}", request.payment_ref);
        Ok(reservation)
    }

    /// Cancels a PENDING reservation and gives its inventory back.
    ///
    /// Cancelling an already CANCELLED reservation returns it unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for an unknown reservation
    /// - [`Error::InvalidStateTransition`] from any other status; a
    ///   CONFIRMED booking goes through [`Self::refund`] instead
    pub fn cancel(db: &mut Database, request: &CancelReservationRequest) -> Result<Reservation> {
        Self::release_transition(
            db,
            &request.reservation_id,
            ReservationStatus::Cancelled,
            &request.reason,
            SystemTime::now(),
        )
        .map(|released| released.reservation)
    }

    /// Cancels a stale PENDING reservation with reason `"expired"`.
    ///
    /// # Errors
    ///
    /// See [`Self::cancel`].
    pub fn expire(db: &mut Database, id: &ReservationId) -> Result<Reservation> {
        Self::expire_at(db, id, SystemTime::now())
    }

    /// Same as [`Self::expire`] with an explicit time.
    ///
    /// # Errors
    ///
    /// See [`Self::cancel`].
    pub fn expire_at(
        db: &mut Database,
        id: &ReservationId,
        now: SystemTime,
    ) -> Result<Reservation> {
        Self::release_transition(db, id, ReservationStatus::Cancelled, EXPIRED_REASON, now)
            .map(|released| released.reservation)
    }

    /// Marks a PENDING reservation FAILED after its payment failed.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for an unknown reservation
    /// - [`Error::InvalidStateTransition`] if the reservation is not PENDING
    pub fn fail(db: &mut Database, id: &ReservationId, reason: &str) -> Result<Reservation> {
        Self::release_transition(db, id, ReservationStatus::Failed, reason, SystemTime::now())
            .map(|released| released.reservation)
    }

    /// Applies a refund recorded by the payment collaborator.
    ///
    /// A fully refunded payment moves the reservation to REFUNDED and gives
    /// its inventory back. A partially refunded payment moves it to
    /// PARTIALLY_REFUNDED and keeps the holds.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for an unknown reservation or payment
    /// - [`Error::InvalidStateTransition`] if the reservation is not CONFIRMED
    /// - [`Error::PaymentNotSettled`] if the payment shows no refund
    pub fn refund<G: PaymentGateway + ?Sized>(
        db: &mut Database,
        gateway: &G,
        id: &ReservationId,
    ) -> Result<Reservation> {
        let current = Database::require_reservation(db.connection(), id)?;
        if current.status() != ReservationStatus::Confirmed {
            return Err(Error::InvalidStateTransition {
                reservation_id: id.to_string(),
                from: current.status(),
                to: ReservationStatus::Refunded,
            });
        }
        let payment_ref = current.payment_ref().ok_or_else(|| Error::NotFound {
            resource: format!("payment for {id}"),
        })?;

        let payment = gateway.payment(payment_ref)?;
        let target = match payment.status {
            PaymentStatus::Refunded => ReservationStatus::Refunded,
            PaymentStatus::PartiallyRefunded => ReservationStatus::PartiallyRefunded,
            status => {
                return Err(Error::PaymentNotSettled {
                    merchant_id: payment.merchant_id,
                    status,
                })
            }
        };

        let now = SystemTime::now();
        let reservation = db.write(|tx| {
            let change = StatusChange {
                id,
                from: ReservationStatus::Confirmed,
                to: target,
                reason: None,
                payment_ref: None,
                at: now,
            };
            if !Database::compare_and_set_status(tx, &change)? {
                return Err(invalid_transition(tx, id, target));
            }
            if target.releases_inventory() {
                release_holds(tx, id, now)?;
            }
            Database::require_reservation(tx, id)
        })?;

        log::debug!("{id} is now {target}");
        Ok(reservation)
    }

    pub(crate) fn release_transition(
        db: &mut Database,
        id: &ReservationId,
        to: ReservationStatus,
        reason: &str,
        now: SystemTime,
    ) -> Result<Released> {
        let released = db.write(|tx| {
            let current = Database::require_reservation(tx, id)?;
            if current.status() == to {
                return Ok(Released {
                    reservation: current,
                    changed: false,
                });
            }
            if !current.status().can_transition_to(to) {
                return Err(Error::InvalidStateTransition {
                    reservation_id: id.to_string(),
                    from: current.status(),
                    to,
                });
            }

            let change = StatusChange {
                id,
                from: current.status(),
                to,
                reason: Some(reason),
                payment_ref: None,
                at: now,
            };
            if !Database::compare_and_set_status(tx, &change)? {
                return Err(invalid_transition(tx, id, to));
            }
            let count = release_holds(tx, id, now)?;
            log::debug!("{id} is now {to} ({reason}), released {count} holds");

            Ok(Released {
                reservation: Database::require_reservation(tx, id)?,
                changed: true,
            })
        })?;

        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_test_database, two_nights};
    use crate::inventory::{BookableUnit, SeatClass};
    use crate::operations::CreateReservationRequest;
    use crate::payment::{MockPaymentGateway, PaymentRecord};
    use crate::reservation::TargetType;

    fn setup(db: &mut Database) -> Reservation {
        db.write(|tx| {
            InventoryLedger::register_unit(tx, &BookableUnit::new("deluxe", TargetType::Room, 2)?)?;
            InventoryLedger::materialize_dates(tx, "deluxe", two_nights(), None)
        })
        .unwrap();
        let request =
            CreateReservationRequest::dated(TargetType::Room, "deluxe", two_nights(), 1, "guest")
                .with_unit_price(10_000);
        ReservationOperations::create(db, &request).unwrap()
    }

    fn remaining(db: &Database) -> Vec<u32> {
        InventoryLedger::date_inventory(db.connection(), "deluxe", two_nights())
            .unwrap()
            .into_iter()
            .map(|row| row.remaining)
            .collect()
    }

    fn payment(merchant_id: &str, amount: i64, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            merchant_id: merchant_id.to_string(),
            reservation_id: None,
            amount,
            refunded_amount: 0,
            status,
            updated_at: SystemTime::now(),
        }
    }

    fn gateway_returning(record: PaymentRecord) -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();
        let expected = record.merchant_id.clone();
        gateway
            .expect_payment()
            .withf(move |merchant_id| merchant_id == expected)
            .returning(move |_| Ok(record.clone()));
        gateway
    }

    #[test]
    fn test_confirm_with_paid_payment() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let gateway = gateway_returning(payment("P1", 20_000, PaymentStatus::Paid));

        let request = ConfirmReservationRequest::new(reservation.id().clone(), "P1");
        let confirmed = ReservationOperations::confirm(&mut db, &gateway, &request).unwrap();

        assert_eq!(confirmed.status(), ReservationStatus::Confirmed);
        assert_eq!(confirmed.payment_ref(), Some("P1"));
        assert!(confirmed.confirmed_at().is_some());
        assert_eq!(remaining(&db), vec![1, 1]);
    }

    #[test]
    fn test_confirm_rejects_unsettled_payment() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let gateway = gateway_returning(payment("P1", 20_000, PaymentStatus::Ready));

        let request = ConfirmReservationRequest::new(reservation.id().clone(), "P1");
        let err = ReservationOperations::confirm(&mut db, &gateway, &request).unwrap_err();
        assert!(matches!(err, Error::PaymentNotSettled { status: PaymentStatus::Ready, .. }));

        let unchanged = Database::require_reservation(db.connection(), reservation.id()).unwrap();
        assert_eq!(unchanged.status(), ReservationStatus::Pending);
        assert_eq!(unchanged.payment_ref(), None);
        assert_eq!(remaining(&db), vec![1, 1]);
    }

    #[test]
    fn test_confirm_rejects_amount_mismatch() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let gateway = gateway_returning(payment("P1", 19_999, PaymentStatus::Paid));

        let request = ConfirmReservationRequest::new(reservation.id().clone(), "P1");
        let err = ReservationOperations::confirm(&mut db, &gateway, &request).unwrap_err();
        assert!(matches!(
            err,
            Error::PaymentAmountMismatch {
                expected: 20_000,
                actual: 19_999,
                ..
            }
        ));
    }

    #[test]
    fn test_confirm_rejects_payment_taken_for_another_reservation() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let mut record = payment("P1", 20_000, PaymentStatus::Paid);
        record.reservation_id = Some("R20261018000099".to_string());
        let gateway = gateway_returning(record);

        let request = ConfirmReservationRequest::new(reservation.id().clone(), "P1");
        let err = ReservationOperations::confirm(&mut db, &gateway, &request).unwrap_err();
        assert!(matches!(
            err,
            Error::PaymentBelongsToAnother { ref owner, .. } if owner == "R20261018000099"
        ));

        let unchanged = Database::require_reservation(db.connection(), reservation.id()).unwrap();
        assert_eq!(unchanged.status(), ReservationStatus::Pending);
    }

    #[test]
    fn test_confirm_cancelled_reservation_skips_gateway() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        ReservationOperations::cancel(
            &mut db,
            &CancelReservationRequest::new(reservation.id().clone(), "changed plans"),
        )
        .unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_payment().never();

        let request = ConfirmReservationRequest::new(reservation.id().clone(), "P1");
        let err = ReservationOperations::confirm(&mut db, &gateway, &request).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_cancel_releases_inventory_once() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        assert_eq!(remaining(&db), vec![1, 1]);

        let request = CancelReservationRequest::new(reservation.id().clone(), "changed plans");
        let cancelled = ReservationOperations::cancel(&mut db, &request).unwrap();
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
        assert_eq!(cancelled.status_reason(), Some("changed plans"));
        assert_eq!(remaining(&db), vec![2, 2]);

        let again = ReservationOperations::cancel(&mut db, &request).unwrap();
        assert_eq!(again, cancelled);
        assert_eq!(remaining(&db), vec![2, 2]);

        let expired = ReservationOperations::expire(&mut db, reservation.id()).unwrap();
        assert_eq!(expired.status_reason(), Some("changed plans"));
        assert_eq!(remaining(&db), vec![2, 2]);
    }

    #[test]
    fn test_expire_records_reason() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);

        let expired = ReservationOperations::expire(&mut db, reservation.id()).unwrap();
        assert_eq!(expired.status(), ReservationStatus::Cancelled);
        assert_eq!(expired.status_reason(), Some(EXPIRED_REASON));
        assert_eq!(remaining(&db), vec![2, 2]);

        let holds = Database::holds_for(db.connection(), reservation.id()).unwrap();
        assert!(holds.iter().all(|h| !h.is_active()));
    }

    #[test]
    fn test_fail_releases_inventory() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);

        let failed =
            ReservationOperations::fail(&mut db, reservation.id(), "card declined").unwrap();
        assert_eq!(failed.status(), ReservationStatus::Failed);
        assert_eq!(remaining(&db), vec![2, 2]);

        let err = ReservationOperations::expire(&mut db, reservation.id()).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_confirmed_reservation_cannot_be_cancelled() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let gateway = gateway_returning(payment("P1", 20_000, PaymentStatus::Paid));
        ReservationOperations::confirm(
            &mut db,
            &gateway,
            &ConfirmReservationRequest::new(reservation.id().clone(), "P1"),
        )
        .unwrap();

        let err = ReservationOperations::cancel(
            &mut db,
            &CancelReservationRequest::new(reservation.id().clone(), "too late"),
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
        assert_eq!(remaining(&db), vec![1, 1]);
    }

    #[test]
    fn test_full_refund_releases_inventory() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let paid = gateway_returning(payment("P1", 20_000, PaymentStatus::Paid));
        ReservationOperations::confirm(
            &mut db,
            &paid,
            &ConfirmReservationRequest::new(reservation.id().clone(), "P1"),
        )
        .unwrap();

        let refunded = gateway_returning(payment("P1", 20_000, PaymentStatus::Refunded));
        let result = ReservationOperations::refund(&mut db, &refunded, reservation.id()).unwrap();
        assert_eq!(result.status(), ReservationStatus::Refunded);
        assert_eq!(remaining(&db), vec![2, 2]);

        let err = ReservationOperations::refund(&mut db, &refunded, reservation.id()).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_partial_refund_keeps_holds() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let paid = gateway_returning(payment("P1", 20_000, PaymentStatus::Paid));
        ReservationOperations::confirm(
            &mut db,
            &paid,
            &ConfirmReservationRequest::new(reservation.id().clone(), "P1"),
        )
        .unwrap();

        let partial = gateway_returning(payment("P1", 20_000, PaymentStatus::PartiallyRefunded));
        let result = ReservationOperations::refund(&mut db, &partial, reservation.id()).unwrap();
        assert_eq!(result.status(), ReservationStatus::PartiallyRefunded);
        assert_eq!(remaining(&db), vec![1, 1]);
    }

    #[test]
    fn test_refund_requires_refunded_payment() {
        let mut db = create_test_database();
        let reservation = setup(&mut db);
        let paid = gateway_returning(payment("P1", 20_000, PaymentStatus::Paid));
        ReservationOperations::confirm(
            &mut db,
            &paid,
            &ConfirmReservationRequest::new(reservation.id().clone(), "P1"),
        )
        .unwrap();

        let err = ReservationOperations::refund(&mut db, &paid, reservation.id()).unwrap_err();
        assert!(matches!(err, Error::PaymentNotSettled { status: PaymentStatus::Paid, .. }));
        let current = Database::require_reservation(db.connection(), reservation.id()).unwrap();
        assert_eq!(current.status(), ReservationStatus::Confirmed);
    }

    #[test]
    fn test_cancel_seat_reservation_frees_seats() {
        let mut db = create_test_database();
        db.write(|tx| {
            let seats = [("4D".to_string(), SeatClass::Business)];
            InventoryLedger::materialize_seats(tx, "KE123", &seats)
        })
        .unwrap();
        let reservation = ReservationOperations::create(
            &mut db,
            &CreateReservationRequest::seats("KE123", vec!["4D".into()], "traveller"),
        )
        .unwrap();

        ReservationOperations::cancel(
            &mut db,
            &CancelReservationRequest::new(reservation.id().clone(), "no show"),
        )
        .unwrap();

        let seats = InventoryLedger::seats(db.connection(), "KE123").unwrap();
        assert!(!seats[0].is_held());

        let rebooked = ReservationOperations::create(
            &mut db,
            &CreateReservationRequest::seats("KE123", vec!["4D".into()], "someone-else"),
        )
        .unwrap();
        assert_eq!(rebooked.status(), ReservationStatus::Pending);
    }

    #[test]
    fn test_unknown_reservation_is_not_found() {
        let mut db = create_test_database();
        let id = ReservationId::from_parts("R", "20261018", 99);
        assert!(ReservationOperations::expire(&mut db, &id).unwrap_err().is_not_found());
    }
}
