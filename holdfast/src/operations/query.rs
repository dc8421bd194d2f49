//! Read-only reservation lookups.

use crate::database::Database;
use crate::error::Result;
use crate::inventory::Hold;
use crate::reservation::{Reservation, ReservationId, ReservationStatus};

use super::create::ReservationOperations;

impl ReservationOperations {
    /// Looks up one reservation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] for an unknown id, or a database error.
    pub fn get(db: &Database, id: &ReservationId) -> Result<Reservation> {
        Database::require_reservation(db.connection(), id)
    }

    /// Lists one actor's reservations, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_by_actor(db: &Database, actor_id: &str) -> Result<Vec<Reservation>> {
        Database::list_reservations_by_actor(db.connection(), actor_id)
    }

    /// Lists every reservation, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all(db: &Database, status: Option<ReservationStatus>) -> Result<Vec<Reservation>> {
        Database::list_reservations(db.connection(), status)
    }

    /// Lists the holds a reservation took, including released ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn holds(db: &Database, id: &ReservationId) -> Result<Vec<Hold>> {
        Database::holds_for(db.connection(), id)
    }
}
