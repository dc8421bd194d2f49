//! Cancel command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, parse_reservation_id, GlobalOptions};
use clap::Args;
use holdfast::operations::{CancelReservationRequest, ReservationOperations};
use holdfast::ReservationId;

/// Cancel a PENDING reservation and give its inventory back.
///
/// Cancelling an already cancelled reservation succeeds without changes.
/// A confirmed reservation is refunded instead (see `holdfast refund`).
#[derive(Args)]
pub struct CancelCommand {
    /// Reservation to cancel
    #[arg(value_parser = parse_reservation_id)]
    pub reservation_id: ReservationId,

    /// Reason recorded on the reservation
    #[arg(long, value_name = "TEXT", default_value = "cancelled by operator")]
    pub reason: String,
}

impl CancelCommand {
    /// Execute the cancel command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        let request = CancelReservationRequest::new(self.reservation_id, self.reason);
        let reservation = ReservationOperations::cancel(&mut db, &request)?;

        println!("{} {}", reservation.id(), reservation.status());
        Ok(())
    }
}
