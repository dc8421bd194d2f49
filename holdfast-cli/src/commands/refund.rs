//! Refund command implementation.

use crate::error::CliError;
use crate::utils::{
    database_config, load_configuration, open_database, parse_reservation_id, GlobalOptions,
};
use clap::Args;
use holdfast::operations::ReservationOperations;
use holdfast::{PaymentLedger, ReservationId, ReservationStatus};

/// Apply a recorded refund to a confirmed reservation.
///
/// Record the refund first with `holdfast payment refund`. A full refund
/// releases the reservation's inventory; a partial one keeps it held.
#[derive(Args)]
pub struct RefundCommand {
    /// Reservation to refund
    #[arg(value_parser = parse_reservation_id)]
    pub reservation_id: ReservationId,
}

impl RefundCommand {
    /// Execute the refund command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        let payments = PaymentLedger::open(database_config(global, &config)?)?;

        let reservation = ReservationOperations::refund(&mut db, &payments, &self.reservation_id)?;

        println!("{} {}", reservation.id(), reservation.status());
        if reservation.status() == ReservationStatus::PartiallyRefunded && !global.quiet {
            eprintln!("Partial refund: inventory stays held");
        }
        Ok(())
    }
}
