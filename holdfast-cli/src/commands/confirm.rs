//! Confirm command implementation.

use crate::error::CliError;
use crate::utils::{
    database_config, load_configuration, open_database, parse_reservation_id, GlobalOptions,
};
use clap::Args;
use holdfast::operations::{ConfirmReservationRequest, ReservationOperations};
use holdfast::{PaymentLedger, ReservationId};

/// Confirm a reservation against a settled payment.
///
/// The payment must be PAID and its amount must match the reservation total.
#[derive(Args)]
pub struct ConfirmCommand {
    /// Reservation to confirm
    #[arg(value_parser = parse_reservation_id)]
    pub reservation_id: ReservationId,

    /// Merchant id of the payment (see `holdfast payment record`)
    #[arg(long, value_name = "MERCHANT_ID")]
    pub payment: String,
}

impl ConfirmCommand {
    /// Execute the confirm command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        let payments = PaymentLedger::open(database_config(global, &config)?)?;

        let request = ConfirmReservationRequest::new(self.reservation_id, self.payment);
        let reservation = ReservationOperations::confirm(&mut db, &payments, &request)?;

        println!("{} {}", reservation.id(), reservation.status());
        Ok(())
    }
}
