//! Payment command implementation.
//!
//! Drives the store-backed payment ledger the way a payment provider's
//! callbacks would: record a payment, then settle, fail, or refund it.

use crate::error::CliError;
use crate::utils::{
    database_config, format_amount, load_configuration, open_database, GlobalOptions,
};
use clap::{Args, Subcommand};
use holdfast::operations::ReservationOperations;
use holdfast::{Error as LibError, PaymentLedger, PaymentRecord, ReservationId};

/// Record and update merchant payments.
#[derive(Args)]
pub struct PaymentCommand {
    #[command(subcommand)]
    pub action: PaymentAction,
}

/// Payment subcommands.
#[derive(Subcommand)]
pub enum PaymentAction {
    /// Record a READY payment and print its merchant id
    Record {
        /// Amount in minor currency units
        #[arg(long, value_name = "AMOUNT")]
        amount: i64,

        /// Reservation the payment is for
        #[arg(long, value_name = "ID", value_parser = crate::utils::parse_reservation_id)]
        reservation: Option<ReservationId>,
    },

    /// Mark a READY payment as paid
    Settle {
        /// Merchant id
        merchant_id: String,
    },

    /// Mark a READY payment as failed and fail its PENDING reservation
    Fail {
        /// Merchant id
        merchant_id: String,
    },

    /// Refund part or all of a paid payment
    Refund {
        /// Merchant id
        merchant_id: String,

        /// Amount to refund in minor currency units
        #[arg(long, value_name = "AMOUNT")]
        amount: i64,
    },
}

impl PaymentCommand {
    /// Execute the payment command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut payments = PaymentLedger::open(database_config(global, &config)?)?;

        match self.action {
            PaymentAction::Record {
                amount,
                reservation,
            } => {
                let record = payments.record(reservation.as_ref(), amount)?;
                println!("{}", record.merchant_id);
                if global.verbose {
                    report(&record);
                }
            }
            PaymentAction::Settle { merchant_id } => {
                let record = payments.settle(&merchant_id)?;
                print_status(&record, global);
            }
            PaymentAction::Fail { merchant_id } => {
                let record = payments.mark_failed(&merchant_id)?;
                print_status(&record, global);
                if let Some(ref id) = record.reservation_id {
                    fail_reservation(global, &config, id, &merchant_id)?;
                }
            }
            PaymentAction::Refund {
                merchant_id,
                amount,
            } => {
                let record = payments.refund(&merchant_id, amount)?;
                print_status(&record, global);
            }
        }

        Ok(())
    }
}

/// Fails the reservation a failed payment was taken for, if it still waits.
fn fail_reservation(
    global: &GlobalOptions,
    config: &holdfast::Config,
    reservation_id: &str,
    merchant_id: &str,
) -> Result<(), CliError> {
    let id = ReservationId::new(reservation_id)?;
    let mut db = open_database(global, config)?;

    // The status is only checked under the write lock inside `fail`
    match ReservationOperations::fail(&mut db, &id, &format!("payment {merchant_id} failed")) {
        Ok(reservation) => {
            println!("{} {}", reservation.id(), reservation.status());
            Ok(())
        }
        Err(LibError::InvalidStateTransition { from, .. }) => {
            if !global.quiet {
                eprintln!("Reservation {id} is {from}; left unchanged");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_status(record: &PaymentRecord, global: &GlobalOptions) {
    println!("{} {}", record.merchant_id, record.status);
    if global.verbose {
        report(record);
    }
}

fn report(record: &PaymentRecord) {
    eprintln!(
        "amount {}, refunded {}, reservation {}",
        format_amount(record.amount),
        format_amount(record.refunded_amount),
        record.reservation_id.as_deref().unwrap_or("-")
    );
}
