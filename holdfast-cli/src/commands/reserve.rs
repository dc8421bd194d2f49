//! Reserve command implementation.
//!
//! This module implements the `reserve` command, which creates a PENDING
//! reservation and holds its inventory. The reservation id is printed to
//! stdout so scripts can capture it.

use crate::error::CliError;
use crate::utils::{
    format_amount, load_configuration, open_database, period_from_args, GlobalOptions,
};
use chrono::NaiveDate;
use clap::Args;
use holdfast::operations::{CreateReservationRequest, ReservationOperations};
use holdfast::TargetType;

/// Create a PENDING reservation.
#[derive(Args)]
pub struct ReserveCommand {
    /// Room type, delivery slot, or trip to book
    pub target_id: String,

    /// What kind of inventory is booked
    #[arg(long = "type", value_enum, default_value = "room")]
    pub target_type: TargetType,

    /// Who the reservation is for
    #[arg(long, value_name = "ACTOR")]
    pub actor: String,

    /// Check-in date or delivery day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "seats")]
    pub from: Option<NaiveDate>,

    /// Check-out date (defaults to the day after --from)
    #[arg(long, value_name = "DATE", requires = "from")]
    pub to: Option<NaiveDate>,

    /// Units per date
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub quantity: u32,

    /// Seat to hold (repeat for several seats)
    #[arg(long = "seat", value_name = "SEAT")]
    pub seats: Vec<String>,

    /// Price of one unit for one date, in minor currency units
    #[arg(long, value_name = "AMOUNT", default_value_t = 0)]
    pub unit_price: i64,
}

impl ReserveCommand {
    /// Execute the reserve command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let request = self.build_request()?;

        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        let reservation = ReservationOperations::create(&mut db, &request)?;

        println!("{}", reservation.id());

        if global.verbose {
            match reservation.period() {
                Some(period) => eprintln!(
                    "Holding {} x {} for {period} ({} night(s)), total {}",
                    reservation.quantity(),
                    reservation.target_id(),
                    period.nights(),
                    format_amount(reservation.total_price()),
                ),
                None => eprintln!(
                    "Holding seat(s) {} on {}, total {}",
                    request.seats.join(", "),
                    reservation.target_id(),
                    format_amount(reservation.total_price()),
                ),
            }
            eprintln!(
                "Confirm within {}s or the hold expires",
                config.hold_timeout().as_secs()
            );
        }

        Ok(())
    }

    fn build_request(&self) -> Result<CreateReservationRequest, CliError> {
        let request = match self.target_type {
            TargetType::Seat => {
                if self.seats.is_empty() {
                    return Err(CliError::InvalidArguments(
                        "seat reservations need at least one --seat".into(),
                    ));
                }
                CreateReservationRequest::seats(&self.target_id, self.seats.clone(), &self.actor)
            }
            TargetType::Room | TargetType::Delivery => {
                if !self.seats.is_empty() {
                    return Err(CliError::InvalidArguments(format!(
                        "--seat applies to seat reservations, not {}",
                        self.target_type
                    )));
                }
                let from = self.from.ok_or_else(|| {
                    CliError::InvalidArguments(format!(
                        "{} reservations need --from",
                        self.target_type
                    ))
                })?;
                let period = period_from_args(from, self.to)?;
                CreateReservationRequest::dated(
                    self.target_type,
                    &self.target_id,
                    period,
                    self.quantity,
                    &self.actor,
                )
            }
        };
        Ok(request.with_unit_price(self.unit_price))
    }
}
