//! List command implementation.
//!
//! This module implements the `list` command, which displays reservations
//! in the human, JSON, or CSV format.

use crate::error::CliError;
use crate::utils::{
    format_timestamp, load_configuration, open_database, output_format, GlobalOptions, Listing,
};
use clap::Args;
use holdfast::operations::ReservationOperations;
use holdfast::{OutputFormat, Reservation, ReservationStatus};

/// Column headers, in output order.
const COLUMN_HEADERS: [&str; 11] = [
    "id",
    "status",
    "target_type",
    "target_id",
    "check_in",
    "check_out",
    "quantity",
    "total_price",
    "actor_id",
    "payment_ref",
    "created_at",
];

/// List reservations.
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<OutputFormat>,

    /// Only reservations of this actor
    #[arg(long, value_name = "ACTOR")]
    pub actor: Option<String>,

    /// Only reservations in this status
    #[arg(long, value_name = "STATUS", value_parser = parse_status)]
    pub status: Option<ReservationStatus>,
}

fn parse_status(s: &str) -> Result<ReservationStatus, String> {
    s.to_ascii_uppercase()
        .replace('-', "_")
        .parse()
        .map_err(|e: holdfast::ValidationError| e.message)
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;

        let mut reservations = match self.actor {
            Some(ref actor) => ReservationOperations::list_by_actor(&db, actor)?,
            None => ReservationOperations::list_all(&db, self.status)?,
        };
        if let Some(status) = self.status {
            reservations.retain(|r| r.status() == status);
        }

        reservation_listing(&reservations).print(output_format(self.format, &config))
    }
}

/// Builds the listing shared by `list` and `show`.
pub fn reservation_listing(reservations: &[Reservation]) -> Listing<'static> {
    Listing {
        headers: &COLUMN_HEADERS,
        rows: reservations
            .iter()
            .map(|r| {
                let period = r.period();
                vec![
                    r.id().to_string(),
                    r.status().to_string(),
                    r.target_type().to_string(),
                    r.target_id().to_string(),
                    period.map(|p| p.check_in().to_string()).unwrap_or_default(),
                    period.map(|p| p.check_out().to_string()).unwrap_or_default(),
                    r.quantity().to_string(),
                    r.total_price().to_string(),
                    r.actor_id().to_string(),
                    r.payment_ref().unwrap_or_default().to_string(),
                    format_timestamp(r.created_at()),
                ]
            })
            .collect(),
        json: reservations.iter().map(reservation_json).collect(),
    }
}

/// JSON object for one reservation.
pub fn reservation_json(r: &Reservation) -> serde_json::Value {
    let period = r.period();
    serde_json::json!({
        "id": r.id().as_str(),
        "status": r.status().as_str(),
        "status_reason": r.status_reason(),
        "target_type": r.target_type().as_str(),
        "target_id": r.target_id(),
        "check_in": period.map(|p| p.check_in().to_string()),
        "check_out": period.map(|p| p.check_out().to_string()),
        "quantity": r.quantity(),
        "unit_price": r.unit_price(),
        "total_price": r.total_price(),
        "actor_id": r.actor_id(),
        "payment_ref": r.payment_ref(),
        "created_at": format_timestamp(r.created_at()),
        "updated_at": format_timestamp(r.updated_at()),
        "confirmed_at": r.confirmed_at().map(format_timestamp),
    })
}
