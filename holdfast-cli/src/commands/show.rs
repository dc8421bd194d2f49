//! Show command implementation.

use crate::commands::list::{reservation_json, reservation_listing};
use crate::error::CliError;
use crate::utils::{
    format_amount, format_timestamp, load_configuration, open_database, output_format,
    parse_reservation_id, GlobalOptions,
};
use clap::Args;
use holdfast::operations::ReservationOperations;
use holdfast::{Hold, OutputFormat, Reservation, ReservationId};
use std::io::Write;

/// Show one reservation and its holds.
#[derive(Args)]
pub struct ShowCommand {
    /// Reservation to show
    #[arg(value_parser = parse_reservation_id)]
    pub reservation_id: ReservationId,

    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<OutputFormat>,
}

impl ShowCommand {
    /// Execute the show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;

        let reservation = ReservationOperations::get(&db, &self.reservation_id)?;
        let holds = ReservationOperations::holds(&db, &self.reservation_id)?;

        match output_format(self.format, &config) {
            OutputFormat::Human => print_human(&reservation, &holds),
            OutputFormat::Json => {
                let mut value = reservation_json(&reservation);
                value["holds"] = holds.iter().map(hold_json).collect();
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                serde_json::to_writer_pretty(&mut handle, &value)
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
                writeln!(handle)?;
                Ok(())
            }
            OutputFormat::Csv => {
                reservation_listing(std::slice::from_ref(&reservation)).print(OutputFormat::Csv)
            }
        }
    }
}

fn print_human(r: &Reservation, holds: &[Hold]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Reservation:  {}", r.id())?;
    match r.status_reason() {
        Some(reason) => writeln!(out, "Status:       {} ({reason})", r.status())?,
        None => writeln!(out, "Status:       {}", r.status())?,
    }
    writeln!(out, "Target:       {} {}", r.target_type(), r.target_id())?;
    if let Some(period) = r.period() {
        writeln!(out, "Period:       {period} ({} night(s))", period.nights())?;
    }
    writeln!(out, "Quantity:     {}", r.quantity())?;
    writeln!(
        out,
        "Price:        {} x {} = {}",
        r.quantity(),
        format_amount(r.unit_price()),
        format_amount(r.total_price())
    )?;
    writeln!(out, "Actor:        {}", r.actor_id())?;
    writeln!(out, "Payment:      {}", r.payment_ref().unwrap_or("-"))?;
    writeln!(out, "Created:      {}", format_timestamp(r.created_at()))?;
    writeln!(out, "Updated:      {}", format_timestamp(r.updated_at()))?;
    if let Some(confirmed_at) = r.confirmed_at() {
        writeln!(out, "Confirmed:    {}", format_timestamp(confirmed_at))?;
    }

    writeln!(out, "Holds:")?;
    for hold in holds {
        let date = hold.date.map_or_else(|| "-".to_string(), |d| d.to_string());
        let state = hold
            .released_at
            .map_or_else(|| "held".to_string(), |t| format!("released {}", format_timestamp(t)));
        writeln!(out, "  {}\t{date}\t{}\t{state}", hold.unit_id, hold.quantity)?;
    }

    Ok(())
}

fn hold_json(hold: &Hold) -> serde_json::Value {
    serde_json::json!({
        "unit_id": hold.unit_id,
        "date": hold.date.map(|d| d.to_string()),
        "quantity": hold.quantity,
        "released_at": hold.released_at.map(format_timestamp),
    })
}
