//! Availability command implementation.
//!
//! Lists the materialized inventory rows of one dated unit. Dates that were
//! never materialized are absent from the listing.

use crate::error::CliError;
use crate::utils::{
    load_configuration, open_database, output_format, period_from_args, GlobalOptions, Listing,
};
use chrono::NaiveDate;
use clap::Args;
use holdfast::{DateInventory, InventoryLedger, OutputFormat};

/// Column headers, in output order.
const COLUMN_HEADERS: [&str; 6] = ["unit_id", "date", "remaining", "held", "capacity", "available"];

/// Show per-date availability of a unit.
#[derive(Args)]
pub struct AvailabilityCommand {
    /// Unit identifier
    pub unit_id: String,

    /// First date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: NaiveDate,

    /// Date after the last one (defaults to the day after --from)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<OutputFormat>,
}

impl AvailabilityCommand {
    /// Execute the availability command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;

        let period = period_from_args(self.from, self.to)?;
        let rows = InventoryLedger::date_inventory(db.connection(), &self.unit_id, period)?;

        listing(&rows).print(output_format(self.format, &config))
    }
}

fn listing(rows: &[DateInventory]) -> Listing<'static> {
    Listing {
        headers: &COLUMN_HEADERS,
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    row.unit_id.clone(),
                    row.date.to_string(),
                    row.remaining.to_string(),
                    row.held().to_string(),
                    row.capacity.to_string(),
                    row.available.to_string(),
                ]
            })
            .collect(),
        json: rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "unit_id": row.unit_id,
                    "date": row.date.to_string(),
                    "remaining": row.remaining,
                    "held": row.held(),
                    "capacity": row.capacity,
                    "available": row.available,
                })
            })
            .collect(),
    }
}
