//! Seats command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, output_format, GlobalOptions, Listing};
use clap::{Args, Subcommand};
use holdfast::{InventoryLedger, OutputFormat, SeatClass};

/// Manage the seats of a trip.
#[derive(Args)]
pub struct SeatsCommand {
    #[command(subcommand)]
    pub action: SeatsAction,
}

/// Seats subcommands.
#[derive(Subcommand)]
pub enum SeatsAction {
    /// Add seats to a trip; existing seats are left as they are
    Add {
        /// Trip or flight identifier
        trip_id: String,

        /// Seat identifiers
        #[arg(required = true)]
        seats: Vec<String>,

        /// Cabin class of the new seats
        #[arg(long, value_enum, default_value = "economy", ignore_case = true)]
        class: SeatClass,
    },

    /// List the seats of a trip and who holds them
    List {
        /// Trip or flight identifier
        trip_id: String,

        /// Output format
        #[arg(long, value_enum, ignore_case = true)]
        format: Option<OutputFormat>,
    },
}

impl SeatsCommand {
    /// Execute the seats command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        match self.action {
            SeatsAction::Add {
                trip_id,
                seats,
                class,
            } => {
                let seats: Vec<(String, SeatClass)> =
                    seats.into_iter().map(|seat| (seat, class)).collect();
                let created =
                    db.write(|tx| InventoryLedger::materialize_seats(tx, &trip_id, &seats))?;
                if global.quiet {
                    println!("{created}");
                } else {
                    eprintln!("Added {created} of {} seat(s) to {trip_id}", seats.len());
                }
            }
            SeatsAction::List { trip_id, format } => {
                let seats = InventoryLedger::seats(db.connection(), &trip_id)?;
                let listing = Listing {
                    headers: &["seat_id", "trip_id", "class", "held_by"],
                    rows: seats
                        .iter()
                        .map(|s| {
                            vec![
                                s.unit_id.clone(),
                                s.parent_id.clone(),
                                s.seat_class.as_str().to_string(),
                                s.held_by.clone().unwrap_or_default(),
                            ]
                        })
                        .collect(),
                    json: seats
                        .iter()
                        .map(|s| {
                            serde_json::json!({
                                "seat_id": s.unit_id,
                                "trip_id": s.parent_id,
                                "class": s.seat_class.as_str(),
                                "held_by": s.held_by,
                            })
                        })
                        .collect(),
                };
                listing.print(output_format(format, &config))?;
            }
        }

        Ok(())
    }
}
