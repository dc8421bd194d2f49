//! Unit command implementation.
//!
//! Room types and delivery slots are dated units: the catalog holds their
//! baseline capacity, and per-date inventory rows are materialized from it.

use crate::error::CliError;
use crate::utils::{
    load_configuration, open_database, output_format, period_from_args, GlobalOptions, Listing,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use holdfast::{BookableUnit, InventoryLedger, OutputFormat, TargetType};

/// Manage room types and delivery slots.
#[derive(Args)]
pub struct UnitCommand {
    #[command(subcommand)]
    pub action: UnitAction,
}

/// Unit subcommands.
#[derive(Subcommand)]
pub enum UnitAction {
    /// Add a unit to the catalog, or update an existing one
    Add(UnitAddArgs),

    /// Create inventory rows for a range of dates
    Materialize(MaterializeArgs),

    /// Stop selling one date
    Close(DateArgs),

    /// Resume selling one date
    Open(DateArgs),

    /// List the catalog
    List(UnitListArgs),
}

/// Arguments for `unit add`.
#[derive(Args)]
pub struct UnitAddArgs {
    /// Unit identifier
    pub unit_id: String,

    /// Kind of unit (room or delivery)
    #[arg(long = "type", value_enum, default_value = "room")]
    pub target_type: TargetType,

    /// Units sellable per date
    #[arg(long, value_name = "N")]
    pub capacity: i64,

    /// Keep the unit out of the daily rollover
    #[arg(long)]
    pub inactive: bool,
}

/// Arguments for `unit materialize`.
#[derive(Args)]
pub struct MaterializeArgs {
    /// Unit identifier
    pub unit_id: String,

    /// First date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: NaiveDate,

    /// Date after the last one (defaults to the day after --from)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Capacity of the new rows (defaults to the catalog baseline)
    #[arg(long, value_name = "N")]
    pub capacity: Option<u32>,
}

/// Arguments for `unit close` and `unit open`.
#[derive(Args)]
pub struct DateArgs {
    /// Unit identifier
    pub unit_id: String,

    /// The date to change (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: NaiveDate,
}

/// Arguments for `unit list`.
#[derive(Args)]
pub struct UnitListArgs {
    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<OutputFormat>,
}

impl UnitCommand {
    /// Execute the unit command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        match self.action {
            UnitAction::Add(args) => {
                let mut unit = BookableUnit::new(args.unit_id, args.target_type, args.capacity)?;
                unit.active = !args.inactive;
                db.write(|tx| InventoryLedger::register_unit(tx, &unit))?;
                if !global.quiet {
                    eprintln!(
                        "Registered {} unit {} with capacity {}{}",
                        unit.target_type,
                        unit.unit_id,
                        unit.baseline_capacity,
                        if unit.active { "" } else { " (inactive)" }
                    );
                }
            }
            UnitAction::Materialize(args) => {
                let period = period_from_args(args.from, args.to)?;
                let created = db.write(|tx| {
                    InventoryLedger::materialize_dates(tx, &args.unit_id, period, args.capacity)
                })?;
                if global.quiet {
                    println!("{created}");
                } else {
                    eprintln!(
                        "Materialized {created} of {} date(s) for {}",
                        period.nights(),
                        args.unit_id
                    );
                }
            }
            UnitAction::Close(args) => {
                db.write(|tx| {
                    InventoryLedger::set_availability(tx, &args.unit_id, args.date, false)
                })?;
                if !global.quiet {
                    eprintln!("Closed {} on {}", args.unit_id, args.date);
                }
            }
            UnitAction::Open(args) => {
                db.write(|tx| {
                    InventoryLedger::set_availability(tx, &args.unit_id, args.date, true)
                })?;
                if !global.quiet {
                    eprintln!("Opened {} on {}", args.unit_id, args.date);
                }
            }
            UnitAction::List(args) => {
                let units = InventoryLedger::list_units(db.connection())?;
                let listing = Listing {
                    headers: &["unit_id", "target_type", "baseline_capacity", "active"],
                    rows: units
                        .iter()
                        .map(|u| {
                            vec![
                                u.unit_id.clone(),
                                u.target_type.to_string(),
                                u.baseline_capacity.to_string(),
                                u.active.to_string(),
                            ]
                        })
                        .collect(),
                    json: units
                        .iter()
                        .map(|u| {
                            serde_json::json!({
                                "unit_id": u.unit_id,
                                "target_type": u.target_type.as_str(),
                                "baseline_capacity": u.baseline_capacity,
                                "active": u.active,
                            })
                        })
                        .collect(),
                };
                listing.print(output_format(args.format, &config))?;
            }
        }

        Ok(())
    }
}
