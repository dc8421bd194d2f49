//! Rollover command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};
use clap::Args;
use holdfast::operations::InventoryRollover;

/// Roll the dated inventory window forward.
///
/// Deletes past inventory rows no live reservation holds and materializes
/// the date `horizon` days ahead for every active unit.
#[derive(Args)]
pub struct RolloverCommand {
    /// Override the configured horizon (in days)
    #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..=365))]
    pub horizon_days: Option<u32>,

    /// Materialize every missing date from today through the horizon
    #[arg(long)]
    pub backfill: bool,

    /// Report changes without applying them
    #[arg(long)]
    pub dry_run: bool,
}

impl RolloverCommand {
    /// Execute the rollover command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let rollover = self
            .horizon_days
            .map_or_else(|| InventoryRollover::from_config(&config), InventoryRollover::new)
            .with_backfill(self.backfill);

        let mut db = open_database(global, &config)?;
        let result = rollover.run(&mut db, self.dry_run)?;

        if global.quiet {
            return Ok(());
        }

        let prefix = if result.dry_run { "[DRY RUN] Would purge" } else { "Purged" };
        eprintln!(
            "{prefix} {} past row(s) and materialize {} row(s) for {} unit(s) through {}",
            result.purged.len(),
            result.materialized,
            result.units,
            result.horizon
        );
        if global.verbose {
            for row in &result.purged {
                eprintln!("  - {} {}", row.unit_id, row.date);
            }
        }

        Ok(())
    }
}
