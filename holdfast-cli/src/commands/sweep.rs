//! Sweep command implementation.
//!
//! Runs the expiration sweep once: every PENDING reservation older than the
//! hold timeout is cancelled with reason `expired` and its inventory given back.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};
use clap::Args;
use holdfast::operations::ExpirationReconciler;
use std::time::Duration;

/// Expire reservations whose hold timed out.
#[derive(Args)]
pub struct SweepCommand {
    /// Override the configured hold timeout (in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub hold_timeout: Option<u64>,

    /// Report what would expire without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SweepCommand {
    /// Execute the sweep command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;

        let reconciler = match self.hold_timeout {
            Some(0) => {
                return Err(CliError::InvalidArguments(
                    "--hold-timeout must be positive".into(),
                ))
            }
            Some(seconds) => ExpirationReconciler::new(Duration::from_secs(seconds)),
            None => ExpirationReconciler::from_config(&config),
        };
        let timeout = reconciler.hold_timeout().as_secs();

        if self.dry_run && !global.quiet {
            eprintln!("[DRY RUN] Scanning for reservations pending longer than {timeout}s...");
        }

        let mut db = open_database(global, &config)?;
        let result = reconciler.sweep_at(&mut db, std::time::SystemTime::now(), self.dry_run)?;

        if global.quiet {
            if !result.expired.is_empty() {
                println!("{}", result.expired.len());
            }
        } else {
            let verb = if self.dry_run {
                "[DRY RUN] Would expire"
            } else {
                "Expired"
            };
            eprintln!(
                "{verb} {} of {} stale reservation(s)",
                result.expired.len(),
                result.examined
            );
            if global.verbose {
                for id in &result.expired {
                    eprintln!("  - {id}");
                }
                for id in &result.skipped {
                    eprintln!("  - {id}: changed status first, skipped");
                }
            }
            for failure in &result.failures {
                eprintln!("  - {}: {}", failure.reservation_id, failure.error);
            }
        }

        Ok(())
    }
}
