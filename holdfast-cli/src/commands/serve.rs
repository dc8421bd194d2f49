//! Serve command implementation.
//!
//! Runs the expiration sweep and the inventory rollover on their configured
//! schedules until the process is stopped or `--duration` elapses.

use crate::error::CliError;
use crate::utils::{database_config, load_configuration, GlobalOptions};
use clap::Args;
use holdfast::operations::{BackgroundTasks, ScheduleConfig};
use std::thread;
use std::time::Duration;

/// Run the background tasks in the foreground.
#[derive(Args)]
pub struct ServeCommand {
    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let schedule = ScheduleConfig::from_config(&config);

        if !global.quiet {
            eprintln!(
                "Sweeping every {}s (hold timeout {}s), rolling over every {}s ({} day horizon)",
                schedule.sweep_interval.as_secs(),
                schedule.hold_timeout.as_secs(),
                schedule.rollover_interval.as_secs(),
                schedule.horizon_days
            );
        }

        let tasks = BackgroundTasks::spawn(database_config(global, &config)?, schedule)?;

        match self.duration {
            Some(seconds) => {
                thread::sleep(Duration::from_secs(seconds));
                tasks.shutdown();
                if !global.quiet {
                    eprintln!("Stopped after {seconds}s");
                }
            }
            None => loop {
                thread::park();
            },
        }

        Ok(())
    }
}
