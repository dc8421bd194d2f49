//! Init command implementation.
//!
//! This module implements the `init` command for explicitly initializing
//! the holdfast data directory and store.

use crate::error::CliError;
use crate::utils::{data_dir, GlobalOptions};
use clap::Parser;
use holdfast::config::CONFIG_FILE_NAME;
use holdfast::database::DATABASE_FILE_NAME;
use holdfast::operations::{init_database, InitOptions};
use std::path::PathBuf;

/// Initialize the holdfast data directory and store.
#[derive(Parser)]
pub struct InitCommand {
    /// Data directory to initialize
    #[arg(long = "path", value_name = "PATH")]
    path: Option<PathBuf>,

    /// Replace an existing store
    #[arg(long)]
    overwrite: bool,

    /// Write a commented default configuration file
    #[arg(long)]
    with_config: bool,

    /// Preview actions without executing
    #[arg(long)]
    dry_run: bool,
}

impl InitCommand {
    /// Execute the init command.
    ///
    /// `--disable-autoinit` is ignored here; creating the store is the point.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let data_dir = match self.path {
            Some(path) => path,
            None => data_dir(global)?,
        };

        if self.dry_run {
            println!("Dry-run mode: no changes will be made");
            println!();
            println!("Would initialize holdfast in: {}", data_dir.display());

            if data_dir.exists() {
                println!("  - Data directory already exists: {}", data_dir.display());
            } else {
                println!("  - Create data directory: {}", data_dir.display());
            }

            let db_path = data_dir.join(DATABASE_FILE_NAME);
            if !db_path.exists() {
                println!("  - Create store: {}", db_path.display());
            } else if self.overwrite {
                println!("  - Replace existing store: {}", db_path.display());
            } else {
                println!(
                    "  - ERROR: Store already exists (use --overwrite to replace): {}",
                    db_path.display()
                );
            }

            if self.with_config {
                let config_path = data_dir.join(CONFIG_FILE_NAME);
                if config_path.exists() {
                    println!(
                        "  - Configuration file already exists (will not overwrite): {}",
                        config_path.display()
                    );
                } else {
                    println!("  - Create configuration file: {}", config_path.display());
                }
            }

            return Ok(());
        }

        let options = InitOptions::new(data_dir)
            .with_overwrite(self.overwrite)
            .with_create_config(self.with_config);
        let result = init_database(&options)?;

        if global.quiet {
            return Ok(());
        }

        println!("Initialized holdfast in: {}", result.data_dir.display());
        if result.data_dir_created {
            println!("  - Created data directory");
        }
        if result.database_created {
            if self.overwrite {
                println!("  - Recreated store");
            } else {
                println!("  - Created store");
            }
        }
        if result.config_created {
            println!("  - Created default configuration file");
        } else if self.with_config {
            println!("  - Configuration file already exists (not overwritten)");
        }

        Ok(())
    }
}
