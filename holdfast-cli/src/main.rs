//! Main entry point for the holdfast CLI.
//!
//! This is the operator interface to the holdfast reservation engine:
//! - `unit`, `seats`: provision rooms, delivery slots and seats
//! - `reserve`, `confirm`, `cancel`, `refund`: drive reservations
//! - `payment`: record payments the way a provider callback would
//! - `sweep`, `rollover`, `serve`: run the periodic jobs

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let _logger = holdfast::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
        busy_timeout: cli.busy_timeout,
        disable_autoinit: cli.disable_autoinit,
    };

    let result = match cli.command {
        cli::Command::Init(cmd) => cmd.execute(&global),
        cli::Command::Unit(cmd) => cmd.execute(&global),
        cli::Command::Seats(cmd) => cmd.execute(&global),
        cli::Command::Availability(cmd) => cmd.execute(&global),
        cli::Command::Reserve(cmd) => cmd.execute(&global),
        cli::Command::Confirm(cmd) => cmd.execute(&global),
        cli::Command::Cancel(cmd) => cmd.execute(&global),
        cli::Command::Show(cmd) => cmd.execute(&global),
        cli::Command::List(cmd) => cmd.execute(&global),
        cli::Command::Payment(cmd) => cmd.execute(&global),
        cli::Command::Refund(cmd) => cmd.execute(&global),
        cli::Command::Sweep(cmd) => cmd.execute(&global),
        cli::Command::Rollover(cmd) => cmd.execute(&global),
        cli::Command::Serve(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
