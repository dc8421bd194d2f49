//! Build script for holdfast-cli.
//!
//! Generates the `holdfast.1` man page into OUT_DIR with clap_mangen.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! tree is restated here. Keep it in sync with src/cli.rs.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("holdfast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reserve rooms, seats and delivery slots without overselling")
        .long_about(
            "Operator tool for the holdfast reservation engine: provision inventory, \
             create and confirm reservations, and run the expiration sweep and rollover",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("HOLDFAST_DATA_DIR"),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the maximum lock wait (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("HOLDFAST_BUSY_TIMEOUT"),
        )
        .arg(
            Arg::new("disable-autoinit")
                .long("disable-autoinit")
                .help("Fail instead of creating a missing store")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .env("HOLDFAST_DISABLE_AUTOINIT"),
        )
        .subcommands(vec![
            Command::new("init").about("Initialize the data directory and store"),
            Command::new("unit")
                .about("Manage room types and delivery slots")
                .long_about(
                    "Add units to the catalog, materialize dates, and open or close single dates",
                ),
            Command::new("seats").about("Manage the seats of a trip"),
            Command::new("availability").about("Show per-date availability of a unit"),
            Command::new("reserve")
                .about("Create a PENDING reservation")
                .long_about(
                    "Hold inventory for a room, delivery slot or set of seats \
                     and print the reservation id",
                ),
            Command::new("confirm").about("Confirm a reservation against a settled payment"),
            Command::new("cancel").about("Cancel a PENDING reservation"),
            Command::new("show").about("Show one reservation and its holds"),
            Command::new("list").about("List reservations"),
            Command::new("payment")
                .about("Record and update merchant payments")
                .long_about(
                    "Record, settle, fail, or refund payments in the store-backed payment ledger",
                ),
            Command::new("refund").about("Apply a recorded refund to a confirmed reservation"),
            Command::new("sweep").about("Expire reservations whose hold timed out"),
            Command::new("rollover").about("Roll the dated inventory window forward"),
            Command::new("serve")
                .about("Run the expiration sweep and the rollover in the foreground"),
            Command::new("completions").about("Generate shell completion scripts"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR is not set")
    })?);
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let mut buffer = Vec::new();
    Man::new(build_cli()).render(&mut buffer)?;
    fs::write(man_dir.join("holdfast.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
