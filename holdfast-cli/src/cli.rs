//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    AvailabilityCommand, CancelCommand, CompletionsCommand, ConfirmCommand, InitCommand,
    ListCommand, PaymentCommand, RefundCommand, ReserveCommand, RolloverCommand, SeatsCommand,
    ServeCommand, ShowCommand, SweepCommand, UnitCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator tool for the holdfast reservation engine.
#[derive(Parser)]
#[command(name = "holdfast")]
#[command(
    version,
    about = "Reserve rooms, seats and delivery slots without overselling",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "HOLDFAST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the maximum lock wait (in seconds)
    #[arg(long, value_name = "SECONDS", global = true, env = "HOLDFAST_BUSY_TIMEOUT")]
    pub busy_timeout: Option<u32>,

    /// Fail instead of creating a missing store
    #[arg(long, global = true, env = "HOLDFAST_DISABLE_AUTOINIT")]
    pub disable_autoinit: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory and store
    Init(InitCommand),

    /// Manage room types and delivery slots
    Unit(UnitCommand),

    /// Manage the seats of a trip
    Seats(SeatsCommand),

    /// Show per-date availability of a unit
    Availability(AvailabilityCommand),

    /// Create a PENDING reservation
    Reserve(ReserveCommand),

    /// Confirm a reservation against a settled payment
    Confirm(ConfirmCommand),

    /// Cancel a PENDING reservation
    Cancel(CancelCommand),

    /// Show one reservation and its holds
    Show(ShowCommand),

    /// List reservations
    List(ListCommand),

    /// Record and update merchant payments
    Payment(PaymentCommand),

    /// Apply a recorded refund to a confirmed reservation
    Refund(RefundCommand),

    /// Expire reservations whose hold timed out
    Sweep(SweepCommand),

    /// Roll the dated inventory window forward
    Rollover(RolloverCommand),

    /// Run the expiration sweep and the rollover in the foreground
    Serve(ServeCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
