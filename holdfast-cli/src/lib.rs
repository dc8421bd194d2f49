//! Library exports for holdfast-cli.
//!
//! Exposes the CLI definition so benches and documentation tooling can
//! build the command tree without spawning the binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
