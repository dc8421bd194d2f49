//! CLI command implementations.
//!
//! One module per command:
//! - `init`: create the data directory and store
//! - `unit`, `seats`: provision inventory
//! - `availability`, `list`, `show`: read inventory and reservations
//! - `reserve`, `confirm`, `cancel`, `refund`: the reservation lifecycle
//! - `payment`: the store-backed payment ledger
//! - `sweep`, `rollover`, `serve`: the periodic jobs, once or on a schedule
//! - `completions`: shell completion scripts

pub mod availability;
pub mod cancel;
pub mod completions;
pub mod confirm;
pub mod init;
pub mod list;
pub mod payment;
pub mod refund;
pub mod reserve;
pub mod rollover;
pub mod seats;
pub mod serve;
pub mod show;
pub mod sweep;
pub mod unit;

pub use availability::AvailabilityCommand;
pub use cancel::CancelCommand;
pub use completions::CompletionsCommand;
pub use confirm::ConfirmCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use payment::PaymentCommand;
pub use refund::RefundCommand;
pub use reserve::ReserveCommand;
pub use rollover::RolloverCommand;
pub use seats::SeatsCommand;
pub use serve::ServeCommand;
pub use show::ShowCommand;
pub use sweep::SweepCommand;
pub use unit::UnitCommand;
