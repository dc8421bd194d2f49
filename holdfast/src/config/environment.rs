//! Environment variable handling for configuration overrides.
//!
//! This module provides support for `HOLDFAST_*` environment variables that
//! override configuration file values.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;

/// Overrides `hold_timeout_seconds`.
pub const HOLD_TIMEOUT_ENV: &str = "HOLDFAST_HOLD_TIMEOUT_SECONDS";
/// Overrides `sweep_interval_seconds`.
pub const SWEEP_INTERVAL_ENV: &str = "HOLDFAST_SWEEP_INTERVAL_SECONDS";
/// Overrides `rollover.horizon_days`.
pub const HORIZON_DAYS_ENV: &str = "HOLDFAST_ROLLOVER_HORIZON_DAYS";
/// Overrides `maximum_lock_wait_seconds`.
pub const LOCK_WAIT_ENV: &str = "HOLDFAST_MAXIMUM_LOCK_WAIT_SECONDS";
/// Overrides `output_format`.
pub const OUTPUT_FORMAT_ENV: &str = "HOLDFAST_OUTPUT_FORMAT";

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use holdfast::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// Reads all `HOLDFAST_*` configuration variables and applies them with
    /// higher precedence than file-based configs.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., a non-numeric timeout or an unknown output format).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(val) = env::var(HOLD_TIMEOUT_ENV) {
            config.hold_timeout_seconds = Some(Self::parse_number(HOLD_TIMEOUT_ENV, &val)?);
        }

        if let Ok(val) = env::var(SWEEP_INTERVAL_ENV) {
            config.sweep_interval_seconds = Some(Self::parse_number(SWEEP_INTERVAL_ENV, &val)?);
        }

        if let Ok(val) = env::var(HORIZON_DAYS_ENV) {
            let rollover = config.rollover.get_or_insert_with(Default::default);
            rollover.horizon_days = Some(Self::parse_number(HORIZON_DAYS_ENV, &val)?);
        }

        if let Ok(val) = env::var(LOCK_WAIT_ENV) {
            config.maximum_lock_wait_seconds = Some(Self::parse_number(LOCK_WAIT_ENV, &val)?);
        }

        if let Ok(val) = env::var(OUTPUT_FORMAT_ENV) {
            config.output_format = Some(val.trim().parse().map_err(|message| Error::Validation {
                field: OUTPUT_FORMAT_ENV.into(),
                message,
            })?);
        }

        Ok(())
    }

    fn parse_number<T: FromStr>(field: &str, s: &str) -> Result<T> {
        s.trim().parse().map_err(|_| Error::Validation {
            field: field.into(),
            message: format!("Must be a non-negative integer, got '{s}'"),
        })
    }
}
