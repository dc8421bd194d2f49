//! Configuration schema definitions.
//!
//! Every field is optional so that partial files and environment overrides
//! can be layered; the accessor methods on [`Config`] fill in defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// PENDING age, in seconds, after which the sweep expires a reservation.
pub const DEFAULT_HOLD_TIMEOUT_SECONDS: u64 = 300;

/// Seconds between two expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Days ahead of today that rollover keeps materialized.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Hours between two rollover runs.
pub const DEFAULT_ROLLOVER_INTERVAL_HOURS: u64 = 24;

/// Seconds a writer waits for the store's write lock.
pub const DEFAULT_LOCK_WAIT_SECONDS: u64 = 5;

/// Longest booking horizon accepted.
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use holdfast::config::{Config, RolloverConfig};
///
/// let config = Config {
///     hold_timeout_seconds: Some(600),
///     rollover: Some(RolloverConfig {
///         horizon_days: Some(90),
///         interval_hours: None,
///     }),
///     ..Default::default()
/// };
/// assert_eq!(config.hold_timeout(), Duration::from_secs(600));
/// assert_eq!(config.horizon_days(), 90);
/// assert_eq!(config.rollover_interval(), Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Age of a PENDING reservation, in seconds, before the sweep expires it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_timeout_seconds: Option<u64>,

    /// Seconds between expiration sweeps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_interval_seconds: Option<u64>,

    /// Inventory rollover settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollover: Option<RolloverConfig>,

    /// Maximum time to wait for database lock acquisition (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_lock_wait_seconds: Option<u64>,

    /// Output format for list commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

impl Config {
    /// Returns the configured hold timeout or the default.
    #[must_use]
    pub fn hold_timeout(&self) -> Duration {
        Duration::from_secs(
            self.hold_timeout_seconds
                .unwrap_or(DEFAULT_HOLD_TIMEOUT_SECONDS),
        )
    }

    /// Returns the configured sweep interval or the default.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_seconds
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECONDS),
        )
    }

    /// Returns the configured horizon or the default.
    #[must_use]
    pub fn horizon_days(&self) -> u32 {
        self.rollover
            .as_ref()
            .and_then(|r| r.horizon_days)
            .unwrap_or(DEFAULT_HORIZON_DAYS)
    }

    /// Returns the configured rollover interval or the default.
    #[must_use]
    pub fn rollover_interval(&self) -> Duration {
        let hours = self
            .rollover
            .as_ref()
            .and_then(|r| r.interval_hours)
            .unwrap_or(DEFAULT_ROLLOVER_INTERVAL_HOURS);
        Duration::from_secs(hours.saturating_mul(3600))
    }

    /// Returns the configured lock wait or the default.
    #[must_use]
    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(
            self.maximum_lock_wait_seconds
                .unwrap_or(DEFAULT_LOCK_WAIT_SECONDS),
        )
    }

    /// Returns the configured output format or [`OutputFormat::Human`].
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }
}

/// Inventory rollover configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RolloverConfig {
    /// Days ahead of today kept materialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_days: Option<u32>,

    /// Hours between rollover runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u64>,
}

/// Output format for list commands.
///
/// # Examples
///
/// ```
/// use holdfast::config::OutputFormat;
///
/// let format = OutputFormat::Json;
/// assert_eq!(format.to_string(), "json");
/// ```
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Human,
    /// JSON output format.
    Json,
    /// CSV output format.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}
