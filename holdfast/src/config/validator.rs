//! Configuration validation.

use crate::config::schema::{Config, RolloverConfig, MAX_HORIZON_DAYS};
use crate::error::{Error, Result};

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use holdfast::config::{Config, ConfigValidator};
///
/// ConfigValidator::validate(&Config::default()).unwrap();
///
/// let bad = Config { sweep_interval_seconds: Some(0), ..Default::default() };
/// assert!(ConfigValidator::validate(&bad).is_err());
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field: a zero
    /// timeout or interval, or a horizon outside `1..=365` days.
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_positive("hold_timeout_seconds", config.hold_timeout_seconds)?;
        Self::validate_positive("sweep_interval_seconds", config.sweep_interval_seconds)?;
        Self::validate_positive("maximum_lock_wait_seconds", config.maximum_lock_wait_seconds)?;

        if let Some(ref rollover) = config.rollover {
            Self::validate_rollover(rollover)?;
        }

        Ok(())
    }

    fn validate_positive(field: &str, value: Option<u64>) -> Result<()> {
        if value == Some(0) {
            return Err(Error::Validation {
                field: field.into(),
                message: "Must be greater than 0".into(),
            });
        }
        Ok(())
    }

    fn validate_rollover(rollover: &RolloverConfig) -> Result<()> {
        if let Some(days) = rollover.horizon_days {
            if !(1..=MAX_HORIZON_DAYS).contains(&days) {
                return Err(Error::Validation {
                    field: "rollover.horizon_days".into(),
                    message: format!("Must be between 1 and {MAX_HORIZON_DAYS}, got {days}"),
                });
            }
        }
        Self::validate_positive("rollover.interval_hours", rollover.interval_hours)
    }
}
