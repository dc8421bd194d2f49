//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::{Config, RolloverConfig};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use holdfast::config::{Config, ConfigMerger};
///
/// let low = Config { hold_timeout_seconds: Some(300), ..Default::default() };
/// let high = Config { hold_timeout_seconds: Some(60), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.hold_timeout_seconds, Some(60));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();

        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }

        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// Scalar fields are overwritten when set in `source`; the nested
    /// rollover section is merged field by field.
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.hold_timeout_seconds.is_some() {
            target.hold_timeout_seconds = source.hold_timeout_seconds;
        }

        if source.sweep_interval_seconds.is_some() {
            target.sweep_interval_seconds = source.sweep_interval_seconds;
        }

        if source.maximum_lock_wait_seconds.is_some() {
            target.maximum_lock_wait_seconds = source.maximum_lock_wait_seconds;
        }

        if source.output_format.is_some() {
            target.output_format = source.output_format;
        }

        if let Some(ref source_rollover) = source.rollover {
            target.rollover = Some(match &target.rollover {
                Some(target_rollover) => Self::merge_rollover(target_rollover, source_rollover),
                None => source_rollover.clone(),
            });
        }
    }

    fn merge_rollover(target: &RolloverConfig, source: &RolloverConfig) -> RolloverConfig {
        RolloverConfig {
            horizon_days: source.horizon_days.or(target.horizon_days),
            interval_hours: source.interval_hours.or(target.interval_hours),
        }
    }
}
