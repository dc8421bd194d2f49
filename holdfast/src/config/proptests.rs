//! Property-based tests for configuration system.

use super::merger::ConfigMerger;
use super::schema::{Config, OutputFormat, RolloverConfig};
use super::validator::ConfigValidator;
use proptest::prelude::*;

fn output_format_strategy() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![
        Just(OutputFormat::Human),
        Just(OutputFormat::Json),
        Just(OutputFormat::Csv),
    ]
}

fn rollover_strategy() -> impl Strategy<Value = RolloverConfig> {
    (
        prop::option::of(0u32..=400),
        prop::option::of(0u64..=48),
    )
        .prop_map(|(horizon_days, interval_hours)| RolloverConfig {
            horizon_days,
            interval_hours,
        })
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of(0u64..=3600),
        prop::option::of(0u64..=600),
        prop::option::of(rollover_strategy()),
        prop::option::of(0u64..=60),
        prop::option::of(output_format_strategy()),
    )
        .prop_map(|(hold, sweep, rollover, lock, format)| Config {
            hold_timeout_seconds: hold,
            sweep_interval_seconds: sweep,
            rollover,
            maximum_lock_wait_seconds: lock,
            output_format: format,
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Every field set in the higher layer wins; unset fields fall through
    #[test]
    fn config_merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut result = low.clone();
        ConfigMerger::merge_into(&mut result, &high);

        prop_assert_eq!(
            result.hold_timeout_seconds,
            high.hold_timeout_seconds.or(low.hold_timeout_seconds)
        );
        prop_assert_eq!(
            result.sweep_interval_seconds,
            high.sweep_interval_seconds.or(low.sweep_interval_seconds)
        );
        prop_assert_eq!(
            result.maximum_lock_wait_seconds,
            high.maximum_lock_wait_seconds.or(low.maximum_lock_wait_seconds)
        );
        prop_assert_eq!(result.output_format, high.output_format.or(low.output_format));

        let horizon = |c: &Config| c.rollover.as_ref().and_then(|r| r.horizon_days);
        prop_assert_eq!(horizon(&result), horizon(&high).or(horizon(&low)));
    }

    // Merging a config into itself changes nothing
    #[test]
    fn config_merge_idempotent(config in config_strategy()) {
        let mut result = config.clone();
        ConfigMerger::merge_into(&mut result, &config);
        prop_assert_eq!(result, config);
    }

    // Merging an empty config is the identity
    #[test]
    fn config_merge_empty_identity(config in config_strategy()) {
        let mut result = config.clone();
        ConfigMerger::merge_into(&mut result, &Config::default());
        prop_assert_eq!(result, config);
    }

    // Validation accepts exactly the configs with no zero values and a horizon in range
    #[test]
    fn config_validation_matches_rules(config in config_strategy()) {
        let rollover = config.rollover.clone().unwrap_or_default();
        let expected_ok = config.hold_timeout_seconds != Some(0)
            && config.sweep_interval_seconds != Some(0)
            && config.maximum_lock_wait_seconds != Some(0)
            && rollover.interval_hours != Some(0)
            && rollover.horizon_days.map_or(true, |d| (1..=365).contains(&d));
        prop_assert_eq!(ConfigValidator::validate(&config).is_ok(), expected_ok);
    }
}
