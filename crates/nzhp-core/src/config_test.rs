use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn build_with(pairs: &[(&'static str, &'static str)]) -> Result<AppConfig, ConfigError> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    build_app_config(lookup_from_map(&map))
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "NZHP_ENV"));
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let config = build_with(&[]).unwrap();
    assert_eq!(config.env, Environment::Development);
    assert_eq!(config.log_level, "info");
    assert_eq!(
        config.targets_path,
        std::path::PathBuf::from("./config/targets.yaml")
    );
    assert!(config.selectors_path.is_none());
    assert!(!config.validate_prices);
    assert!(config.enable_logging);
    assert_eq!(config.min_delay_ms, 2000);
    assert_eq!(config.max_delay_ms, 5000);
    assert_eq!(config.retry_max_attempts, 3);
    assert_eq!(config.retry_base_delay_ms, 1000);
    assert_eq!(config.retry_max_delay_ms, 60_000);
    assert!((config.retry_backoff_factor - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.page_load_timeout_secs, 20);
    assert_eq!(config.strategy_timeout_ms, 5000);
    assert_eq!(config.max_concurrent_sites, 1);
    assert!(config.batch_budget_secs.is_none());
    assert!((config.url_confidence_threshold - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.location_match_threshold, 70);
    assert_eq!(config.simulation_draws, 10_000);
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
}

#[test]
fn build_app_config_reads_overrides() {
    let config = build_with(&[
        ("NZHP_ENV", "production"),
        ("NZHP_VALIDATE_PRICES", "true"),
        ("NZHP_ENABLE_LOGGING", "0"),
        ("NZHP_MIN_DELAY_MS", "100"),
        ("NZHP_MAX_DELAY_MS", "200"),
        ("NZHP_MAX_CONCURRENT_SITES", "5"),
        ("NZHP_BATCH_BUDGET_SECS", "90"),
        ("NZHP_SELECTORS_PATH", "/etc/nzhp/selectors.yaml"),
    ])
    .unwrap();
    assert_eq!(config.env, Environment::Production);
    assert!(config.validate_prices);
    assert!(!config.enable_logging);
    assert_eq!(config.min_delay(), std::time::Duration::from_millis(100));
    assert_eq!(config.max_concurrent_sites, 5);
    assert_eq!(
        config.batch_budget(),
        Some(std::time::Duration::from_secs(90))
    );
    assert_eq!(
        config.selectors_path,
        Some(std::path::PathBuf::from("/etc/nzhp/selectors.yaml"))
    );
}

#[test]
fn build_app_config_rejects_inverted_delay_window() {
    let result = build_with(&[("NZHP_MIN_DELAY_MS", "6000"), ("NZHP_MAX_DELAY_MS", "5000")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_MIN_DELAY_MS"),
        "expected InvalidEnvVar(NZHP_MIN_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_accepts_equal_delays() {
    let config = build_with(&[("NZHP_MIN_DELAY_MS", "3000"), ("NZHP_MAX_DELAY_MS", "3000")]).unwrap();
    assert_eq!(config.min_delay(), config.max_delay());
}

#[test]
fn build_app_config_rejects_non_numeric_delay() {
    let result = build_with(&[("NZHP_MAX_DELAY_MS", "soon")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_MAX_DELAY_MS")
    );
}

#[test]
fn build_app_config_rejects_confidence_threshold_above_one() {
    let result = build_with(&[("NZHP_URL_CONFIDENCE_THRESHOLD", "1.5")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_URL_CONFIDENCE_THRESHOLD"
    ));
}

#[test]
fn build_app_config_rejects_location_threshold_above_hundred() {
    let result = build_with(&[("NZHP_LOCATION_MATCH_THRESHOLD", "101")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_LOCATION_MATCH_THRESHOLD"
    ));
}

#[test]
fn build_app_config_rejects_zero_retry_attempts() {
    let result = build_with(&[("NZHP_RETRY_MAX_ATTEMPTS", "0")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_RETRY_MAX_ATTEMPTS"
    ));
}

#[test]
fn build_app_config_rejects_backoff_factor_below_one() {
    let result = build_with(&[("NZHP_RETRY_BACKOFF_FACTOR", "0.5")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_RETRY_BACKOFF_FACTOR"
    ));
}

#[test]
fn build_app_config_rejects_unknown_flag_value() {
    let result = build_with(&[("NZHP_VALIDATE_PRICES", "maybe")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NZHP_VALIDATE_PRICES"
    ));
}

#[test]
fn blank_selectors_path_is_treated_as_unset() {
    let config = build_with(&[("NZHP_SELECTORS_PATH", "  ")]).unwrap();
    assert!(config.selectors_path.is_none());
}
