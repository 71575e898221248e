use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load run configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load run configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build run configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got '{raw}'"))
            }),
        }
    };

    let env = parse_environment(&or_default("NZHP_ENV", "development"))?;
    let log_level = or_default("NZHP_LOG_LEVEL", "info");
    let targets_path = PathBuf::from(or_default("NZHP_TARGETS_PATH", "./config/targets.yaml"));
    let selectors_path = lookup("NZHP_SELECTORS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let validate_prices = parse_bool("NZHP_VALIDATE_PRICES", false)?;
    let enable_logging = parse_bool("NZHP_ENABLE_LOGGING", true)?;

    let min_delay_ms = parse_u64("NZHP_MIN_DELAY_MS", "2000")?;
    let max_delay_ms = parse_u64("NZHP_MAX_DELAY_MS", "5000")?;
    if min_delay_ms > max_delay_ms {
        return Err(invalid(
            "NZHP_MIN_DELAY_MS",
            format!("min delay {min_delay_ms}ms exceeds max delay {max_delay_ms}ms"),
        ));
    }

    let retry_max_attempts = parse_u32("NZHP_RETRY_MAX_ATTEMPTS", "3")?;
    if retry_max_attempts == 0 {
        return Err(invalid(
            "NZHP_RETRY_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_base_delay_ms = parse_u64("NZHP_RETRY_BASE_DELAY_MS", "1000")?;
    let retry_max_delay_ms = parse_u64("NZHP_RETRY_MAX_DELAY_MS", "60000")?;
    let retry_backoff_factor = parse_f64("NZHP_RETRY_BACKOFF_FACTOR", "2.0")?;
    if retry_backoff_factor < 1.0 {
        return Err(invalid(
            "NZHP_RETRY_BACKOFF_FACTOR",
            format!("backoff factor {retry_backoff_factor} must be >= 1.0"),
        ));
    }

    let page_load_timeout_secs = parse_u64("NZHP_PAGE_LOAD_TIMEOUT_SECS", "20")?;
    let strategy_timeout_ms = parse_u64("NZHP_STRATEGY_TIMEOUT_MS", "5000")?;
    let max_concurrent_sites = parse_usize("NZHP_MAX_CONCURRENT_SITES", "1")?;

    let batch_budget_secs = match lookup("NZHP_BATCH_BUDGET_SECS") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("NZHP_BATCH_BUDGET_SECS", e.to_string()))?,
        ),
        _ => None,
    };

    let url_confidence_threshold = parse_f64("NZHP_URL_CONFIDENCE_THRESHOLD", "0.5")?;
    if !(0.0..=1.0).contains(&url_confidence_threshold) {
        return Err(invalid(
            "NZHP_URL_CONFIDENCE_THRESHOLD",
            format!("{url_confidence_threshold} is outside [0, 1]"),
        ));
    }

    let location_match_threshold = or_default("NZHP_LOCATION_MATCH_THRESHOLD", "70")
        .parse::<u8>()
        .map_err(|e| invalid("NZHP_LOCATION_MATCH_THRESHOLD", e.to_string()))?;
    if location_match_threshold > 100 {
        return Err(invalid(
            "NZHP_LOCATION_MATCH_THRESHOLD",
            format!("{location_match_threshold} is outside [0, 100]"),
        ));
    }

    let simulation_draws = parse_usize("NZHP_SIMULATION_DRAWS", "10000")?;
    if simulation_draws == 0 {
        return Err(invalid(
            "NZHP_SIMULATION_DRAWS",
            "must be at least 1".to_string(),
        ));
    }

    let user_agent = or_default("NZHP_USER_AGENT", DEFAULT_USER_AGENT);

    Ok(AppConfig {
        env,
        log_level,
        targets_path,
        selectors_path,
        validate_prices,
        enable_logging,
        min_delay_ms,
        max_delay_ms,
        retry_max_attempts,
        retry_base_delay_ms,
        retry_max_delay_ms,
        retry_backoff_factor,
        page_load_timeout_secs,
        strategy_timeout_ms,
        max_concurrent_sites,
        batch_budget_secs,
        url_confidence_threshold,
        location_match_threshold,
        simulation_draws,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NZHP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
