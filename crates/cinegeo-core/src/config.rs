use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::zone::ReferenceZone;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_value::<usize>(var, &or_default(var, default))
    };

    let env = parse_environment(&or_default("CINEGEO_ENV", "development"))?;
    let log_level = or_default("CINEGEO_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default("CINEGEO_SOURCES_PATH", "./config/sources.yaml"));
    let position_log_path =
        PathBuf::from(or_default("CINEGEO_POSITION_LOG_PATH", "./locations.json"));

    let request_timeout_secs = parse("CINEGEO_REQUEST_TIMEOUT_SECS", "25")?;
    if request_timeout_secs == 0 {
        return Err(invalid("CINEGEO_REQUEST_TIMEOUT_SECS", "must be at least 1"));
    }
    let user_agent = or_default("CINEGEO_USER_AGENT", "cinegeo/0.1 (poi-lookup)");

    let radius_cap_km = parse_value::<f64>(
        "CINEGEO_RADIUS_CAP_KM",
        &or_default("CINEGEO_RADIUS_CAP_KM", "100"),
    )?;
    if !radius_cap_km.is_finite() || radius_cap_km < 1.0 {
        return Err(invalid(
            "CINEGEO_RADIUS_CAP_KM",
            "must be a finite number of kilometres >= 1",
        ));
    }

    let default_max_results = parse_usize("CINEGEO_DEFAULT_MAX_RESULTS", "50")?;
    let max_results_ceiling = parse_usize("CINEGEO_MAX_RESULTS_CEILING", "200")?;
    if max_results_ceiling == 0 || default_max_results == 0 {
        return Err(invalid(
            "CINEGEO_DEFAULT_MAX_RESULTS",
            "result limits must be at least 1",
        ));
    }
    if default_max_results > max_results_ceiling {
        return Err(invalid(
            "CINEGEO_DEFAULT_MAX_RESULTS",
            &format!("must not exceed CINEGEO_MAX_RESULTS_CEILING ({max_results_ceiling})"),
        ));
    }

    let enrich_limit = parse_usize("CINEGEO_ENRICH_LIMIT", "10")?;
    let enrich_max_concurrent = parse_usize("CINEGEO_ENRICH_MAX_CONCURRENT", "4")?;
    let match_threshold = parse_value::<u32>(
        "CINEGEO_MATCH_THRESHOLD",
        &or_default("CINEGEO_MATCH_THRESHOLD", "2"),
    )?;

    let region_cache_capacity = parse("CINEGEO_REGION_CACHE_CAPACITY", "10000")?;
    let region_cache_precision = parse_value::<u32>(
        "CINEGEO_REGION_CACHE_PRECISION",
        &or_default("CINEGEO_REGION_CACHE_PRECISION", "3"),
    )?;
    if region_cache_precision > 6 {
        return Err(invalid(
            "CINEGEO_REGION_CACHE_PRECISION",
            "must be between 0 and 6 decimal places",
        ));
    }
    let catalog_cache_capacity = parse("CINEGEO_CATALOG_CACHE_CAPACITY", "256")?;
    let cache_ttl_secs = parse("CINEGEO_CACHE_TTL_SECS", "0")?;

    let reference_zone = ReferenceZone::from_str(&or_default("CINEGEO_REFERENCE_TZ", "Europe/Paris"))
        .map_err(|reason| invalid("CINEGEO_REFERENCE_TZ", &reason))?;

    Ok(AppConfig {
        env,
        log_level,
        sources_path,
        position_log_path,
        request_timeout_secs,
        user_agent,
        radius_cap_km,
        default_max_results,
        max_results_ceiling,
        enrich_limit,
        enrich_max_concurrent,
        match_threshold,
        region_cache_capacity,
        region_cache_precision,
        catalog_cache_capacity,
        cache_ttl_secs,
        reference_zone,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(var, &e.to_string()))
}

fn invalid(var: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "CINEGEO_ENV",
            &format!("unknown environment '{other}'; expected development, test or production"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
