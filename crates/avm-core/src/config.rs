use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
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
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

    let env = parse_environment(&or_default("AVM_ENV", "development"))?;
    let log_level = or_default("AVM_LOG_LEVEL", "info");

    let brands_path = PathBuf::from(or_default("AVM_BRANDS_PATH", "./config/brands.yaml"));
    let prompts_path = PathBuf::from(or_default("AVM_PROMPTS_PATH", "./config/prompts.yaml"));
    let platforms_path =
        PathBuf::from(or_default("AVM_PLATFORMS_PATH", "./config/platforms.yaml"));
    let lexicon_path = lookup("AVM_LEXICON_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let db_max_connections = parse_u32("AVM_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("AVM_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AVM_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "AVM_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    let source_request_timeout_secs = parse_u64("AVM_SOURCE_REQUEST_TIMEOUT_SECS", "60")?;
    let source_user_agent = or_default("AVM_SOURCE_USER_AGENT", "avm/0.1 (answer-visibility)");
    let source_max_concurrent = parse_usize("AVM_SOURCE_MAX_CONCURRENT", "4")?;
    let source_max_retries = parse_u32("AVM_SOURCE_MAX_RETRIES", "2")?;
    let source_retry_backoff_base_ms = parse_u64("AVM_SOURCE_RETRY_BACKOFF_BASE_MS", "1000")?;

    if source_max_concurrent == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "AVM_SOURCE_MAX_CONCURRENT".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        brands_path,
        prompts_path,
        platforms_path,
        lexicon_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        source_request_timeout_secs,
        source_user_agent,
        source_max_concurrent,
        source_max_retries,
        source_retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AVM_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
