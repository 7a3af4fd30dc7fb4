//! Configuration loading from disk and the environment.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(".env error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Invalid value for {key}: '{value}'")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, `.env` and the process
/// environment, then validate it.
///
/// Environment variables win over the file; the file wins over defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    check_dotenv(dotenvy::dotenv())?;

    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// A missing `.env` is the normal case outside development; anything else
/// (unreadable or malformed file) is an error.
fn check_dotenv<T>(result: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match result {
        Err(e) if !e.not_found() => Err(ConfigError::Dotenv(e)),
        _ => Ok(()),
    }
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Keys are matched upper-case first, then lower-case, so `DATABASE_URL` and
/// `database_url` are both accepted.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .or_else(|| lookup(&key.to_lowercase()))
            .filter(|value| !value.trim().is_empty())
    };

    if let Some(url) = get("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(address) = get("BIND_ADDRESS") {
        config.listener.bind_address = address;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(directory) = get("LOG_DIR") {
        config.logging.directory = directory;
    }
    if let Some(address) = get("METRICS_ADDRESS") {
        config.metrics.bind_address = address;
    }
    if let Some(enabled) = get("METRICS_ENABLED") {
        config.metrics.enabled = parse_bool("METRICS_ENABLED", &enabled)?;
    }

    Ok(())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key,
            value: value.to_string(),
        }),
    }
}
