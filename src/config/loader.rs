//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{LogFormat, Mode, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Env { key: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment.
///
/// If `CONFIG_PATH` is set the file is read first and environment
/// variables override it.
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment.
pub fn load_with<F>(lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let mut config = match lookup(CONFIG_PATH_ENV) {
        Some(path) => read_toml(Path::new(&path))?,
        None => RelayConfig::default(),
    };
    apply_env_overrides(&mut config, &lookup)?;
    finish(config)
}

fn read_toml(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn finish(mut config: RelayConfig) -> Result<RelayConfig, ConfigError> {
    if config.mock.base_dir.is_none() {
        config.mock.base_dir = Some(std::env::current_dir()?);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MODE") {
        config.mode = parse_value::<Mode>("MODE", &v)?;
    }
    if let Some(v) = lookup("MODEL_URL") {
        config.live.model_url = Some(v.trim().to_string());
    }
    if let Some(v) = lookup("MOCK_IMAGE_PATH") {
        config.mock.image_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("HOST") {
        config.listener.host = v.trim().to_string();
    }
    if let Some(v) = lookup("PORT") {
        config.listener.port = parse_value("PORT", &v)?;
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
        config.live.request_timeout_secs = parse_value("REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = lookup("REQUEST_SLACK_SECS") {
        config.live.request_slack_secs = parse_value("REQUEST_SLACK_SECS", &v)?;
    }
    if let Some(v) = lookup("MAX_RESPONSE_BYTES") {
        config.live.max_response_bytes = parse_value("MAX_RESPONSE_BYTES", &v)?;
    }
    if let Some(v) = lookup("MAX_UPLOAD_BYTES") {
        config.uploads.max_body_bytes = parse_value("MAX_UPLOAD_BYTES", &v)?;
    }
    if let Some(v) = lookup("UPLOAD_DIR") {
        config.uploads.dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = v
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v.trim().to_string();
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = parse_value::<LogFormat>("LOG_FORMAT", &v)?;
    }
    if let Some(v) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(v.trim().to_string());
    }
    Ok(())
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Env {
        key,
        message: e.to_string(),
    })
}
