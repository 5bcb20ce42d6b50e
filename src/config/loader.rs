//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the signing secret so it never has to live in the file.
pub const ENV_JWT_SECRET: &str = "WELLNESS_JWT_SECRET";
/// Overrides the frontend URL used in reset links.
pub const ENV_FRONTEND_URL: &str = "WELLNESS_FRONTEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

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

/// Load, apply environment overrides and validate a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GateConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, validated. Used when no file is given.
pub fn load_defaults() -> Result<GateConfig, ConfigError> {
    let mut config = GateConfig::default();
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GateConfig) {
    if let Ok(secret) = std::env::var(ENV_JWT_SECRET) {
        if !secret.is_empty() {
            config.auth.jwt_secret = secret;
        }
    }
    if let Ok(url) = std::env::var(ENV_FRONTEND_URL) {
        if !url.is_empty() {
            config.password_reset.frontend_url = url;
        }
    }
}
