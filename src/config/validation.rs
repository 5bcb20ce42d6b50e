//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs, windows and limits > 0)
//! - Check the signing secret is strong enough for HS256
//! - Compile every route pattern once so typos fail at load time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::security::AuthorizationPolicy;

/// HS256 keys shorter than the hash output weaken the MAC.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.len() < MIN_SECRET_BYTES {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            format!("must be at least {} bytes", MIN_SECRET_BYTES),
        ));
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.token_ttl_secs", "must be greater than 0"));
    }

    let rl = &config.rate_limit;
    if rl.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if rl.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    }
    if rl.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_interval_secs", "must be greater than 0"));
    }
    if rl.route_prefixes.iter().any(|p| !p.starts_with('/')) {
        errors.push(ValidationError::new("rate_limit.route_prefixes", "prefixes must start with '/'"));
    }

    if let Err(e) = AuthorizationPolicy::from_config(&config.authorization) {
        errors.push(ValidationError::new("authorization", e.to_string()));
    }

    let reset = &config.password_reset;
    if reset.frontend_url.trim().is_empty() {
        errors.push(ValidationError::new("password_reset.frontend_url", "must not be empty"));
    }
    if reset.token_ttl_secs == 0 {
        errors.push(ValidationError::new("password_reset.token_ttl_secs", "must be greater than 0"));
    }
    if reset.purge_interval_secs == 0 {
        errors.push(ValidationError::new("password_reset.purge_interval_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
