//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Placeholder secret shipped in the defaults. Startup warns when it is in use.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION_0123456789abcdef";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token signing and lifetime.
    pub auth: AuthConfig,

    /// Rate limiting for authentication endpoints.
    pub rate_limit: RateLimitConfig,

    /// Public and role-gated route tables.
    pub authorization: AuthorizationConfig,

    /// Password recovery flow.
    pub password_reset: PasswordResetConfig,

    /// User store backing file.
    pub users: UserStoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret (at least 32 bytes).
    pub jwt_secret: String,

    /// Lifetime of login tokens in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            token_ttl_secs: 24 * 3600,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per client and endpoint within one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Path prefixes subject to the limiter.
    pub route_prefixes: Vec<String>,

    /// How often stale counters are swept.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window_secs: 60,
            route_prefixes: vec!["/api/v1/auth/".to_string()],
            sweep_interval_secs: 300,
        }
    }
}

/// Route reachable without identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicRouteConfig {
    /// Path pattern (`*` one segment, trailing `**` any remainder).
    pub pattern: String,

    /// Restrict to these methods; empty means all.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Route reserved for one role.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleRouteConfig {
    pub pattern: String,

    #[serde(default)]
    pub methods: Vec<String>,

    /// Role the principal must hold.
    pub role: Role,
}

/// Authorization tables. Hot-reloadable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    pub public_routes: Vec<PublicRouteConfig>,
    pub role_routes: Vec<RoleRouteConfig>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        let public = |pattern: &str, methods: &[&str]| PublicRouteConfig {
            pattern: pattern.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        };

        Self {
            public_routes: vec![
                public("/health", &[]),
                public("/api/v1/auth/**", &[]),
                public("/api/v1/resources/**", &["GET"]),
                public("/files/**", &["GET"]),
            ],
            role_routes: vec![RoleRouteConfig {
                pattern: "/api/v1/users/*/make-admin".to_string(),
                methods: Vec::new(),
                role: Role::Admin,
            }],
        }
    }
}

/// Password recovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordResetConfig {
    /// Frontend URL the reset link points to; the token is appended as `?token=`.
    pub frontend_url: String,

    /// Reset token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// How often expired tokens are purged.
    pub purge_interval_secs: u64,

    /// Sender address for reset mail.
    pub mail_from: String,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            token_ttl_secs: 3600,
            purge_interval_secs: 3600,
            mail_from: "noreply@wellnessapp.com".to_string(),
        }
    }
}

/// User store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UserStoreConfig {
    /// JSON file the in-memory store is loaded from and saved to on shutdown.
    pub persistence_path: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Content-Security-Policy header value.
    pub content_security_policy: String,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            content_security_policy: "default-src 'self'".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}
