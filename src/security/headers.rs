//! Security response headers.
//!
//! # Responsibilities
//! - Deny framing, MIME sniffing and legacy XSS auditing bypasses
//! - Set referrer and permissions policies
//! - Apply a configurable Content-Security-Policy
//!
//! # Design Decisions
//! - Headers are only added if the handler did not set them already

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Wrap `router` with the security header layers when enabled.
pub fn apply_security_headers(router: Router, config: &SecurityConfig) -> Router {
    if !config.enable_headers {
        return router;
    }

    let csp = match HeaderValue::from_str(&config.content_security_policy) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid Content-Security-Policy, using default-src 'self'");
            HeaderValue::from_static("default-src 'self'")
        }
    };

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            PERMISSIONS_POLICY,
            HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            csp,
        ))
}
