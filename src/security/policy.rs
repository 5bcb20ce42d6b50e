//! Static role/route/method authorization table.
//!
//! Rules are evaluated in order and the first match decides:
//! 1. public allowlist → permit
//! 2. `OPTIONS` preflight → permit
//! 3. role-gated routes → the principal's role must equal the required role
//! 4. everything else → any authenticated principal

use axum::http::Method;

use crate::auth::{Principal, Role};
use crate::config::AuthorizationConfig;
use crate::routing::matcher::{PatternError, RouteMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity on the request (401).
    Unauthenticated,
    /// Identity present, role insufficient (403).
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

#[derive(Debug, Clone)]
struct RoleRule {
    matcher: RouteMatcher,
    required: Role,
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    public: Vec<RouteMatcher>,
    gated: Vec<RoleRule>,
}

impl AuthorizationPolicy {
    /// Compile the configured tables.
    pub fn from_config(config: &AuthorizationConfig) -> Result<Self, PatternError> {
        let public = config
            .public_routes
            .iter()
            .map(|r| RouteMatcher::compile(&r.pattern, &r.methods))
            .collect::<Result<Vec<_>, _>>()?;

        let gated = config
            .role_routes
            .iter()
            .map(|r| {
                Ok(RoleRule {
                    matcher: RouteMatcher::compile(&r.pattern, &r.methods)?,
                    required: r.role,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(Self { public, gated })
    }

    pub fn check(&self, path: &str, method: &Method, principal: &Principal) -> Decision {
        if self.public.iter().any(|m| m.matches(method, path)) {
            return Decision::Permit;
        }

        if method == Method::OPTIONS {
            return Decision::Permit;
        }

        if let Some(rule) = self.gated.iter().find(|r| r.matcher.matches(method, path)) {
            return match principal.role() {
                None => Decision::Deny(DenyReason::Unauthenticated),
                Some(role) if role == rule.required => Decision::Permit,
                Some(_) => Decision::Deny(DenyReason::Forbidden),
            };
        }

        if principal.is_authenticated() {
            Decision::Permit
        } else {
            Decision::Deny(DenyReason::Unauthenticated)
        }
    }
}
