//! Per-request identity resolution.

use std::sync::Arc;

use crate::auth::role::Role;
use crate::auth::token::{TokenCodec, TokenError};
use crate::auth::UserId;
use crate::observability::metrics;

const BEARER_PREFIX: &str = "Bearer ";

/// Identity attached to one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated { subject_id: UserId, role: Role },
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated { .. })
    }

    pub fn subject_id(&self) -> Option<UserId> {
        match self {
            Principal::Authenticated { subject_id, .. } => Some(*subject_id),
            Principal::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Authenticated { role, .. } => Some(*role),
            Principal::Anonymous => None,
        }
    }
}

/// Pick the user a handler should act on: an explicitly supplied id wins,
/// then the authenticated principal, otherwise nobody.
pub fn resolve_user_id(explicit: Option<UserId>, principal: &Principal) -> Option<UserId> {
    explicit.or_else(|| principal.subject_id())
}

/// Turns the raw `Authorization` header value into a [`Principal`].
#[derive(Clone)]
pub struct PrincipalResolver {
    codec: Arc<TokenCodec>,
}

impl PrincipalResolver {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Resolve a credential. Authentication failures never error out; they
    /// leave the request anonymous and authorization decides what that means.
    pub fn resolve(&self, raw_credential: Option<&str>) -> Principal {
        let Some(raw) = raw_credential else {
            return Principal::Anonymous;
        };
        let Some(token) = raw.strip_prefix(BEARER_PREFIX) else {
            tracing::debug!("Authorization header without bearer scheme, treating as anonymous");
            return Principal::Anonymous;
        };

        match self.codec.decode(token.trim()) {
            Ok(assertion) => Principal::Authenticated {
                subject_id: assertion.subject_id,
                role: assertion.role,
            },
            Err(err) => {
                match &err {
                    TokenError::Expired => {
                        tracing::debug!("Bearer token expired, treating as anonymous");
                    }
                    TokenError::Malformed | TokenError::SignatureInvalid => {
                        tracing::warn!(kind = err.kind(), "Rejected bearer token: {}", err);
                    }
                    other => {
                        tracing::error!(kind = other.kind(), "Unexpected token failure: {}", other);
                    }
                }
                metrics::record_auth_failure(err.kind());
                Principal::Anonymous
            }
        }
    }
}
