//! Stage contract shared by every step of the request gate.

use axum::http::Method;

use crate::auth::Principal;

/// What the gate knows about a request. Stages read it and may enrich it.
#[derive(Debug, Clone)]
pub struct GateContext {
    pub method: Method,
    pub path: String,
    /// Rate-limit identity, see [`crate::security::client_ip::client_key`].
    pub client_key: String,
    /// Raw `Authorization` header value, if any.
    pub credential: Option<String>,
    /// Filled in by the authentication stage.
    pub principal: Principal,
}

impl GateContext {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        client_key: impl Into<String>,
        credential: Option<String>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            client_key: client_key.into(),
            credential,
            principal: Principal::Anonymous,
        }
    }
}

/// Terminal refusal. Maps one-to-one onto 429, 401 and 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    RateLimited { retry_after_secs: u64 },
    Unauthorized,
    Forbidden,
}

impl Rejection {
    pub fn outcome(&self) -> &'static str {
        match self {
            Rejection::RateLimited { .. } => "rate_limited",
            Rejection::Unauthorized => "unauthorized",
            Rejection::Forbidden => "forbidden",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Reject(Rejection),
}

/// One step of the gate. Stages run in order and the first rejection wins.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &mut GateContext) -> StageOutcome;
}
