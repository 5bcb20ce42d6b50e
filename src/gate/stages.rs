//! The three standard gate stages.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::auth::PrincipalResolver;
use crate::gate::stage::{GateContext, Rejection, Stage, StageOutcome};
use crate::security::policy::{AuthorizationPolicy, Decision, DenyReason};
use crate::security::rate_limit::{Admission, RateLimiter};

/// Counts the request against its client's budget before any token work.
pub struct RateLimitStage {
    limiter: Arc<RateLimiter>,
}

impl RateLimitStage {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn evaluate(&self, ctx: &mut GateContext) -> StageOutcome {
        let Some(route) = self.limiter.route_class(&ctx.method, &ctx.path) else {
            return StageOutcome::Continue;
        };

        match self.limiter.admit(&ctx.client_key, &route) {
            Admission::Allowed => StageOutcome::Continue,
            Admission::Denied { retry_after_secs } => {
                tracing::warn!(client = %ctx.client_key, route = %route, "Rate limit exceeded");
                StageOutcome::Reject(Rejection::RateLimited { retry_after_secs })
            }
        }
    }
}

/// Resolves the bearer credential. Never rejects on its own.
pub struct AuthenticationStage {
    resolver: PrincipalResolver,
}

impl AuthenticationStage {
    pub fn new(resolver: PrincipalResolver) -> Self {
        Self { resolver }
    }
}

impl Stage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn evaluate(&self, ctx: &mut GateContext) -> StageOutcome {
        ctx.principal = self.resolver.resolve(ctx.credential.as_deref());
        StageOutcome::Continue
    }
}

/// Applies the current authorization table. The table can be swapped at
/// runtime; each request sees one consistent snapshot.
pub struct AuthorizationStage {
    policy: Arc<ArcSwap<AuthorizationPolicy>>,
}

impl AuthorizationStage {
    pub fn new(policy: Arc<ArcSwap<AuthorizationPolicy>>) -> Self {
        Self { policy }
    }
}

impl Stage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn evaluate(&self, ctx: &mut GateContext) -> StageOutcome {
        let policy = self.policy.load();
        match policy.check(&ctx.path, &ctx.method, &ctx.principal) {
            Decision::Permit => StageOutcome::Continue,
            Decision::Deny(DenyReason::Unauthenticated) => StageOutcome::Reject(Rejection::Unauthorized),
            Decision::Deny(DenyReason::Forbidden) => {
                tracing::info!(
                    path = %ctx.path,
                    method = %ctx.method,
                    subject_id = ?ctx.principal.subject_id(),
                    "Access forbidden for role"
                );
                StageOutcome::Reject(Rejection::Forbidden)
            }
        }
    }
}
