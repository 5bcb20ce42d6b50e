//! Ordered stage runner.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::auth::{Principal, PrincipalResolver};
use crate::gate::stage::{GateContext, Rejection, Stage, StageOutcome};
use crate::gate::stages::{AuthenticationStage, AuthorizationStage, RateLimitStage};
use crate::observability::metrics;
use crate::security::policy::AuthorizationPolicy;
use crate::security::rate_limit::RateLimiter;

pub struct RequestGate {
    stages: Vec<Box<dyn Stage>>,
}

impl RequestGate {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Rate limit, then authenticate, then authorize.
    pub fn standard(
        limiter: Arc<RateLimiter>,
        resolver: PrincipalResolver,
        policy: Arc<ArcSwap<AuthorizationPolicy>>,
    ) -> Self {
        Self::new(vec![
            Box::new(RateLimitStage::new(limiter)),
            Box::new(AuthenticationStage::new(resolver)),
            Box::new(AuthorizationStage::new(policy)),
        ])
    }

    /// Run every stage until one rejects. On success the resolved principal
    /// is handed back for the handler.
    pub fn evaluate(&self, mut ctx: GateContext) -> Result<Principal, Rejection> {
        for stage in &self.stages {
            if let StageOutcome::Reject(rejection) = stage.evaluate(&mut ctx) {
                tracing::debug!(
                    stage = stage.name(),
                    method = %ctx.method,
                    path = %ctx.path,
                    outcome = rejection.outcome(),
                    "Request rejected by gate"
                );
                metrics::record_decision(rejection.outcome());
                return Err(rejection);
            }
        }

        metrics::record_decision("permit");
        Ok(ctx.principal)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::Method;

    use crate::auth::{Role, TokenCodec};
    use crate::config::{AuthorizationConfig, RateLimitConfig};

    struct Harness {
        gate: RequestGate,
        codec: Arc<TokenCodec>,
    }

    fn harness(max_requests: u32) -> Harness {
        let codec = Arc::new(TokenCodec::new(
            b"request-gate-test-secret-0123456789abcdef",
            Duration::from_secs(600),
        ));
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        }));
        let policy = AuthorizationPolicy::from_config(&AuthorizationConfig::default()).unwrap();
        let gate = RequestGate::standard(
            limiter,
            PrincipalResolver::new(codec.clone()),
            Arc::new(ArcSwap::from_pointee(policy)),
        );
        Harness { gate, codec }
    }

    fn bearer(codec: &TokenCodec, id: u64, role: Role) -> Option<String> {
        let token = codec.issue(id, "someone@example.com", role, Duration::from_secs(600)).unwrap();
        Some(format!("Bearer {}", token))
    }

    fn ctx(method: Method, path: &str, credential: Option<String>) -> GateContext {
        GateContext::new(method, path, "1.2.3.4", credential)
    }

    #[test]
    fn test_stage_order() {
        let h = harness(5);
        assert_eq!(h.gate.stage_names(), vec!["rate_limit", "authentication", "authorization"]);
    }

    #[test]
    fn test_rate_limit_precedes_authentication() {
        let h = harness(2);
        for _ in 0..2 {
            assert!(h.gate.evaluate(ctx(Method::POST, "/api/v1/auth/login", None)).is_ok());
        }
        // A valid credential does not buy extra budget.
        let credential = bearer(&h.codec, 1, Role::Admin);
        assert_eq!(
            h.gate.evaluate(ctx(Method::POST, "/api/v1/auth/login", credential)),
            Err(Rejection::RateLimited { retry_after_secs: 60 })
        );
    }

    #[test]
    fn test_unauthorized_vs_forbidden() {
        let h = harness(5);
        let path = "/api/v1/users/7/make-admin";

        assert_eq!(h.gate.evaluate(ctx(Method::POST, path, None)), Err(Rejection::Unauthorized));

        let user = bearer(&h.codec, 1, Role::User);
        assert_eq!(h.gate.evaluate(ctx(Method::POST, path, user)), Err(Rejection::Forbidden));

        let admin = bearer(&h.codec, 2, Role::Admin);
        let principal = h.gate.evaluate(ctx(Method::POST, path, admin)).unwrap();
        assert_eq!(principal, Principal::Authenticated { subject_id: 2, role: Role::Admin });
    }

    #[test]
    fn test_bad_token_degrades_to_anonymous() {
        let h = harness(5);
        let garbage = Some("Bearer not.a.token".to_string());

        assert_eq!(
            h.gate.evaluate(ctx(Method::GET, "/api/v1/user/profile", garbage.clone())),
            Err(Rejection::Unauthorized)
        );
        assert_eq!(
            h.gate.evaluate(ctx(Method::GET, "/health", garbage)),
            Ok(Principal::Anonymous)
        );
    }

    #[test]
    fn test_preflight_passes_everything() {
        let h = harness(1);
        for _ in 0..3 {
            assert!(h.gate.evaluate(ctx(Method::OPTIONS, "/api/v1/auth/login", None)).is_ok());
            assert!(h.gate.evaluate(ctx(Method::OPTIONS, "/api/v1/users/1/make-admin", None)).is_ok());
        }
    }

    #[test]
    fn test_policy_swap_takes_effect() {
        let codec = Arc::new(TokenCodec::new(
            b"request-gate-test-secret-0123456789abcdef",
            Duration::from_secs(600),
        ));
        let policy = Arc::new(ArcSwap::from_pointee(
            AuthorizationPolicy::from_config(&AuthorizationConfig::default()).unwrap(),
        ));
        let gate = RequestGate::standard(
            Arc::new(RateLimiter::new(&RateLimitConfig::default())),
            PrincipalResolver::new(codec),
            policy.clone(),
        );

        assert_eq!(
            gate.evaluate(ctx(Method::GET, "/api/v1/reports", None)),
            Err(Rejection::Unauthorized)
        );

        let mut config = AuthorizationConfig::default();
        config.public_routes.push(crate::config::PublicRouteConfig {
            pattern: "/api/v1/reports".to_string(),
            methods: vec!["GET".to_string()],
        });
        policy.store(Arc::new(AuthorizationPolicy::from_config(&config).unwrap()));

        assert!(gate.evaluate(ctx(Method::GET, "/api/v1/reports", None)).is_ok());
    }
}
