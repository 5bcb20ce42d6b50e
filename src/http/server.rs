//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the collaborators the gate and handlers share
//! - Wire up middleware (request id, tracing, security headers, timeout, body limit, gate)
//! - Spawn the sweeper and the authorization reload task
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::auth::{PrincipalResolver, TokenCodec};
use crate::config::GateConfig;
use crate::gate::RequestGate;
use crate::housekeeping::Sweeper;
use crate::http::handlers::{auth, health, users};
use crate::http::middleware::gate_middleware;
use crate::http::request::with_request_tracing;
use crate::mail::Mailer;
use crate::reset::ResetTokenLedger;
use crate::routing::matcher::PatternError;
use crate::security::headers::apply_security_headers;
use crate::security::{AuthorizationPolicy, RateLimiter};
use crate::store::{TokenPersistence, UserStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserStore>,
    pub ledger: Arc<ResetTokenLedger>,
}

pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<RateLimiter>,
    ledger: Arc<ResetTokenLedger>,
    policy: Arc<ArcSwap<AuthorizationPolicy>>,
}

impl HttpServer {
    /// Assemble the service around the given storage and mail collaborators.
    pub fn new(
        config: GateConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenPersistence>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, PatternError> {
        let codec = Arc::new(TokenCodec::new(
            config.auth.jwt_secret.as_bytes(),
            Duration::from_secs(config.auth.token_ttl_secs),
        ));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let policy = Arc::new(ArcSwap::from_pointee(AuthorizationPolicy::from_config(
            &config.authorization,
        )?));
        let ledger = Arc::new(ResetTokenLedger::new(
            users.clone(),
            tokens,
            mailer,
            &config.password_reset,
        ));

        let gate = Arc::new(RequestGate::standard(
            limiter.clone(),
            PrincipalResolver::new(codec.clone()),
            policy.clone(),
        ));
        let state = AppState {
            codec,
            users,
            ledger: ledger.clone(),
        };

        let router = Self::build_router(&config, state, gate);
        Ok(Self {
            router,
            config,
            limiter,
            ledger,
            policy,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The gate is a full layer rather than a route layer so unknown paths
    /// are authorized like any other.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, state: AppState, gate: Arc<RequestGate>) -> Router {
        let router = Router::new()
            .route("/health", get(health::health))
            .route("/api/v1/auth/register", post(auth::register))
            .route("/api/v1/auth/login", post(auth::login))
            .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
            .route("/api/v1/auth/reset-password/validate", get(auth::validate_reset_token))
            .route("/api/v1/auth/reset-password", post(auth::reset_password))
            .route("/api/v1/user/profile", get(users::profile))
            .route("/api/v1/user/password", put(users::change_password))
            .route("/api/v1/users/{id}/make-admin", post(users::make_admin))
            .with_state(state)
            .layer(middleware::from_fn_with_state(gate, gate_middleware))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        with_request_tracing(apply_security_headers(router, &config.security))
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configs arriving on `config_updates` replace the authorization table;
    /// every other section keeps its startup value.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = Sweeper::new(
            self.limiter.clone(),
            self.ledger.clone(),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            Duration::from_secs(self.config.password_reset.purge_interval_secs),
        );
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        tokio::spawn(apply_policy_updates(
            self.policy.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_policy_updates(
    policy: Arc<ArcSwap<AuthorizationPolicy>>,
    mut updates: mpsc::UnboundedReceiver<GateConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                match AuthorizationPolicy::from_config(&config.authorization) {
                    Ok(next) => {
                        policy.store(Arc::new(next));
                        tracing::info!(
                            public_routes = config.authorization.public_routes.len(),
                            role_routes = config.authorization.role_routes.len(),
                            "Authorization table swapped; other sections apply on restart"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reloaded authorization table rejected, keeping current");
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
