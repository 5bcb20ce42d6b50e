//! Startup orchestration.
//!
//! Load config → logging → metrics → collaborators → listener → background
//! tasks → serve. Any failure before serving is fatal.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::schema::PLACEHOLDER_JWT_SECRET;
use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, load_defaults, ConfigError, GateConfig, UserStoreConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::mail::LogMailer;
use crate::observability::{logging, metrics};
use crate::routing::matcher::PatternError;
use crate::store::{InMemoryTokenStore, InMemoryUserStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("user store: {0}")]
    Store(#[from] StoreError),

    #[error("authorization table: {0}")]
    Policy(#[from] PatternError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Load from `path`, or fall back to built-in defaults plus environment.
pub fn load(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => load_defaults(),
    }
}

pub fn open_user_store(config: &UserStoreConfig) -> Result<InMemoryUserStore, StoreError> {
    match &config.persistence_path {
        Some(path) => InMemoryUserStore::load_from_file(path),
        None => Ok(InMemoryUserStore::new(None)),
    }
}

/// Run the service until a termination signal. Users are saved on the way out.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = load(config_path)?;

    logging::init_logging(&config.observability);
    tracing::info!("wellness-gate v{} starting", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
        tracing::warn!("Using the placeholder signing secret; set WELLNESS_JWT_SECRET in production");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let users = open_user_store(&config.users)?;
    let server = HttpServer::new(
        config.clone(),
        Arc::new(users.clone()),
        Arc::new(InMemoryTokenStore::new()),
        Arc::new(LogMailer::new(config.password_reset.mail_from.clone())),
    )?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Listening for connections"
    );

    // The watcher handle must outlive the server or reloads stop.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    users.save_to_file()?;
    tracing::info!("Shutdown complete");
    Ok(())
}
