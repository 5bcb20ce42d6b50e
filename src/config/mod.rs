//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + WELLNESS_* environment
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks, pattern compilation)
//!     → GateConfig (validated, immutable)
//!     → shared to subsystems at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the authorization table (ArcSwap)
//! ```
//!
//! # Design Decisions
//! - Only the authorization tables are hot-reloaded; secrets and limits need a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_defaults, ConfigError};
pub use schema::{
    AuthConfig, AuthorizationConfig, GateConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    PasswordResetConfig, PublicRouteConfig, RateLimitConfig, RoleRouteConfig, SecurityConfig,
    TimeoutConfig, UserStoreConfig,
};
