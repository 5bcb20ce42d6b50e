//! Wellness Gate Library
//!
//! Trust and access layer for the wellness API: signed identity tokens,
//! per-client rate limiting, route authorization and single-use password
//! reset tokens.

// Core subsystems
pub mod auth;
pub mod config;
pub mod gate;
pub mod http;
pub mod reset;
pub mod routing;
pub mod security;

// Collaborators
pub mod mail;
pub mod store;

// Cross-cutting concerns
pub mod housekeeping;
pub mod lifecycle;
pub mod observability;

pub(crate) mod time;

pub use config::schema::GateConfig;
pub use gate::RequestGate;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
