//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request id, trace span)
//!     → security headers, timeout, body limit
//!     → middleware/gate.rs (rate limit → principal → authorization)
//!     → handlers/ (auth, users, health)
//!     → response.rs (errors and rejections as JSON)
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
