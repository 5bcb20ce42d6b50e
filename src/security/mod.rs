//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (derive client key from forwarding headers)
//!     → rate_limit.rs (per client + endpoint fixed window)
//!     → [identity resolution in auth/]
//!     → policy.rs (role/route/method table)
//!     → Pass to handler
//!
//! Outgoing response:
//!     → headers.rs (security headers)
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before any token parsing
//! - Policy is data (config), not code; swapped atomically on reload
//! - No trust in client input beyond the documented header priority

pub mod client_ip;
pub mod headers;
pub mod policy;
pub mod rate_limit;

pub use policy::{AuthorizationPolicy, Decision, DenyReason};
pub use rate_limit::{Admission, RateLimiter};
