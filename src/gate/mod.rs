//! Request gate.
//!
//! # Data Flow
//! ```text
//! Request
//!     → RateLimitStage      (limited prefix? count it; over budget → 429)
//!     → AuthenticationStage (bearer token → Principal, failures → Anonymous)
//!     → AuthorizationStage  (policy table → 401 / 403)
//!     → handler, with Principal in request extensions
//! ```
//!
//! # Design Decisions
//! - Stages are an explicit ordered list; the first rejection is terminal
//! - Rate limiting runs before any signature verification
//! - Authentication never rejects, so 401 and 403 stay distinct

pub mod pipeline;
pub mod stage;
pub mod stages;

pub use pipeline::RequestGate;
pub use stage::{GateContext, Rejection, Stage, StageOutcome};
pub use stages::{AuthenticationStage, AuthorizationStage, RateLimitStage};
