//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, request id in the span)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Token failures are logged by severity: tampering loud, expiry quiet
//! - Token values and passwords are never logged
//! - Metrics are cheap (atomic increments) and off unless configured

pub mod logging;
pub mod metrics;
