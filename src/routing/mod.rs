//! Route patterns used by the authorization table.
//!
//! # Design Decisions
//! - Patterns compiled once at config load, immutable afterwards
//! - Segment matching only, no regex in the hot path
//! - An empty method list means "any method"

pub mod matcher;

pub use matcher::{PatternError, RouteMatcher, RoutePattern};
