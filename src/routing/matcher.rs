//! Route pattern matching for the authorization table.
//!
//! # Responsibilities
//! - Parse route patterns (`/api/v1/users/*/make-admin`, `/api/v1/auth/**`)
//! - Match request paths segment by segment
//! - Optionally restrict a rule to a set of HTTP methods
//!
//! # Design Decisions
//! - `*` matches exactly one segment, `**` matches any remainder (even empty)
//! - Path matching is case-sensitive
//! - No regex, matching is linear in the number of segments

use axum::http::Method;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern must start with '/': {0}")]
    NotAbsolute(String),

    #[error("'**' is only allowed as the last segment: {0}")]
    MisplacedRest(String),

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
    Rest,
}

/// Compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }

        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "**" if i + 1 == parts.len() => Segment::Rest,
                "**" => return Err(PatternError::MisplacedRest(raw.to_string())),
                "*" => Segment::Any,
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => match parts.next() {
                    Some(part) if part == literal => {}
                    _ => return false,
                },
            }
        }
        parts.next().is_none()
    }
}

/// A path pattern plus an optional method restriction.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    pattern: RoutePattern,
    /// Empty means every method.
    methods: Vec<Method>,
}

impl RouteMatcher {
    /// Compile a pattern and method names as they appear in configuration.
    pub fn compile(pattern: &str, methods: &[String]) -> Result<Self, PatternError> {
        let pattern = RoutePattern::parse(pattern)?;
        let methods = methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| PatternError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pattern, methods })
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        (self.methods.is_empty() || self.methods.contains(method)) && self.pattern.matches(path)
    }
}
