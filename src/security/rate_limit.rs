//! Fixed-window rate limiting for authentication endpoints.
//!
//! Each `(client, route)` pair owns one counter whose window is anchored at
//! the request that opened it. The check-and-increment happens under the
//! DashMap shard lock of that key, so concurrent requests with the same key
//! are serialized while unrelated keys proceed in parallel.

use std::time::{Duration, Instant};

use axum::http::Method;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { retry_after_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    client: String,
    route: String,
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// Per-client request counter table.
pub struct RateLimiter {
    counters: DashMap<CounterKey, WindowCounter>,
    enabled: bool,
    max_requests: u32,
    window: Duration,
    route_prefixes: Vec<String>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        tracing::info!(
            enabled = config.enabled,
            max_requests = config.max_requests,
            window_secs = config.window_secs,
            prefixes = ?config.route_prefixes,
            "Rate limiter initialized"
        );

        Self {
            counters: DashMap::new(),
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            route_prefixes: config.route_prefixes.clone(),
        }
    }

    /// Route class for a request, or `None` when the limiter does not apply.
    ///
    /// Only configured prefixes are limited and CORS preflights always pass.
    /// The class is the full path, giving each endpoint its own budget.
    pub fn route_class(&self, method: &Method, path: &str) -> Option<String> {
        if !self.enabled || method == Method::OPTIONS {
            return None;
        }
        self.route_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
            .then(|| path.to_string())
    }

    /// Count one request for `client_key` on `route_class`.
    pub fn admit(&self, client_key: &str, route_class: &str) -> Admission {
        self.admit_at(client_key, route_class, Instant::now())
    }

    pub(crate) fn admit_at(&self, client_key: &str, route_class: &str, now: Instant) -> Admission {
        let key = CounterKey {
            client: client_key.to_string(),
            route: route_class.to_string(),
        };

        let count = match self.counters.entry(key) {
            Entry::Occupied(mut entry) => {
                let counter = entry.get_mut();
                if now.saturating_duration_since(counter.window_start) >= self.window {
                    *counter = WindowCounter { window_start: now, count: 1 };
                } else {
                    counter.count = counter.count.saturating_add(1);
                }
                counter.count
            }
            Entry::Vacant(entry) => {
                entry.insert(WindowCounter { window_start: now, count: 1 });
                1
            }
        };

        if count > self.max_requests {
            metrics::record_rate_limited(route_class);
            Admission::Denied { retry_after_secs: self.retry_after_secs() }
        } else {
            Admission::Allowed
        }
    }

    /// Seconds a denied client is told to wait: one full window.
    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Drop counters whose window started more than two windows ago.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let retention = self.window.saturating_mul(2);
        let mut removed = 0;
        self.counters.retain(|_, counter| {
            let keep = now.saturating_duration_since(counter.window_start) <= retention;
            if !keep {
                removed += 1;
            }
            keep
        });

        metrics::record_rate_limit_counters(self.counters.len());
        if removed > 0 {
            tracing::debug!(removed, "Rate limiter cleanup removed stale counters");
        }
        removed
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
