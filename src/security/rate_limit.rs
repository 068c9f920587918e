//! Per-client fixed-window rate limiting.
//!
//! Each client address owns a `(count, window_start)` entry. A window opens on
//! the first request from an address and lasts `window`; the `max + 1`-th
//! request inside it is rejected. Once the window has elapsed the next
//! request opens a fresh one.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::error::RelayError;
use crate::observability::metrics;
use crate::security::client_addr;
use crate::security::clock::{Clock, SystemClock};

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Shortest window a limiter will use; a zero window would never deny.
pub const MIN_WINDOW: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Outcome of a single `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32, reset_after: Duration },
    Denied { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Counter table keyed by client address.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    window: Duration,
    max_requests: u32,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_clock(window, max_requests, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, max_requests: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            window: window.max(MIN_WINDOW),
            max_requests,
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request from `key` and decide whether it may proceed.
    ///
    /// The entry is updated under its shard lock, so concurrent checks for the
    /// same key never lose increments.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);

        let reset_after = self
            .window
            .saturating_sub(now.duration_since(entry.window_start));

        if entry.count > self.max_requests {
            RateLimitDecision::Denied {
                retry_after: reset_after,
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: self.max_requests - entry.count,
                reset_after,
            }
        }
    }

    /// Drop entries whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < self.window);
        before.saturating_sub(self.entries.len())
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

/// Run `sweep` once per window until shutdown.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        // First tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, tracked = limiter.tracked(), "Swept expired rate-limit windows");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// State for the rate-limit middleware.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub trust_proxy_headers: bool,
    pub message: Arc<str>,
}

/// Middleware enforcing the per-address quota.
///
/// Also attaches the resolved `ClientAddress` to the request for the handler.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_addr::resolve_request(&request, state.trust_proxy_headers);

    match state.limiter.check(client.as_str()) {
        RateLimitDecision::Allowed { remaining, .. } => {
            request.extensions_mut().insert(client);
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(state.limiter.max_requests()));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        RateLimitDecision::Denied { retry_after } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            metrics::record_rate_limited();
            let mut response = RelayError::RateLimited {
                message: state.message.to_string(),
                retry_after,
            }
            .into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(state.limiter.max_requests()));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            response
        }
    }
}
