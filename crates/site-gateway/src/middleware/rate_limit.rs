//! Fixed-window rate limiting for the revalidation webhook.
//!
//! Each client identifier gets a counter and a reset instant fixed at its
//! first request. Once the counter reaches the limit every further request
//! is rejected until the reset instant passes, at which point the next
//! request opens a fresh window.
//!
//! The whole read-compare-write for an identifier runs under that
//! identifier's `DashMap` shard lock, so concurrent requests from one client
//! never over-admit.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{body::Body, http::Request, response::IntoResponse, response::Response};
use dashmap::DashMap;
use shared_content::TimeSource;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::domain::error::RevalidateError;

/// Per-identifier window state
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at_ms: u64,
}

/// Outcome of one [`FixedWindowLimiter::consume`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        let wait_ms = self.reset_at_ms.saturating_sub(now_ms);
        wait_ms.div_ceil(1000).max(1)
    }
}

/// Limit and window applied to every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_ms: u64,
}

/// Shared limiter state, one per process.
pub struct FixedWindowLimiter {
    windows: DashMap<String, WindowEntry>,
    clock: Arc<dyn TimeSource>,
}

impl FixedWindowLimiter {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Count one request from `identifier`.
    pub fn consume(&self, identifier: &str, limit: u32, window_ms: u64) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let mut entry = self
            .windows
            .entry(identifier.to_string())
            .or_insert(WindowEntry {
                count: 0,
                reset_at_ms: 0,
            });

        if entry.count == 0 || entry.reset_at_ms <= now {
            *entry = WindowEntry {
                count: 1,
                reset_at_ms: now.saturating_add(window_ms),
            };
            return RateLimitDecision {
                allowed: true,
                remaining: limit.saturating_sub(1),
                reset_at_ms: entry.reset_at_ms,
            };
        }

        if entry.count >= limit {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at_ms: entry.reset_at_ms,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: limit.saturating_sub(entry.count),
            reset_at_ms: entry.reset_at_ms,
        }
    }

    /// Drop entries whose window has already passed. Such entries would be
    /// replaced by a fresh window on their next request anyway.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.windows.len();
        self.windows.retain(|_, entry| entry.reset_at_ms > now);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Removed expired rate limit windows");
        }
        removed
    }

    /// Number of tracked identifiers
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Client identifier: first `x-forwarded-for` entry, then
/// `cf-connecting-ip`, then the literal `unknown`.
pub fn client_identifier<B>(req: &Request<B>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(ip) = header("cf-connecting-ip").map(str::trim) {
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    "unknown".to_string()
}

/// Rate limit layer
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<FixedWindowLimiter>,
    policy: RateLimitPolicy,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<FixedWindowLimiter>, policy: RateLimitPolicy) -> Self {
        Self { limiter, policy }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: Arc::clone(&self.limiter),
            policy: self.policy,
        }
    }
}

/// Rate limit service
///
/// Rejected requests get a 429 without reaching the inner service. Admitted
/// requests carry their [`RateLimitDecision`] as a request extension.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<FixedWindowLimiter>,
    policy: RateLimitPolicy,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let limiter = Arc::clone(&self.limiter);
        let policy = self.policy;
        // The clone has not been polled ready; keep it and call the ready one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let identifier = client_identifier(&req);
            let decision = limiter.consume(&identifier, policy.limit, policy.window_ms);

            if !decision.allowed {
                let retry_after_secs = decision.retry_after_secs(limiter.now_ms());
                warn!(
                    client = %identifier,
                    retry_after_secs,
                    "Rate limit exceeded"
                );
                return Ok(RevalidateError::RateLimited { retry_after_secs }.into_response());
            }

            req.extensions_mut().insert(decision);
            inner.call(req).await
        })
    }
}

/// Background task dropping expired windows
pub async fn cleanup_task(limiter: Arc<FixedWindowLimiter>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        limiter.purge_expired();
    }
}
