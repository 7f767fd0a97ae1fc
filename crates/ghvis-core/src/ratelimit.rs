//! Per-tenant request rate limiting.
//!
//! Request timestamps live in a [`RateLimitStore`], so the window holds
//! across processes that share a store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::Result;
use crate::traits::RateLimitStore;
use crate::types::TenantId;

/// Default requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: usize = 30;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter keyed by tenant.
///
/// Each tenant may make `max_requests` requests within any `window`.
#[derive(Debug, Clone)]
pub struct RateLimiter<S> {
    store: S,
    max_requests: usize,
    window: Duration,
}

impl<S: RateLimitStore> RateLimiter<S> {
    /// Limiter recording requests in `store`.
    pub fn new(store: S, max_requests: usize, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    /// Admit a request for `tenant` now, recording it if admitted.
    ///
    /// Returns false when the tenant has exhausted its window.
    pub async fn check(&self, tenant: TenantId) -> Result<bool> {
        self.check_at(tenant, Utc::now()).await
    }

    /// Admit a request for `tenant` at `now`.
    pub async fn check_at(&self, tenant: TenantId, now: DateTime<Utc>) -> Result<bool> {
        let admitted = self
            .store
            .admit_request(tenant, now, self.max_requests, self.window)
            .await?;
        if !admitted {
            debug!(tenant = %tenant, "rate limit exceeded");
        }
        Ok(admitted)
    }
}

/// Apply one request at `now` to a tenant's recorded timestamps.
///
/// Drops timestamps older than `window`, then records `now` unless
/// `max_requests` remain. Timestamps in the future of `now` are kept.
/// Stores call this inside their unit of work.
pub fn admit(
    hits: &mut Vec<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_requests: usize,
    window: Duration,
) -> bool {
    hits.retain(|t| {
        now.signed_duration_since(*t)
            .to_std()
            .map_or(true, |age| age < window)
    });

    if hits.len() >= max_requests {
        return false;
    }
    hits.push(now);
    true
}
