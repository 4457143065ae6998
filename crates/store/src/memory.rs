//! In-memory capability backends.
//!
//! Single-process stand-ins for the shared cache and rate limiter,
//! used when no Redis is configured and in tests.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use stacklens_core::{
    traits::{DomainRateLimiter, ResponseCache},
    types::CachedResponse,
    Error, Result,
};

/// Cache entry with expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    response: CachedResponse,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-memory response cache using DashMap for concurrent access.
///
/// Entries expire after the configured TTL and are dropped lazily on
/// lookup.
pub struct InMemoryResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl InMemoryResponseCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.response.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn store(&self, key: &str, response: CachedResponse) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                response,
                created_at: Instant::now(),
                ttl: self.ttl,
            },
        );
        Ok(())
    }
}

/// In-memory per-hostname admission control.
///
/// Wraps a keyed governor limiter; the per-window limit maps to burst
/// capacity replenished once per window.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl InMemoryRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Result<Self> {
        let limit = NonZeroU32::new(limit)
            .ok_or_else(|| Error::rate_limit("per-domain limit must be non-zero"))?;
        let quota = Quota::with_period(window)
            .ok_or_else(|| Error::rate_limit("rate limit window must be non-zero"))?
            .allow_burst(limit);
        Ok(Self {
            limiter: RateLimiter::keyed(quota),
        })
    }
}

#[async_trait]
impl DomainRateLimiter for InMemoryRateLimiter {
    async fn check(&self, hostname: &str) -> Result<bool> {
        Ok(self.limiter.check_key(&hostname.to_string()).is_ok())
    }
}
