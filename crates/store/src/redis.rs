//! Redis-backed capability backends.
//!
//! These are the shared, cross-instance implementations: every gateway
//! pod addresses the same cache entries and the same quota windows.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use stacklens_core::{
    traits::{DomainRateLimiter, ResponseCache},
    types::CachedResponse,
    Error, Result,
};

/// Stored envelope for a cached response. The body is base64 so the
/// envelope stays one plain JSON string value in Redis.
#[derive(Serialize, Deserialize)]
struct StoredResponse {
    status: u16,
    content_type: String,
    body: String,
}

/// Redis persistence for cached analyze responses.
///
/// Entries are written with a TTL equal to the response max-age, so
/// Redis bounds staleness the same way the cache-control directive
/// promises to clients.
pub struct RedisResponseCache {
    client: Client,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisResponseCache {
    /// Create a new Redis response cache.
    pub fn new(url: &str, prefix: &str, ttl_seconds: u64) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            ttl_seconds,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::cache(format!("Redis connection error: {}", e)))?;

        let data: Option<String> = conn
            .get(self.key(key))
            .await
            .map_err(|e| Error::cache(format!("Redis get error: {}", e)))?;

        match data {
            Some(json) => {
                let stored: StoredResponse = serde_json::from_str(&json)
                    .map_err(|e| Error::cache(format!("Failed to deserialize cache entry: {}", e)))?;
                let body = BASE64
                    .decode(stored.body)
                    .map_err(|e| Error::cache(format!("Failed to decode cache entry body: {}", e)))?;
                Ok(Some(CachedResponse {
                    status: stored.status,
                    content_type: stored.content_type,
                    body: body.into(),
                }))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, response: CachedResponse) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::cache(format!("Redis connection error: {}", e)))?;

        let stored = StoredResponse {
            status: response.status,
            content_type: response.content_type,
            body: BASE64.encode(&response.body),
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| Error::cache(format!("Failed to serialize cache entry: {}", e)))?;

        tracing::debug!(key = %key, ttl = self.ttl_seconds, "Caching response in Redis");

        let _: () = conn
            .set_ex(self.key(key), json, self.ttl_seconds)
            .await
            .map_err(|e| Error::cache(format!("Redis set error: {}", e)))?;

        Ok(())
    }
}

/// Redis fixed-window rate limiter, one window per hostname.
///
/// INCR the window counter and EXPIRE it on first touch; the count is
/// shared by every instance pointing at the same Redis.
pub struct RedisRateLimiter {
    client: Client,
    prefix: String,
    limit: u32,
    window_seconds: u64,
}

impl RedisRateLimiter {
    /// Create a new Redis rate limiter.
    pub fn new(url: &str, limit: u32, window_seconds: u64) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::rate_limit(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client,
            prefix: "stacklens:ratelimit".to_string(),
            limit,
            window_seconds,
        })
    }
}

#[async_trait]
impl DomainRateLimiter for RedisRateLimiter {
    async fn check(&self, hostname: &str) -> Result<bool> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::rate_limit(format!("Redis connection error: {}", e)))?;

        let key = format!("{}:{}", self.prefix, hostname);
        let count: u64 = conn
            .incr(&key, 1u64)
            .await
            .map_err(|e| Error::rate_limit(format!("Redis incr error: {}", e)))?;

        if count == 1 {
            let _: () = conn
                .expire(&key, self.window_seconds as i64)
                .await
                .map_err(|e| Error::rate_limit(format!("Redis expire error: {}", e)))?;
        }

        Ok(count <= self.limit as u64)
    }
}
