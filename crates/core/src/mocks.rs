//! Mock implementations of the capability traits for testing.
//!
//! These record every call they receive so tests can assert not only
//! on responses but on what the pipeline did and did not touch, e.g.
//! that a cache hit never reached the rate limiter or the origin.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    traits::{AnalysisOrigin, DomainRateLimiter, ResponseCache, StaticAssets},
    types::{AssetResponse, CachedResponse, OriginResponse},
    Error, Result,
};

// =============================================================================
// Mock Response Cache
// =============================================================================

/// In-memory mock cache with recorded lookups and writes.
#[derive(Default)]
pub struct MockResponseCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
    lookups: Mutex<Vec<String>>,
}

impl MockResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with preset cache entries.
    pub fn with_entries(entries: Vec<(&str, CachedResponse)>) -> Self {
        let cache = Self::new();
        {
            let mut map = cache.entries.lock().unwrap();
            for (key, entry) in entries {
                map.insert(key.to_string(), entry);
            }
        }
        cache
    }

    /// Keys looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// Current entry for a key, if any.
    pub fn entry(&self, key: &str) -> Option<CachedResponse> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for MockResponseCache {
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>> {
        self.lookups.lock().unwrap().push(key.to_string());
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn store(&self, key: &str, response: CachedResponse) -> Result<()> {
        self.entries.lock().unwrap().insert(key.to_string(), response);
        Ok(())
    }
}

// =============================================================================
// Mock Rate Limiter
// =============================================================================

/// Mock rate limiter with a scripted decision and recorded keys.
pub struct MockRateLimiter {
    allow: bool,
    checked: Mutex<Vec<String>>,
}

impl MockRateLimiter {
    /// Create a limiter that admits everything.
    pub fn allow_all() -> Self {
        Self {
            allow: true,
            checked: Mutex::new(Vec::new()),
        }
    }

    /// Create a limiter that denies everything.
    pub fn deny_all() -> Self {
        Self {
            allow: false,
            checked: Mutex::new(Vec::new()),
        }
    }

    /// Hostnames checked so far, in order.
    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    /// Number of admission checks made.
    pub fn call_count(&self) -> usize {
        self.checked.lock().unwrap().len()
    }
}

#[async_trait]
impl DomainRateLimiter for MockRateLimiter {
    async fn check(&self, hostname: &str) -> Result<bool> {
        self.checked.lock().unwrap().push(hostname.to_string());
        Ok(self.allow)
    }
}

// =============================================================================
// Mock Origin
// =============================================================================

enum OriginOutcome {
    Respond(OriginResponse),
    TransportFailure,
}

/// Scripted mock origin that records the URLs it was asked to analyze.
pub struct MockOrigin {
    outcome: OriginOutcome,
    calls: Mutex<Vec<String>>,
}

impl MockOrigin {
    /// Create an origin that always returns the given response.
    pub fn respond(response: OriginResponse) -> Self {
        Self {
            outcome: OriginOutcome::Respond(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create an origin that answers 200 with a JSON body.
    pub fn ok_json(body: &str) -> Self {
        Self::respond(OriginResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into(),
        })
    }

    /// Create an origin that answers the given status with a plain body.
    pub fn status(status: u16, body: &str) -> Self {
        Self::respond(OriginResponse {
            status,
            content_type: Some("text/plain".to_string()),
            body: body.to_string().into(),
        })
    }

    /// Create an origin whose transport always fails.
    pub fn unreachable() -> Self {
        Self {
            outcome: OriginOutcome::TransportFailure,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Target URLs forwarded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of forwarded requests.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalysisOrigin for MockOrigin {
    async fn analyze(&self, target_url: &str) -> Result<OriginResponse> {
        self.calls.lock().unwrap().push(target_url.to_string());
        match &self.outcome {
            OriginOutcome::Respond(response) => Ok(response.clone()),
            OriginOutcome::TransportFailure => Err(Error::origin("connection refused")),
        }
    }
}

// =============================================================================
// Mock Static Assets
// =============================================================================

/// In-memory static asset source.
#[derive(Default)]
pub struct MockAssets {
    assets: Mutex<HashMap<String, AssetResponse>>,
}

impl MockAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with preset assets as (path, content type, body) tuples.
    pub fn with_assets(assets: Vec<(&str, &str, &str)>) -> Self {
        let mock = Self::new();
        {
            let mut map = mock.assets.lock().unwrap();
            for (path, content_type, body) in assets {
                map.insert(
                    path.to_string(),
                    AssetResponse {
                        content_type: content_type.to_string(),
                        body: body.to_string().into(),
                    },
                );
            }
        }
        mock
    }
}

#[async_trait]
impl StaticAssets for MockAssets {
    async fn fetch(&self, path: &str) -> Result<Option<AssetResponse>> {
        Ok(self.assets.lock().unwrap().get(path).cloned())
    }
}
