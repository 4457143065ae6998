//! Capability traits consumed by the gateway.
//!
//! Each external collaborator (the shared response cache, the
//! per-domain rate limiter, the backend analysis service, the static
//! asset source) sits behind one of these seams and is injected as an
//! `Arc<dyn ..>`, so the pipeline can be exercised with deterministic
//! fakes instead of ambient globals.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AssetResponse, CachedResponse, OriginResponse};

/// Shared response cache keyed by normalized target URL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a previously stored response.
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>>;

    /// Store a response under a key. Implementations bound staleness
    /// with their own TTL/eviction; callers never invalidate.
    async fn store(&self, key: &str, response: CachedResponse) -> Result<()>;
}

/// Per-hostname admission control in front of the origin.
#[async_trait]
pub trait DomainRateLimiter: Send + Sync {
    /// Check whether one more request for `hostname` is allowed,
    /// atomically consuming quota when it is. The window/bucket
    /// algorithm is an implementation detail; the gateway only depends
    /// on the boolean decision.
    async fn check(&self, hostname: &str) -> Result<bool>;
}

/// The backend analysis service.
#[async_trait]
pub trait AnalysisOrigin: Send + Sync {
    /// Forward an analyze request for `target_url`. `Ok` carries the
    /// origin's reply verbatim, whatever its status; `Err` means the
    /// transport itself failed (unreachable, DNS, timeout).
    async fn analyze(&self, target_url: &str) -> Result<OriginResponse>;
}

/// Static asset source for non-API routes.
#[async_trait]
pub trait StaticAssets: Send + Sync {
    /// Fetch the asset at `path`. `None` means not found.
    async fn fetch(&self, path: &str) -> Result<Option<AssetResponse>>;
}
