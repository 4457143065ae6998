//! Axum-based HTTP server for the gateway.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use stacklens_core::{
    config::FailurePolicyKind,
    traits::{AnalysisOrigin, DomainRateLimiter, ResponseCache, StaticAssets},
    types::{CachedResponse, OriginResponse},
    Error, Result,
};

use crate::background::BackgroundTasks;
use crate::normalize::normalize_url;
use crate::origin::fallback_response;
use crate::validate::validate_request;

/// Upper bound on the analyze request body; the payload is one URL.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// API route prefix, `/analyze` or `/api/analyze` depending on
    /// deployment.
    pub route_prefix: String,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
    /// Cache-Control max-age attached to cacheable responses, seconds.
    pub cache_max_age_secs: u64,
    /// Applied when the origin transport fails.
    pub failure_policy: FailurePolicyKind,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            route_prefix: "/analyze".to_string(),
            enable_cors: true,
            enable_tracing: true,
            cache_max_age_secs: 2_628_000, // ~1 month
            failure_policy: FailurePolicyKind::Degraded,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Shared response cache.
    pub cache: Arc<dyn ResponseCache>,
    /// Per-domain admission control.
    pub rate_limiter: Arc<dyn DomainRateLimiter>,
    /// Backend analysis service.
    pub origin: Arc<dyn AnalysisOrigin>,
    /// Static assets for non-API routes (optional in local development).
    pub assets: Option<Arc<dyn StaticAssets>>,
    /// Tracker for detached cache writes.
    pub background: BackgroundTasks,
}

/// Gateway server.
pub struct GatewayServer {
    state: Arc<AppState>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(
        config: GatewayConfig,
        cache: Arc<dyn ResponseCache>,
        rate_limiter: Arc<dyn DomainRateLimiter>,
        origin: Arc<dyn AnalysisOrigin>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                config,
                cache,
                rate_limiter,
                origin,
                assets: None,
                background: BackgroundTasks::new(),
            }),
        }
    }

    /// Set the static asset capability for non-API routes.
    pub fn with_assets(mut self, assets: Arc<dyn StaticAssets>) -> Self {
        Arc::get_mut(&mut self.state).unwrap().assets = Some(assets);
        self
    }

    /// Share an externally owned background tracker.
    pub fn with_background(mut self, background: BackgroundTasks) -> Self {
        Arc::get_mut(&mut self.state).unwrap().background = background;
        self
    }

    /// Handle on the background tracker, for shutdown draining and for
    /// tests observing detached cache writes.
    pub fn background(&self) -> BackgroundTasks {
        self.state.background.clone()
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let prefix = self.state.config.route_prefix.clone();

        let mut router = Router::new()
            .route("/health", get(health_handler))
            // The analyze route takes every method so the validator owns
            // the 405 semantics; subpaths under the prefix are API too.
            .route(&prefix, any(analyze_handler))
            .route(&format!("{}/*rest", prefix), any(analyze_handler))
            .fallback(asset_handler)
            .with_state(self.state.clone());

        if self.state.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.state.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server until ctrl-c, then drain detached background
    /// work so in-flight cache writes settle before returning.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::gateway(format!("Failed to bind: {}", e)))?;

        tracing::info!(addr = %addr, prefix = %self.state.config.route_prefix, "Gateway server starting");

        let background = self.background();
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::gateway(format!("Server error: {}", e)))?;

        tracing::info!("Draining background work");
        background.wait_idle().await;

        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// =============================================================================
// Response Types
// =============================================================================

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Analyze pipeline: validate, normalize, cache lookup, admission
/// control, origin fetch, detached cache write.
async fn analyze_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let trace_id = Uuid::new_v4().to_string();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(trace_id = %trace_id, error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Invalid JSON or URL format").into_response();
        }
    };

    // 1. Validation. Rejections never touch cache, limiter, or origin.
    let target = match validate_request(&parts.method, &parts.headers, &body) {
        Ok(target) => target,
        Err(rejection) => {
            tracing::debug!(
                trace_id = %trace_id,
                status = %rejection.status,
                "Rejected analyze request"
            );
            return rejection.into_response();
        }
    };

    // 2. Cache check, keyed by the normalized URL. The cache is the
    // primary performance path; a hit never consumes rate-limit quota.
    let normalized = normalize_url(&target);

    match state.cache.lookup(&normalized).await {
        Ok(Some(cached)) => {
            tracing::info!(trace_id = %trace_id, key = %normalized, original = %target, "Cache hit");
            return cacheable_response(&state.config, cached);
        }
        Ok(None) => {
            tracing::info!(trace_id = %trace_id, key = %normalized, original = %target, "Cache miss");
        }
        Err(e) => {
            tracing::warn!(trace_id = %trace_id, error = %e, "Cache lookup failed, treating as miss");
        }
    }

    // 3. Rate limiting, only on cache miss. One quota bucket per
    // hostname of the target being analyzed.
    let hostname = target.host_str().unwrap_or_default().to_lowercase();
    match state.rate_limiter.check(&hostname).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(trace_id = %trace_id, hostname = %hostname, "Rate limit exceeded");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded for domain: {}", hostname),
            )
                .into_response();
        }
        Err(e) => {
            // The limiter protects the origin; its outage must not take
            // the product down. Fail open.
            tracing::warn!(trace_id = %trace_id, error = %e, "Rate limiter unavailable, admitting request");
        }
    }

    // 4. Forward to the origin.
    tracing::info!(trace_id = %trace_id, target = %normalized, "Fetching from origin");

    let origin_response = match state.origin.analyze(&normalized).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                trace_id = %trace_id,
                error = %e,
                policy = ?state.config.failure_policy,
                "Origin unreachable, applying failure policy"
            );
            return match fallback_response(state.config.failure_policy, &normalized) {
                Ok(fallback) => passthrough_response(fallback),
                Err(e) => {
                    tracing::error!(trace_id = %trace_id, error = %e, "Failed to build fallback response");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            };
        }
    };

    // Backend application errors pass through verbatim, uncached.
    if !origin_response.is_success() {
        tracing::info!(
            trace_id = %trace_id,
            status = origin_response.status,
            "Passing origin error through"
        );
        return passthrough_response(origin_response);
    }

    // 5. Respond, then persist. The write is detached: it must not
    // delay the response, and its failure only costs future latency.
    let entry = CachedResponse {
        status: origin_response.status,
        content_type: origin_response
            .content_type
            .unwrap_or_else(|| "application/json".to_string()),
        body: origin_response.body,
    };
    let response = cacheable_response(&state.config, entry.clone());

    let cache = state.cache.clone();
    let key = normalized;
    state.background.spawn(async move {
        if let Err(e) = cache.store(&key, entry).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    });

    response
}

/// Serve non-API requests from the static asset capability.
async fn asset_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let Some(assets) = &state.assets else {
        // Local development without a frontend build.
        return (
            StatusCode::OK,
            format!(
                "Gateway is running. Use the {} endpoint for API calls.",
                state.config.route_prefix
            ),
        )
            .into_response();
    };

    match assets.fetch(&path).await {
        Ok(Some(asset)) => {
            match Response::builder()
                .header(header::CONTENT_TYPE, asset.content_type)
                .body(Body::from(asset.body))
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Failed to build asset response");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Asset fetch failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// =============================================================================
// Response Builders
// =============================================================================

/// Build a response that advertises the shared cache lifetime. Used for
/// both fresh origin successes and cache hits, mirroring what was (or
/// will be) stored.
fn cacheable_response(config: &GatewayConfig, entry: CachedResponse) -> Response {
    let result = Response::builder()
        .status(entry.status)
        .header(header::CONTENT_TYPE, entry.content_type)
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", config.cache_max_age_secs),
        )
        .body(Body::from(entry.body));

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build cacheable response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Relay an origin reply verbatim: status, content type, body.
fn passthrough_response(origin: OriginResponse) -> Response {
    let mut builder = Response::builder().status(origin.status);
    if let Some(content_type) = origin.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    match builder.body(Body::from(origin.body)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build passthrough response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
