#![deny(unused)]
//! stacklens: edge gateway for the website technology analyzer.
//!
//! Validates inbound analysis requests, canonicalizes target URLs for
//! cache addressing, serves previously computed results from a shared
//! cache, rate-limits per analyzed domain, forwards cache misses to
//! the backend analysis service, and degrades gracefully when the
//! backend is unavailable.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stacklens_core::config::AppConfig;
use stacklens_core::traits::{AnalysisOrigin, DomainRateLimiter, ResponseCache};
use stacklens_gateway::{DirAssets, GatewayConfig, GatewayServer, HttpOrigin};
use stacklens_store::{
    InMemoryRateLimiter, InMemoryResponseCache, RedisRateLimiter, RedisResponseCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_tracing();

    let config = AppConfig::load()?;
    tracing::info!(
        environment = %config.environment,
        "Starting stacklens v{}",
        env!("CARGO_PKG_VERSION")
    );

    // =========================================================================
    // Capabilities: shared Redis backends when configured, in-memory
    // stand-ins otherwise.
    // =========================================================================
    let cache: Arc<dyn ResponseCache> = if let Some(redis_url) = &config.redis_url {
        tracing::info!(url = %redis_url, "Initializing Redis response cache");
        Arc::new(RedisResponseCache::new(
            redis_url,
            "stacklens:cache",
            config.cache.max_age_secs,
        )?)
    } else {
        tracing::info!("Initializing in-memory response cache");
        Arc::new(InMemoryResponseCache::new(Duration::from_secs(
            config.cache.max_age_secs,
        )))
    };

    let rate_limiter: Arc<dyn DomainRateLimiter> = if let Some(redis_url) = &config.redis_url {
        tracing::info!(url = %redis_url, "Initializing Redis rate limiter");
        Arc::new(RedisRateLimiter::new(
            redis_url,
            config.rate_limit.per_domain_limit,
            config.rate_limit.window_secs,
        )?)
    } else {
        tracing::info!("Initializing in-memory rate limiter");
        Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.per_domain_limit,
            Duration::from_secs(config.rate_limit.window_secs),
        )?)
    };

    let origin: Arc<dyn AnalysisOrigin> = Arc::new(HttpOrigin::new(&config.origin)?);
    tracing::info!(
        base_url = %config.origin.base_url,
        timeout_secs = config.origin.timeout_secs,
        policy = ?config.failure_policy(),
        "Origin client initialized"
    );

    // =========================================================================
    // Gateway
    // =========================================================================
    let gateway_config = GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        route_prefix: config.gateway.route_prefix.clone(),
        enable_cors: config.gateway.enable_cors,
        enable_tracing: config.gateway.enable_tracing,
        cache_max_age_secs: config.cache.max_age_secs,
        failure_policy: config.failure_policy(),
    };

    let mut server = GatewayServer::new(gateway_config, cache, rate_limiter, origin);

    if let Some(dir) = &config.assets.dir {
        tracing::info!(dir = %dir, "Serving static assets");
        server = server.with_assets(Arc::new(DirAssets::new(dir)));
    }

    // run() returns after graceful shutdown, once detached cache
    // writes have settled.
    server.run().await?;

    Ok(())
}

fn configure_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,stacklens=debug".into()),
    );

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
