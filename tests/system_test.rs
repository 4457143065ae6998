//! End-to-end wiring test: real in-memory backends and a real HTTP
//! origin client pointed at a dead port, driven through the router the
//! way the binary assembles it.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use stacklens_core::config::{AppConfig, FailurePolicyKind};
use stacklens_gateway::{GatewayConfig, GatewayServer, HttpOrigin};
use stacklens_store::{InMemoryRateLimiter, InMemoryResponseCache};

fn build_app(config: &AppConfig) -> axum::Router {
    let gateway_config = GatewayConfig {
        route_prefix: config.gateway.route_prefix.clone(),
        cache_max_age_secs: config.cache.max_age_secs,
        failure_policy: config.failure_policy(),
        ..GatewayConfig::default()
    };

    GatewayServer::new(
        gateway_config,
        Arc::new(InMemoryResponseCache::new(Duration::from_secs(
            config.cache.max_age_secs,
        ))),
        Arc::new(
            InMemoryRateLimiter::new(
                config.rate_limit.per_domain_limit,
                Duration::from_secs(config.rate_limit.window_secs),
            )
            .unwrap(),
        ),
        Arc::new(HttpOrigin::new(&config.origin).unwrap()),
    )
    .build_router()
}

#[tokio::test]
async fn test_development_stack_answers_without_backend() {
    let mut config = AppConfig::default();
    // Nothing listens here; the transport failure is immediate.
    config.origin.base_url = "http://127.0.0.1:9/analyze".to_string();
    config.origin.timeout_secs = 2;

    // The default environment is development, which selects the mock.
    assert_eq!(config.failure_policy(), FailurePolicyKind::Mock);

    let app = build_app(&config);

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"url":"https://example.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json["technologies"],
        serde_json::json!(["OneTrust", "Stripe", "Varnish", "Cloudflare"])
    );
}

#[tokio::test]
async fn test_production_stack_degrades_without_backend() {
    let mut config = AppConfig::default();
    config.environment = "production".to_string();
    config.origin.base_url = "http://127.0.0.1:9/analyze".to_string();
    config.origin.timeout_secs = 2;

    assert_eq!(config.failure_policy(), FailurePolicyKind::Degraded);

    let app = build_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"url":"https://example.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        &bytes[..],
        br#"{"error":true,"message":"Oops! Ran into an error"}"#
    );
}
