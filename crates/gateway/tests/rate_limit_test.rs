use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use stacklens_core::mocks::{MockOrigin, MockRateLimiter, MockResponseCache};
use stacklens_core::traits::DomainRateLimiter;
use stacklens_core::types::CachedResponse;
use stacklens_core::Error;
use stacklens_gateway::{GatewayConfig, GatewayServer};

fn analyze_request(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"url":"{}"}}"#, url)))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_denial_returns_429_and_never_contacts_origin() {
    let origin = Arc::new(MockOrigin::ok_json("{}"));
    let app = GatewayServer::new(
        GatewayConfig::default(),
        Arc::new(MockResponseCache::new()),
        Arc::new(MockRateLimiter::deny_all()),
        origin.clone(),
    )
    .build_router();

    let response = app
        .oneshot(analyze_request("https://example.com/page"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_string(response).await,
        "Rate limit exceeded for domain: example.com"
    );
    assert_eq!(origin.call_count(), 0);
}

#[tokio::test]
async fn test_quota_is_keyed_by_target_hostname() {
    let limiter = Arc::new(MockRateLimiter::allow_all());
    let app = GatewayServer::new(
        GatewayConfig::default(),
        Arc::new(MockResponseCache::new()),
        limiter.clone(),
        Arc::new(MockOrigin::ok_json("{}")),
    )
    .build_router();

    // The bucket key is the hostname as sent: www. is not stripped and
    // the case is lowered.
    let response = app
        .clone()
        .oneshot(analyze_request("https://WWW.Example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(analyze_request("https://other.example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        limiter.checked(),
        vec!["www.example.com", "other.example.com"]
    );
}

#[tokio::test]
async fn test_cache_hit_consumes_no_quota() {
    let cache = Arc::new(MockResponseCache::with_entries(vec![(
        "https://example.com/",
        CachedResponse {
            status: 200,
            content_type: "application/json".to_string(),
            body: "{}".to_string().into(),
        },
    )]));
    let limiter = Arc::new(MockRateLimiter::deny_all());
    let app = GatewayServer::new(
        GatewayConfig::default(),
        cache,
        limiter.clone(),
        Arc::new(MockOrigin::ok_json("{}")),
    )
    .build_router();

    // Even a denying limiter is irrelevant on a hit: it is never asked.
    let response = app
        .oneshot(analyze_request("https://example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(limiter.call_count(), 0);
}

#[tokio::test]
async fn test_limiter_outage_fails_open() {
    struct FailingLimiter;

    #[async_trait]
    impl DomainRateLimiter for FailingLimiter {
        async fn check(&self, _hostname: &str) -> stacklens_core::Result<bool> {
            Err(Error::rate_limit("redis gone"))
        }
    }

    let origin = Arc::new(MockOrigin::ok_json("{}"));
    let app = GatewayServer::new(
        GatewayConfig::default(),
        Arc::new(MockResponseCache::new()),
        Arc::new(FailingLimiter),
        origin.clone(),
    )
    .build_router();

    let response = app
        .oneshot(analyze_request("https://example.com"))
        .await
        .unwrap();

    // The limiter protects the origin, not the product: its outage
    // admits the request.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(origin.call_count(), 1);
}
