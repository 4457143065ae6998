//! Integration tests for the Redis backends.
//!
//! These run only when a Redis is reachable (REDIS_URL or localhost);
//! otherwise they skip so CI without Redis stays green.

use std::time::Duration;

use stacklens_core::traits::{DomainRateLimiter, ResponseCache};
use stacklens_core::types::CachedResponse;
use stacklens_store::{RedisRateLimiter, RedisResponseCache};

async fn is_redis_available(url: &str) -> bool {
    let Ok(client) = redis::Client::open(url) else {
        return false;
    };
    match tokio::time::timeout(
        Duration::from_secs(1),
        client.get_multiplexed_async_connection(),
    )
    .await
    {
        Ok(Ok(_)) => true,
        _ => false,
    }
}

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

#[tokio::test]
async fn test_response_cache_roundtrip() -> anyhow::Result<()> {
    let url = redis_url();
    if !is_redis_available(&url).await {
        println!("Skipping test_response_cache_roundtrip: Redis not available");
        return Ok(());
    }

    let cache = RedisResponseCache::new(&url, "stacklens:test:cache", 60)?;
    let key = format!("https://example.com/{}", uuid::Uuid::new_v4());

    assert!(cache.lookup(&key).await?.is_none());

    cache
        .store(
            &key,
            CachedResponse {
                status: 200,
                content_type: "application/json".to_string(),
                body: "{\"url\":\"https://example.com\"}".to_string().into(),
            },
        )
        .await?;

    let hit = cache.lookup(&key).await?.expect("entry should be present");
    assert_eq!(hit.status, 200);
    assert_eq!(hit.content_type, "application/json");
    assert_eq!(&hit.body[..], b"{\"url\":\"https://example.com\"}");

    Ok(())
}

#[tokio::test]
async fn test_rate_limiter_shared_window() -> anyhow::Result<()> {
    let url = redis_url();
    if !is_redis_available(&url).await {
        println!("Skipping test_rate_limiter_shared_window: Redis not available");
        return Ok(());
    }

    // Two limiters simulating two gateway instances over one window.
    let limiter_a = RedisRateLimiter::new(&url, 5, 60)?;
    let limiter_b = RedisRateLimiter::new(&url, 5, 60)?;

    let hostname = format!("limit-test-{}.example.com", uuid::Uuid::new_v4());

    for _ in 0..3 {
        assert!(limiter_a.check(&hostname).await?, "first 3 should pass");
    }
    assert!(limiter_b.check(&hostname).await?, "4th (on B) should pass");
    assert!(limiter_b.check(&hostname).await?, "5th (on B) should pass");

    assert!(
        !limiter_a.check(&hostname).await?,
        "6th should be denied, the window is shared"
    );

    Ok(())
}
