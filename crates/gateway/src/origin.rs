//! Origin client and transport-failure policy.

use std::time::Duration;

use async_trait::async_trait;

use stacklens_core::{
    config::{FailurePolicyKind, OriginConfig},
    traits::AnalysisOrigin,
    types::{AnalysisResult, CategoryGroup, DegradedResult, OriginResponse},
    Error, Result,
};

/// HTTP client for the backend analysis service.
///
/// The origin's reply is passed back verbatim whatever its status; only
/// a transport failure (unreachable, DNS, timeout) surfaces as an error
/// for the failure policy to resolve.
pub struct HttpOrigin {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrigin {
    /// Build a client with the configured request timeout. A timed-out
    /// call is indistinguishable from an unreachable origin by design.
    pub fn new(config: &OriginConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::origin(format!("Failed to build origin client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl AnalysisOrigin for HttpOrigin {
    async fn analyze(&self, target_url: &str) -> Result<OriginResponse> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&serde_json::json!({ "url": target_url }))
            .send()
            .await
            .map_err(|e| Error::origin(format!("Origin fetch failed: {}", e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::origin(format!("Origin body read failed: {}", e)))?;

        Ok(OriginResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Resolve an origin transport failure into the response the caller
/// sees. Both policies answer 200: the mock keeps local development
/// moving without a live backend, the degraded sentinel gives the
/// frontend a single error shape instead of raw transport failures.
pub fn fallback_response(
    policy: FailurePolicyKind,
    target_url: &str,
) -> Result<OriginResponse> {
    let body = match policy {
        FailurePolicyKind::Mock => serde_json::to_vec(&mock_result(target_url))?,
        FailurePolicyKind::Degraded => serde_json::to_vec(&DegradedResult::new())?,
    };

    Ok(OriginResponse {
        status: 200,
        content_type: Some("application/json".to_string()),
        body: body.into(),
    })
}

/// Deterministic fixture returned by the development policy.
fn mock_result(target_url: &str) -> AnalysisResult {
    let group = |category: &str, technology: &str| CategoryGroup {
        category: category.to_string(),
        technologies: vec![technology.to_string()],
    };

    AnalysisResult {
        url: target_url.to_string(),
        technologies: ["OneTrust", "Stripe", "Varnish", "Cloudflare"]
            .iter()
            .map(|name| name.to_string())
            .collect(),
        categories: vec![
            group("Cookie compliance", "OneTrust"),
            group("Payment processors", "Stripe"),
            group("Caching", "Varnish"),
            group("CDN", "Cloudflare"),
        ],
    }
}
