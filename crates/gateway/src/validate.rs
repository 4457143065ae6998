//! Inbound request validation for the analyze route.

use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use stacklens_core::types::AnalyzeRequest;

/// A rejected analyze request: a specific status plus a plain-text
/// reason. Rejections never reach the cache, the rate limiter, or the
/// origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: &'static str,
}

impl Rejection {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Validate an inbound analyze request and extract the target URL.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// method, content type, body shape, URL format.
pub fn validate_request(
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Url, Rejection> {
    if method != Method::POST {
        return Err(Rejection::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        ));
    }

    // Exact match: parameterized values like "application/json;
    // charset=utf-8" are rejected too.
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if content_type != Some("application/json") {
        return Err(Rejection::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type: Expected application/json",
        ));
    }

    let request: AnalyzeRequest = serde_json::from_slice(body).map_err(|_| {
        Rejection::new(StatusCode::BAD_REQUEST, "Invalid JSON or URL format")
    })?;

    let raw_url = match request.url {
        Some(url) if !url.is_empty() => url,
        _ => {
            return Err(Rejection::new(
                StatusCode::BAD_REQUEST,
                "Missing \"url\" in request body",
            ))
        }
    };

    Url::parse(&raw_url)
        .map_err(|_| Rejection::new(StatusCode::BAD_REQUEST, "Invalid JSON or URL format"))
}
