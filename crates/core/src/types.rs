//! Payload and capability data types for the analyze pipeline.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// =============================================================================
// Request Types
// =============================================================================

/// Inbound analyze payload. The only accepted request body shape.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    /// Target URL to analyze. Must parse as an absolute URL.
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Successful backend payload. On the wire it is passed through
/// unmodified; it is typed here for the development fixture and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analyzed URL.
    pub url: String,
    /// Flat list of detected technology names.
    pub technologies: Vec<String>,
    /// Technologies grouped by category.
    pub categories: Vec<CategoryGroup>,
}

/// Technologies grouped under one category heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Category name, e.g. "CDN".
    pub category: String,
    /// Technology names detected in this category.
    pub technologies: Vec<String>,
}

/// Sentinel payload returned with HTTP 200 when the origin is
/// unreachable outside development, so callers can distinguish "no
/// data" from a transport failure without branching on status codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradedResult {
    pub error: bool,
    pub message: String,
}

impl DegradedResult {
    pub fn new() -> Self {
        Self {
            error: true,
            message: "Oops! Ran into an error".to_string(),
        }
    }
}

impl Default for DegradedResult {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Capability Payloads
// =============================================================================

/// A cached analyze response, addressed by normalized target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Status the origin answered with when the entry was written.
    pub status: u16,
    /// Content type of the stored body.
    pub content_type: String,
    /// Opaque response body.
    pub body: Bytes,
}

/// Raw origin reply. Non-2xx statuses are passed through verbatim by
/// the gateway; a transport failure is an `Err` from the origin
/// capability instead of a response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl OriginResponse {
    /// Whether the origin reported success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A static asset served on non-API routes.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    pub content_type: String,
    pub body: Bytes,
}
