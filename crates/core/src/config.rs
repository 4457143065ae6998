use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Deployment environment name ("development", "production", ...).
    pub environment: String,
    /// Shared Redis for the response cache and rate-limit counters.
    /// When unset, both fall back to in-process backends.
    #[serde(default)]
    pub redis_url: Option<String>,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub origin: OriginConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// API route prefix, `/analyze` or `/api/analyze` depending on
    /// deployment.
    pub route_prefix: String,
    pub enable_cors: bool,
    pub enable_tracing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OriginConfig {
    /// Backend analysis service endpoint.
    pub base_url: String,
    /// Request timeout; a timed-out call counts as a transport failure.
    pub timeout_secs: u64,
    /// Explicit failure policy override. When unset, the environment
    /// name decides (development gets the mock fixture).
    #[serde(default)]
    pub failure_policy: Option<FailurePolicyKind>,
}

/// What to answer when the origin transport fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicyKind {
    /// Deterministic fixture so local work can proceed without a live
    /// backend.
    Mock,
    /// 200-status degraded sentinel the frontend special-cases.
    Degraded,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Cache-Control max-age attached to stored responses, in seconds.
    pub max_age_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Admissions per hostname per window.
    pub per_domain_limit: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AssetsConfig {
    /// Directory holding the built frontend. When unset, non-API routes
    /// get a plain "service is running" notice.
    #[serde(default)]
    pub dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("STACKLENS_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("environment", env.clone())?
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=8787 to server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Resolve the origin failure policy: explicit configuration wins,
    /// otherwise development gets the mock fixture and every other
    /// environment the degraded sentinel.
    pub fn failure_policy(&self) -> FailurePolicyKind {
        match self.origin.failure_policy {
            Some(policy) => policy,
            None if self.environment == "development" => FailurePolicyKind::Mock,
            None => FailurePolicyKind::Degraded,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            redis_url: None,
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8787,
            },
            gateway: GatewayConfig {
                route_prefix: "/analyze".into(),
                enable_cors: true,
                enable_tracing: true,
            },
            origin: OriginConfig {
                base_url: "http://localhost:10000/analyze".into(),
                timeout_secs: 30,
                failure_policy: None,
            },
            cache: CacheConfig {
                max_age_secs: 2_628_000, // ~1 month
            },
            rate_limit: RateLimitConfig {
                per_domain_limit: 60,
                window_secs: 60,
            },
            assets: AssetsConfig::default(),
        }
    }
}
