//! Gateway configuration with validation.
//!
//! Built once at startup from an [`EnvResolver`]. Handlers never resolve
//! environment values themselves, so a missing secret fails the process
//! before the router exists.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::domain::env::{sanitize_url, ConfigurationError, EnvResolver, SiteEnvironment};
use crate::domain::secret::Secret;

/// Main gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Deployment environment (`APP_ENV`)
    pub environment: SiteEnvironment,
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Content API connection
    pub upstream: UpstreamConfig,
    /// Revalidation webhook
    pub revalidate: RevalidateConfig,
    /// Public site identity
    pub site: SiteConfig,
    /// Request limits and timeouts
    pub limits: LimitsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: SiteEnvironment::Development,
            http: HttpConfig::default(),
            upstream: UpstreamConfig::default(),
            revalidate: RevalidateConfig::default(),
            site: SiteConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Resolve the whole configuration.
    ///
    /// # Environment Variables
    ///
    /// - `API_BASE_URL`, `API_KEY`, `REVALIDATE_SECRET`: required
    /// - `REVALIDATE_WINDOW_MS` (default 60000, floor 1000)
    /// - `REVALIDATE_MAX_REQUESTS` (default 30, floor 1)
    /// - `APP_ENV`: `production` enables caching and indexing
    /// - `SITE_HOST` / `SITE_PORT` (default 0.0.0.0:3000)
    /// - `SITE_URL` (default https://19sixtyfive.com.sg)
    /// - `UPSTREAM_TIMEOUT_MS` (default 10000)
    /// - `ASSETS_PATH`: media root on the CMS host (default `/wp-content/uploads`)
    /// - `REQUEST_TIMEOUT_SECS` (default 30)
    /// - `BUILD_ID`, else `GIT_COMMIT_SHA`, else `dev`
    pub fn from_env(env: &EnvResolver) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = sanitize_url(&env.required("API_BASE_URL")?, "API_BASE_URL")?;
        let api_key = Secret::new(env.required("API_KEY")?);
        let secret = Secret::new(env.required("REVALIDATE_SECRET")?);

        let host = match env.optional("SITE_HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(format!("SITE_HOST={raw}")))?,
            None => defaults.http.host,
        };

        let public_url = match env.optional("SITE_URL") {
            Some(raw) => sanitize_url(&raw, "SITE_URL")?,
            None => defaults.site.public_url,
        };

        let assets_path = match env.optional("ASSETS_PATH") {
            Some(raw) => normalize_assets_path(&raw),
            None => defaults.upstream.assets_path,
        };

        let build_id = env
            .optional("BUILD_ID")
            .or_else(|| env.optional("GIT_COMMIT_SHA"))
            .unwrap_or(defaults.site.build_id);

        let config = Self {
            environment: SiteEnvironment::from_name(env.optional("APP_ENV").as_deref()),
            http: HttpConfig {
                host,
                port: env.parse_or("SITE_PORT", defaults.http.port),
            },
            upstream: UpstreamConfig {
                base_url,
                api_key,
                timeout: Duration::from_millis(
                    env.parse_or("UPSTREAM_TIMEOUT_MS", defaults.upstream.timeout.as_millis() as u64),
                ),
                assets_path,
            },
            revalidate: RevalidateConfig {
                secret,
                window_ms: numeric_with_floor(
                    env.optional("REVALIDATE_WINDOW_MS"),
                    DEFAULT_WINDOW_MS,
                    MIN_WINDOW_MS,
                ),
                max_requests: numeric_with_floor(
                    env.optional("REVALIDATE_MAX_REQUESTS"),
                    u64::from(DEFAULT_MAX_REQUESTS),
                    u64::from(MIN_MAX_REQUESTS),
                )
                .min(u64::from(u32::MAX)) as u32,
                cleanup_interval: defaults.revalidate.cleanup_interval,
            },
            site: SiteConfig {
                public_url,
                build_id,
            },
            limits: LimitsConfig {
                request_timeout: Duration::from_secs(env.parse_or(
                    "REQUEST_TIMEOUT_SECS",
                    defaults.limits.request_timeout.as_secs(),
                )),
                max_body_bytes: defaults.limits.max_body_bytes,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidAddress("port cannot be 0".into()));
        }

        if self.upstream.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "upstream timeout cannot be 0".into(),
            ));
        }

        if self.limits.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if self.revalidate.window_ms < MIN_WINDOW_MS {
            return Err(ConfigError::InvalidRateLimit(format!(
                "window must be at least {MIN_WINDOW_MS}ms"
            )));
        }

        if self.revalidate.max_requests < MIN_MAX_REQUESTS {
            return Err(ConfigError::InvalidRateLimit(
                "max_requests cannot be 0".into(),
            ));
        }

        if self.limits.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

pub const DEFAULT_WINDOW_MS: u64 = 60_000;
pub const MIN_WINDOW_MS: u64 = 1_000;
pub const DEFAULT_MAX_REQUESTS: u32 = 30;
pub const MIN_MAX_REQUESTS: u32 = 1;

/// A numeric setting: unset, unparsable or zero means `default`; anything
/// else is raised to `floor`.
fn numeric_with_floor(raw: Option<String>, default: u64, floor: u64) -> u64 {
    let value = raw
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value != 0.0);
    match value {
        Some(value) if value < floor as f64 => floor,
        Some(value) => value as u64,
        None => default.max(floor),
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 3000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
        }
    }
}

/// Content API connection
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Sent as `X-API-Key`
    pub api_key: Secret,
    /// Per-request timeout
    pub timeout: Duration,
    /// Media root on the CMS host, with a leading slash
    pub assets_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/wp-json/custom/v1".to_string(),
            api_key: Secret::new(""),
            timeout: Duration::from_secs(10),
            assets_path: "/wp-content/uploads".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// `scheme://host[:port]` of the content API.
    pub fn origin(&self) -> String {
        reqwest::Url::parse(&self.base_url)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// URL of a media file below the assets root.
    pub fn asset_url(&self, file_path: &str) -> String {
        format!("{}{}/{}", self.origin(), self.assets_path, file_path)
    }
}

/// Leading slash, no trailing slash; blank means the host root.
fn normalize_assets_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Revalidation webhook configuration
#[derive(Debug, Clone)]
pub struct RevalidateConfig {
    /// Shared secret expected in `?secret=` or the body `token`
    pub secret: Secret,
    /// Fixed window length
    pub window_ms: u64,
    /// Requests allowed per window per client
    pub max_requests: u32,
    /// How often expired limiter entries are dropped
    pub cleanup_interval: Duration,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            secret: Secret::new(""),
            window_ms: DEFAULT_WINDOW_MS,
            max_requests: DEFAULT_MAX_REQUESTS,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Public site identity
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Canonical public URL, used in the sitemap and robots.txt
    pub public_url: String,
    /// Reported by the health endpoint
    pub build_id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_url: "https://19sixtyfive.com.sg".to_string(),
            build_id: "dev".to_string(),
        }
    }
}

/// Request limits
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Whole-request deadline
    pub request_timeout: Duration,
    /// Maximum accepted request body
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required value missing or malformed
    #[error(transparent)]
    Env(#[from] ConfigurationError),

    /// Bind address problem
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid rate limit configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Invalid limit configuration
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// Invalid timeout configuration
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
