//! Middleware stack for the site gateway.
//!
//! Layer order: Request → RequestContext → AccessLog → SecurityHeaders →
//! Timeout → BodyLimit → Router. The revalidation route additionally sits
//! behind [`RateLimitLayer`].

pub mod access_log;
pub mod rate_limit;
pub mod request_context;
pub mod security_headers;
pub mod timeout;

pub use access_log::AccessLogLayer;
pub use rate_limit::{
    cleanup_task, client_identifier, FixedWindowLimiter, RateLimitDecision, RateLimitLayer,
    RateLimitPolicy,
};
pub use request_context::{CspNonce, RequestContextLayer, RequestId};
pub use security_headers::{SecurityHeadersConfig, SecurityHeadersLayer};
pub use timeout::TimeoutLayer;

use crate::domain::config::GatewayConfig;

/// Middleware stack builder
pub struct MiddlewareStack {
    pub request_context: RequestContextLayer,
    pub access_log: AccessLogLayer,
    pub security_headers: SecurityHeadersLayer,
    pub timeout: TimeoutLayer,
}

impl MiddlewareStack {
    /// Create middleware stack from gateway config
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            request_context: RequestContextLayer::new(),
            access_log: AccessLogLayer::new(),
            security_headers: SecurityHeadersLayer::new(SecurityHeadersConfig {
                environment: config.environment,
                backend_origin: config.upstream.origin(),
            }),
            timeout: TimeoutLayer::new(config.limits.request_timeout),
        }
    }
}
