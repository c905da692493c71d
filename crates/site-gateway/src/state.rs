//! Shared application state.

use std::sync::Arc;

use shared_content::{SystemTimeSource, TimeSource};
use site_content_client::{ContentClient, ContentClientConfig, ReqwestTransport, Transport};
use site_telemetry::MetricsRegistry;

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::rate_limit::{FixedWindowLimiter, RateLimitPolicy};
use crate::revalidator::{CacheRevalidator, PageCache, Revalidator};

/// Everything a handler may touch. Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub content: Arc<ContentClient>,
    pub transport: Arc<dyn Transport>,
    pub pages: Arc<PageCache>,
    pub revalidator: Arc<dyn Revalidator>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub metrics: Arc<MetricsRegistry>,
    pub clock: Arc<dyn TimeSource>,
}

impl AppState {
    /// Wire the state over an explicit transport and clock.
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let caching = config.environment.is_production();

        let content = Arc::new(ContentClient::new(
            ContentClientConfig {
                base_url: config.upstream.base_url.clone(),
                cache_enabled: caching,
            },
            Arc::clone(&transport),
            Arc::clone(&clock),
            Arc::clone(&metrics),
        ));
        let pages = Arc::new(PageCache::new(Arc::clone(&clock), caching));
        let revalidator: Arc<dyn Revalidator> = Arc::new(CacheRevalidator::new(
            Arc::clone(&content),
            Arc::clone(&pages),
        ));
        let limiter = Arc::new(FixedWindowLimiter::new(Arc::clone(&clock)));

        Self {
            config: Arc::new(config),
            content,
            transport,
            pages,
            revalidator,
            limiter,
            metrics,
            clock,
        }
    }

    /// Production wiring: reqwest transport and the system clock.
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(config.upstream.api_key.expose(), config.upstream.timeout)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(Self::new(config, Arc::new(transport), Arc::new(SystemTimeSource)))
    }

    /// Replace the revalidator, e.g. with a recording one.
    pub fn with_revalidator(mut self, revalidator: Arc<dyn Revalidator>) -> Self {
        self.revalidator = revalidator;
        self
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            limit: self.config.revalidate.max_requests,
            window_ms: self.config.revalidate.window_ms,
        }
    }
}
