//! Content client.
//!
//! `fetch_json` is the only path to the CMS. Everything else is an accessor
//! built on it that shapes the request (resource, tags, freshness, device)
//! and collapses failures into an empty result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_content::{tags, CollectionKind, ContentItem, Device, Page, TimeSource};
use site_telemetry::{MetricsRegistry, UPSTREAM_ERRORS_TOTAL};
use tracing::{debug, warn};

use crate::cache::TaggedCache;
use crate::error::UpstreamError;
use crate::transport::Transport;

/// Freshness budget for list resources.
pub const DEFAULT_FRESHNESS_SECS: u64 = 3600;

/// Upper bound on the news listing fetch.
pub const NEWS_TIMEOUT: Duration = Duration::from_secs(8);

const BRAND_RESOURCE: &str = "/brand";
const BRAND_PROJECT_RESOURCE: &str = "/brand-detail";
const NEWS_RESOURCE: &str = "/news";

/// Per-call fetch context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Seconds the response may be served from cache. Zero is never cached.
    pub freshness_secs: u64,
    pub tags: Vec<String>,
    pub device: Device,
}

impl FetchOptions {
    pub fn cached(freshness_secs: u64, tags: Vec<String>, device: Device) -> Self {
        Self {
            freshness_secs,
            tags,
            device,
        }
    }

    pub fn no_store(device: Device) -> Self {
        Self {
            freshness_secs: 0,
            tags: Vec::new(),
            device,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// When false every fetch goes to the origin.
    pub cache_enabled: bool,
}

pub struct ContentClient {
    config: ContentClientConfig,
    transport: Arc<dyn Transport>,
    cache: TaggedCache<Value>,
    metrics: Arc<MetricsRegistry>,
}

impl ContentClient {
    pub fn new(
        config: ContentClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn TimeSource>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            config,
            transport,
            cache: TaggedCache::new(clock),
            metrics,
        }
    }

    /// Build the request URL for `path`: absolute `http(s)` URLs are used
    /// verbatim, anything else is appended to the base URL. The device
    /// discriminator is always added.
    pub fn url_for(&self, path: &str, device: Device) -> String {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.config.base_url, path)
        };
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str("device=");
        url.push_str(device.as_str());
        url
    }

    /// Fetch and decode one resource.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &FetchOptions,
    ) -> Result<T, UpstreamError> {
        let url = self.url_for(path, options.device);
        let cacheable = self.config.cache_enabled && options.freshness_secs > 0;

        let body = match cacheable
            .then(|| self.cache.get_tagged(&url, &options.tags))
            .flatten()
        {
            Some(cached) => {
                debug!(url = %url, "Content cache hit");
                cached
            }
            None => {
                let response = self.transport.get(&url).await?;
                if !response.is_success() {
                    return Err(UpstreamError::Status {
                        status: response.status,
                        url,
                    });
                }
                let body: Value =
                    serde_json::from_slice(&response.body).map_err(|e| UpstreamError::Decode {
                        url: url.clone(),
                        message: e.to_string(),
                    })?;
                if cacheable {
                    self.cache.insert(
                        url.clone(),
                        body.clone(),
                        &options.tags,
                        options.freshness_secs.saturating_mul(1000),
                    );
                }
                body
            }
        };

        serde_json::from_value(body).map_err(|e| UpstreamError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Drop fetch cache entries tagged `tag`.
    pub fn purge_tag(&self, tag: &str) -> usize {
        self.cache.purge_tag(tag)
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// A named collection, empty on any upstream failure.
    pub async fn list_collection(&self, kind: CollectionKind, device: Device) -> Vec<ContentItem> {
        let options = FetchOptions::cached(DEFAULT_FRESHNESS_SECS, tags::for_collection(kind), device);
        self.list(&kind.resource_path(), &options).await
    }

    /// First item matching `slug` by slug, then id, then derived slug.
    pub async fn find_by_slug(
        &self,
        kind: CollectionKind,
        slug: &str,
        device: Device,
    ) -> Option<ContentItem> {
        let items = self.list_collection(kind, device).await;
        select_by_slug(&items, slug).cloned()
    }

    /// Uncached fetch by id. The upstream counts a view as a side effect, so
    /// this must reach the origin every time. Failure means the view is not
    /// counted.
    pub async fn fetch_detail_for_view_increment(
        &self,
        kind: CollectionKind,
        id: &str,
        device: Device,
    ) -> Option<ContentItem> {
        let path = format!(
            "{}/{}",
            kind.resource_path(),
            utf8_percent_encode(id, NON_ALPHANUMERIC)
        );
        let result = self
            .fetch_json::<ContentItem>(&path, &FetchOptions::no_store(device))
            .await;
        self.collapse(&path, result.map(Some))
    }

    pub async fn list_brands(&self, device: Device) -> Vec<ContentItem> {
        let options = FetchOptions::cached(
            DEFAULT_FRESHNESS_SECS,
            vec![tags::BRANDS.to_string()],
            device,
        );
        self.list(BRAND_RESOURCE, &options).await
    }

    pub async fn find_brand_by_slug(&self, slug: &str, device: Device) -> Option<ContentItem> {
        let brands = self.list_brands(device).await;
        select_by_slug(&brands, slug).cloned()
    }

    /// Projects belonging to `brand_id`. The upstream returns every brand's
    /// projects, so the filter happens here.
    pub async fn list_brand_projects(&self, brand_id: &str, device: Device) -> Vec<ContentItem> {
        let options = FetchOptions::cached(
            DEFAULT_FRESHNESS_SECS,
            tags::for_brand_projects(brand_id),
            device,
        );
        let mut projects = self.list(BRAND_PROJECT_RESOURCE, &options).await;
        projects.retain(|project| project.brand_id.as_deref() == Some(brand_id));
        projects
    }

    pub async fn find_project_by_slug(
        &self,
        brand_id: &str,
        slug: &str,
        device: Device,
    ) -> Option<ContentItem> {
        let projects = self.list_brand_projects(brand_id, device).await;
        select_by_slug(&projects, slug).cloned()
    }

    pub async fn list_news(&self, device: Device) -> Vec<ContentItem> {
        let options = FetchOptions::cached(
            DEFAULT_FRESHNESS_SECS,
            vec![tags::NEWS.to_string()],
            device,
        );
        self.list(NEWS_RESOURCE, &options).await
    }

    /// News listing bounded by `limit`; empty when the upstream is slower.
    pub async fn list_news_within(&self, device: Device, limit: Duration) -> Vec<ContentItem> {
        self.bounded(NEWS_RESOURCE, limit, self.list_news(device))
            .await
    }

    async fn bounded<T, F>(&self, resource: &str, limit: Duration, fetch: F) -> T
    where
        T: Default,
        F: Future<Output = T>,
    {
        match tokio::time::timeout(limit, fetch).await {
            Ok(value) => value,
            Err(_) => self.collapse(
                resource,
                Err(UpstreamError::Timeout {
                    url: resource.to_string(),
                }),
            ),
        }
    }

    async fn list(&self, resource: &str, options: &FetchOptions) -> Vec<ContentItem> {
        let result = self
            .fetch_json::<Page<ContentItem>>(resource, options)
            .await
            .map(|page| page.items);
        self.collapse(resource, result)
    }

    fn collapse<T: Default>(&self, resource: &str, result: Result<T, UpstreamError>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                warn!(
                    resource = %resource,
                    kind = error.kind(),
                    status = ?error.status(),
                    error = %error,
                    "Upstream fetch failed, degrading to empty result"
                );
                self.metrics.increment(
                    UPSTREAM_ERRORS_TOTAL,
                    &[("resource", resource), ("kind", error.kind())],
                );
                T::default()
            }
        }
    }
}

/// Match by exact slug, else by id, else by slug derived from the title.
pub fn select_by_slug<'a>(items: &'a [ContentItem], target: &str) -> Option<&'a ContentItem> {
    items
        .iter()
        .find(|item| item.slug.as_deref() == Some(target))
        .or_else(|| items.iter().find(|item| item.id == target))
        .or_else(|| items.iter().find(|item| item.derived_slug() == target))
}
