//! Cache invalidation port and its in-process implementation.
//!
//! Two caches sit behind the site: the content client's fetch cache (keyed
//! by upstream URL, tagged by resource) and the [`PageCache`] of rendered
//! page view-models (keyed by device and path, tagged with every tag of the
//! fetches that built the page). A tag purge hits both. A path purge drops
//! the page and then the fetches behind it: the specific tags recorded on
//! the dropped renderings plus the tags implied by the path itself, so the
//! next render goes back to the origin.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared_content::{tags, CollectionKind, Device, TimeSource};
use site_content_client::{ContentClient, TaggedCache};
use thiserror::Error;
use tracing::info;

/// Freshness of a cached page, matching the fetch freshness behind it.
pub const PAGE_TTL_MS: u64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurgeError {
    #[error("cache purge failed: {0}")]
    Backend(String),
}

/// What a purge removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub fetch_entries: usize,
    pub page_entries: usize,
}

/// Invalidates cached content by tag or by page path.
#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn purge_tag(&self, tag: &str) -> Result<PurgeReport, PurgeError>;

    async fn purge_path(&self, path: &str) -> Result<PurgeReport, PurgeError>;
}

/// Rendered page view-models.
pub struct PageCache {
    pages: TaggedCache<Value>,
    enabled: bool,
}

impl PageCache {
    pub fn new(clock: Arc<dyn TimeSource>, enabled: bool) -> Self {
        Self {
            pages: TaggedCache::new(clock),
            enabled,
        }
    }

    fn key(device: Device, path: &str) -> String {
        format!("{}:{}", device.as_str(), strip_query(path))
    }

    pub fn get(&self, device: Device, path: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        self.pages.get(&Self::key(device, path))
    }

    pub fn insert(&self, device: Device, path: &str, page: Value, tags: &[String]) {
        if self.enabled {
            self.pages
                .insert(Self::key(device, path), page, tags, PAGE_TTL_MS);
        }
    }

    pub fn purge_tag(&self, tag: &str) -> usize {
        self.pages.purge_tag(tag)
    }

    /// Drop both device renderings of `path`. The query string is ignored.
    /// Returns how many were dropped and the tags they carried.
    pub fn purge_path(&self, path: &str) -> (usize, Vec<String>) {
        let mut dropped = 0;
        let mut carried = Vec::new();
        for device in [Device::Desktop, Device::Mobile] {
            if let Some(tags) = self.pages.take_tags(&Self::key(device, path)) {
                dropped += 1;
                carried.extend(tags);
            }
        }
        (dropped, carried)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

/// Fetch tags implied by a page path, independent of what is cached.
pub fn tags_for_path(path: &str) -> Vec<String> {
    let mut segments = strip_query(path).split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("brands"), None) => vec![tags::BRANDS.to_string()],
        (Some("brands"), Some(_)) => {
            vec![tags::BRANDS.to_string(), tags::BRAND_PROJECTS.to_string()]
        }
        (Some("news"), _) => vec![tags::NEWS.to_string()],
        (Some(segment), _) => segment
            .parse::<CollectionKind>()
            .map(|kind| vec![tags::collection(kind)])
            .unwrap_or_default(),
        (None, _) => Vec::new(),
    }
}

/// Tags to purge from the fetch cache for `path`. Umbrella tags recorded on
/// a page would take out every collection or every brand, so only the
/// page's specific tags are kept.
fn fetch_tags_for_path(path: &str, page_tags: Vec<String>) -> Vec<String> {
    let mut purge = tags_for_path(path);
    for tag in page_tags {
        let umbrella = tag == tags::COLLECTIONS || tag == tags::BRAND_PROJECTS;
        if !umbrella && !purge.contains(&tag) {
            purge.push(tag);
        }
    }
    purge
}

/// Purges the content client's fetch cache and the page cache.
pub struct CacheRevalidator {
    content: Arc<ContentClient>,
    pages: Arc<PageCache>,
}

impl CacheRevalidator {
    pub fn new(content: Arc<ContentClient>, pages: Arc<PageCache>) -> Self {
        Self { content, pages }
    }
}

#[async_trait]
impl Revalidator for CacheRevalidator {
    async fn purge_tag(&self, tag: &str) -> Result<PurgeReport, PurgeError> {
        let report = PurgeReport {
            fetch_entries: self.content.purge_tag(tag),
            page_entries: self.pages.purge_tag(tag),
        };
        info!(
            tag = %tag,
            fetch_entries = report.fetch_entries,
            page_entries = report.page_entries,
            "Purged cache tag"
        );
        Ok(report)
    }

    async fn purge_path(&self, path: &str) -> Result<PurgeReport, PurgeError> {
        let (page_entries, page_tags) = self.pages.purge_path(path);
        let fetch_entries: usize = fetch_tags_for_path(path, page_tags)
            .iter()
            .map(|tag| self.content.purge_tag(tag))
            .sum();
        let report = PurgeReport {
            fetch_entries,
            page_entries,
        };
        info!(
            path = %path,
            fetch_entries = report.fetch_entries,
            page_entries = report.page_entries,
            "Purged page path"
        );
        Ok(report)
    }
}
