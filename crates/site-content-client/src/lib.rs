//! # Site Content Client
//!
//! Reads collections, brands, brand projects and news from the headless CMS.
//!
//! ## Error policy
//!
//! [`ContentClient::fetch_json`] returns [`UpstreamError`]. Every accessor on
//! top of it logs the error, counts it under `upstream_errors_total` and
//! returns an empty list or `None`, so pages degrade instead of failing.
//!
//! ## Caching
//!
//! Responses are cached under their full URL (device included) together
//! with the cache tags of the call. A later hit adds that caller's tags too.
//! A tag purge drops every response that carried the tag.

pub mod cache;
pub mod client;
pub mod error;
pub mod transport;

pub use cache::TaggedCache;
pub use client::{
    select_by_slug, ContentClient, ContentClientConfig, FetchOptions, DEFAULT_FRESHNESS_SECS,
    NEWS_TIMEOUT,
};
pub use error::UpstreamError;
pub use shared_content::order_and_navigate;
pub use transport::{ReqwestTransport, StubTransport, Transport, UpstreamResponse};
