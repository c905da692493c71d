//! Site Gateway - HTTP surface of the 19sixtyfive site.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         SITE GATEWAY                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                    Middleware Stack                        │  │
//! │  │  RequestContext → AccessLog → SecurityHeaders → Timeout    │  │
//! │  └───────┬──────────────────┬─────────────────────┬───────────┘  │
//! │          │                  │                     │              │
//! │  ┌───────┴──────┐  ┌────────┴────────┐  ┌─────────┴──────────┐   │
//! │  │  Page data   │  │ /api/revalidate │  │ health / metrics / │   │
//! │  │  (cached)    │  │ (rate limited)  │  │ sitemap / robots   │   │
//! │  └───────┬──────┘  └────────┬────────┘  └────────────────────┘   │
//! │          │                  │                                    │
//! │  ┌───────┴──────────────────┴────────┐                           │
//! │  │  ContentClient + PageCache        │                           │
//! │  │  (tagged caches, purge by tag)    │                           │
//! │  └───────────────┬───────────────────┘                           │
//! └──────────────────┼───────────────────────────────────────────────┘
//!                    │
//!               Headless CMS
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use site_gateway::{EnvResolver, GatewayConfig, SiteGatewayService};
//!
//! let config = GatewayConfig::from_env(&EnvResolver::from_process())?;
//! let mut service = SiteGatewayService::new(config)?;
//! service.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```
//!
//! # Security
//!
//! - Shared-secret revalidation, compared in constant time
//! - Fixed-window rate limiting per client on the webhook
//! - Per-request CSP nonce and hardened response headers
//! - Request body and duration limits
//!
//! `/api/media/*path` relays CMS uploads from the same origin as the pages.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod revalidator;
pub mod routes;
pub mod service;
pub mod state;
pub mod views;

pub use domain::config::GatewayConfig;
pub use domain::env::{EnvResolver, MapEnv, SiteEnvironment};
pub use domain::error::{GatewayError, PageError, RevalidateError};
pub use revalidator::{CacheRevalidator, PageCache, PurgeError, PurgeReport, Revalidator};
pub use service::{build_router, SiteGatewayService};
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
