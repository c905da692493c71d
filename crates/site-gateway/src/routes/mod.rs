//! HTTP handlers.

pub mod health;
pub mod media;
pub mod metrics;
pub mod pages;
pub mod revalidate;
pub mod seo;

pub use health::health;
pub use media::media;
pub use metrics::metrics;
pub use revalidate::{revalidate_get, revalidate_post};
pub use seo::{robots, sitemap};
