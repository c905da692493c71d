//! # Shared Content Crate
//!
//! Content entities projected from the CMS and the pure functions shared by
//! the content client and the gateway.
//!
//! ## Design Principles
//!
//! - **Read-only projections**: entities mirror CMS state and are never
//!   mutated after normalization.
//! - **One resolution path**: every image slot goes through
//!   [`resolve_image`], every derived slug through [`normalize_slug`].
//! - **Explicit device context**: [`Device`] is passed as a parameter, never
//!   held as ambient state.

pub mod entities;
pub mod href;
pub mod image;
pub mod kind;
pub mod news;
pub mod ordering;
pub mod slug;
pub mod tags;
pub mod time;

pub use entities::*;
pub use href::{href_brand, href_of, href_project, route_key};
pub use image::{pick_banner, pick_hero, pick_hover, pick_logo, resolve_image, PLACEHOLDER};
pub use kind::{CollectionKind, Device, UnknownKind};
pub use news::{build_news_filters, NewsFilter};
pub use ordering::{
    compare_display, order_and_navigate, order_by_display, prev_next, Navigation, Neighbors,
};
pub use slug::normalize_slug;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
