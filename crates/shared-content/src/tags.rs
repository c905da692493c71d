//! Cache tag vocabulary shared by fetches and invalidation.

use crate::kind::CollectionKind;

pub const COLLECTIONS: &str = "collections";
pub const BRANDS: &str = "brands";
pub const BRAND_PROJECTS: &str = "brand-projects";
pub const NEWS: &str = "news";

/// `collections:<kind>`
pub fn collection(kind: CollectionKind) -> String {
    format!("{COLLECTIONS}:{kind}")
}

/// `brand:<id>`
pub fn brand(brand_id: &str) -> String {
    format!("brand:{brand_id}")
}

/// Tags attached to a collection listing.
pub fn for_collection(kind: CollectionKind) -> Vec<String> {
    vec![COLLECTIONS.to_string(), collection(kind)]
}

/// Tags attached to a brand's project listing.
pub fn for_brand_projects(brand_id: &str) -> Vec<String> {
    vec![BRAND_PROJECTS.to_string(), brand(brand_id)]
}
