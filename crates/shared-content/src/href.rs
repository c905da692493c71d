//! Public hrefs for content records.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::entities::ContentItem;
use crate::kind::CollectionKind;

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Route segment for a record: slug, else derived slug, else id.
pub fn route_key(item: &ContentItem) -> String {
    if let Some(slug) = item.slug.as_deref().filter(|s| !s.is_empty()) {
        return slug.to_string();
    }
    let derived = item.derived_slug();
    if derived.is_empty() {
        item.id.clone()
    } else {
        derived
    }
}

fn segment(item: &ContentItem) -> String {
    utf8_percent_encode(&route_key(item), COMPONENT).to_string()
}

pub fn href_of(kind: CollectionKind, item: &ContentItem) -> String {
    format!("/{}/{}", kind.route_segment(), segment(item))
}

pub fn href_brand(brand: &ContentItem) -> String {
    format!("/brands/{}", segment(brand))
}

pub fn href_project(brand: &ContentItem, project: &ContentItem) -> String {
    format!("/brands/{}/{}", segment(brand), segment(project))
}
