//! Display ordering and circular prev/next navigation.

use std::cmp::Ordering;

use serde::Serialize;

use crate::entities::ContentItem;

/// Total order for collection listings.
///
/// Ascending `display_order` with unordered items last, then title compared
/// case-insensitively, then by raw bytes so distinct titles never tie.
pub fn compare_display(a: &ContentItem, b: &ContentItem) -> Ordering {
    let by_order = match (a.display_order, b.display_order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| {
        let a_title = a.title.as_deref().unwrap_or_default();
        let b_title = b.title.as_deref().unwrap_or_default();
        a_title
            .to_lowercase()
            .cmp(&b_title.to_lowercase())
            .then_with(|| a_title.cmp(b_title))
    })
}

/// Sort in place. The sort is stable, so fully equal items keep input order.
pub fn order_by_display(items: &mut [ContentItem]) {
    items.sort_by(compare_display);
}

/// Neighbours of an item in an ordered list, borrowed from that list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors<'a> {
    pub prev: &'a ContentItem,
    pub next: &'a ContentItem,
}

/// Owned navigation, for view-models that outlive the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    pub prev: ContentItem,
    pub next: ContentItem,
}

impl From<Neighbors<'_>> for Navigation {
    fn from(neighbors: Neighbors<'_>) -> Self {
        Self {
            prev: neighbors.prev.clone(),
            next: neighbors.next.clone(),
        }
    }
}

/// Circular neighbours of `current` in an already ordered list, located by
/// identity (slug, else id). `None` when the list is empty or does not
/// contain `current`.
pub fn prev_next<'a>(ordered: &'a [ContentItem], current: &ContentItem) -> Option<Neighbors<'a>> {
    let key = current.identity();
    let index = ordered.iter().position(|item| item.identity() == key)?;
    let len = ordered.len();
    Some(Neighbors {
        prev: &ordered[(index + len - 1) % len],
        next: &ordered[(index + 1) % len],
    })
}

/// Order `items` for display and locate the neighbours of `current`.
pub fn order_and_navigate(items: &[ContentItem], current: &ContentItem) -> Option<Navigation> {
    let mut ordered = items.to_vec();
    order_by_display(&mut ordered);
    prev_next(&ordered, current).map(Navigation::from)
}
