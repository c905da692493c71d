//! News category filters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entities::ContentItem;

const ALL: &str = "all";

/// One category chip on the news listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsFilter {
    pub slug: String,
    pub name: String,
    pub count: usize,
}

/// Group news items by lower-cased `category_slug`.
///
/// The `all` filter is always present, first, and counts every item. The
/// remaining filters are ordered by name, then slug.
pub fn build_news_filters(items: &[ContentItem]) -> Vec<NewsFilter> {
    let mut groups: BTreeMap<String, NewsFilter> = BTreeMap::new();

    for item in items {
        let slug = item
            .category_slug
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .unwrap_or(ALL)
            .to_lowercase();
        if slug == ALL {
            continue;
        }
        groups
            .entry(slug.clone())
            .or_insert_with(|| NewsFilter {
                name: item.category_name.clone().unwrap_or_else(|| slug.clone()),
                slug,
                count: 0,
            })
            .count += 1;
    }

    let mut rest: Vec<NewsFilter> = groups.into_values().collect();
    rest.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.slug.cmp(&b.slug)));

    let mut filters = Vec::with_capacity(rest.len() + 1);
    filters.push(NewsFilter {
        slug: ALL.to_string(),
        name: "All".to_string(),
        count: items.len(),
    });
    filters.extend(rest);
    filters
}
