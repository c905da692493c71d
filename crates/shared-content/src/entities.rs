//! # Content Entities
//!
//! Projections of CMS records. The CMS is WordPress behind a custom REST
//! namespace, so payloads are loose: ids arrive as numbers or strings, unset
//! images arrive as `null`, `false` or `""`, and ordering hints may be
//! numeric strings. Deserialization absorbs all of that here so callers only
//! ever see `Option`s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::slug::normalize_slug;

/// Alternative URLs for one image, keyed by target form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub desktop: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
}

impl DeviceImage {
    /// True when no candidate URL is usable.
    pub fn is_empty(&self) -> bool {
        [&self.desktop, &self.mobile, &self.thumbnail]
            .iter()
            .all(|candidate| candidate.as_deref().map_or(true, str::is_empty))
    }
}

/// Fixed image slots carried by every content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Hero,
    Logo,
    Banner,
    Hover,
    Image1,
    Image2,
    /// Gallery position, 1 through [`GALLERY_SLOTS`].
    Gallery(u8),
}

/// Number of gallery slots on a record.
pub const GALLERY_SLOTS: u8 = 8;

/// One CMS record: a collection entry, a brand, a brand project or a news
/// item. Fields that only some variants use are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub featured: Option<String>,
    #[serde(default, deserialize_with = "lenient_order")]
    pub display_order: Option<f64>,

    /// Owning brand for brand projects.
    #[serde(default, deserialize_with = "lenient_string")]
    pub brand_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "lenient_image")]
    pub image_hero: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_logo: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_banner: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_hover: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_1: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_2: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_1: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_2: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_3: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_4: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_5: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_6: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_7: Option<DeviceImage>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image_gallery_8: Option<DeviceImage>,

    /// Fields the projection does not model, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    /// Identity used for navigation: the slug when set, else the id.
    pub fn identity(&self) -> &str {
        match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug,
            _ => &self.id,
        }
    }

    /// Slug derived from the title, empty when there is no title.
    pub fn derived_slug(&self) -> String {
        normalize_slug(self.title.as_deref().unwrap_or_default())
    }

    /// Whether `target` names this record by slug, id or derived slug.
    pub fn matches(&self, target: &str) -> bool {
        self.slug.as_deref() == Some(target) || self.id == target || self.derived_slug() == target
    }

    /// Image stored in `slot`, if any.
    pub fn image(&self, slot: ImageSlot) -> Option<&DeviceImage> {
        match slot {
            ImageSlot::Hero => self.image_hero.as_ref(),
            ImageSlot::Logo => self.image_logo.as_ref(),
            ImageSlot::Banner => self.image_banner.as_ref(),
            ImageSlot::Hover => self.image_hover.as_ref(),
            ImageSlot::Image1 => self.image_1.as_ref(),
            ImageSlot::Image2 => self.image_2.as_ref(),
            ImageSlot::Gallery(1) => self.image_gallery_1.as_ref(),
            ImageSlot::Gallery(2) => self.image_gallery_2.as_ref(),
            ImageSlot::Gallery(3) => self.image_gallery_3.as_ref(),
            ImageSlot::Gallery(4) => self.image_gallery_4.as_ref(),
            ImageSlot::Gallery(5) => self.image_gallery_5.as_ref(),
            ImageSlot::Gallery(6) => self.image_gallery_6.as_ref(),
            ImageSlot::Gallery(7) => self.image_gallery_7.as_ref(),
            ImageSlot::Gallery(8) => self.image_gallery_8.as_ref(),
            ImageSlot::Gallery(_) => None,
        }
    }

    /// Populated gallery images in slot order, with their 1-based position.
    pub fn gallery(&self) -> Vec<(u8, &DeviceImage)> {
        (1..=GALLERY_SLOTS)
            .filter_map(|position| {
                self.image(ImageSlot::Gallery(position))
                    .map(|image| (position, image))
            })
            .collect()
    }
}

/// Paginated list envelope returned by list resources.
///
/// A missing or non-array `items` field yields an empty list, and records
/// that are not objects are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "lenient_items")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub per_page: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_pages: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 0,
            per_page: 0,
            total_pages: 0,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(true)) => Some("1".to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_order<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let order = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(order.filter(|value| value.is_finite()))
}

fn lenient_image<'de, D>(deserializer: D) -> Result<Option<DeviceImage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value::<DeviceImage>(value)
            .ok()
            .filter(|image| !image.is_empty()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64().unwrap_or_default(),
        Some(Value::String(text)) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_id_and_order_are_normalized() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": 42,
            "title": "Arc Sessions",
            "display_order": "3"
        }))
        .unwrap();

        assert_eq!(item.id, "42");
        assert_eq!(item.display_order, Some(3.0));
        assert_eq!(item.slug, None);
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let item: ContentItem =
            serde_json::from_value(json!({"id": "1", "venue": "Marina Bay"})).unwrap();
        assert_eq!(item.extra.get("venue"), Some(&json!("Marina Bay")));
    }

    #[test]
    fn test_unset_images_become_none() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "1",
            "image_hero": false,
            "image_logo": null,
            "image_banner": {"desktop": "", "mobile": null},
            "image_1": {"mobile": "/m.png"}
        }))
        .unwrap();

        assert!(item.image_hero.is_none());
        assert!(item.image_logo.is_none());
        assert!(item.image_banner.is_none());
        assert_eq!(
            item.image(ImageSlot::Image1).and_then(|i| i.mobile.as_deref()),
            Some("/m.png")
        );
    }

    #[test]
    fn test_non_numeric_order_is_absent() {
        let item: ContentItem =
            serde_json::from_value(json!({"id": "1", "display_order": "soon"})).unwrap();
        assert_eq!(item.display_order, None);
    }

    #[test]
    fn test_gallery_keeps_slot_positions() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "1",
            "image_gallery_2": {"desktop": "/two.png"},
            "image_gallery_7": {"thumbnail": "/seven.png"}
        }))
        .unwrap();

        let positions: Vec<u8> = item.gallery().into_iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![2, 7]);
        assert!(item.image(ImageSlot::Gallery(9)).is_none());
    }

    #[test]
    fn test_identity_prefers_slug() {
        let mut item = ContentItem {
            id: "7".into(),
            ..Default::default()
        };
        assert_eq!(item.identity(), "7");

        item.slug = Some(String::new());
        assert_eq!(item.identity(), "7");

        item.slug = Some("neon-nights".into());
        assert_eq!(item.identity(), "neon-nights");
    }

    #[test]
    fn test_matches_by_slug_id_or_title() {
        let item = ContentItem {
            id: "1".into(),
            title: Some("Neon Nights".into()),
            ..Default::default()
        };
        assert!(item.matches("1"));
        assert!(item.matches("neon-nights"));
        assert!(!item.matches("neon"));
    }

    #[test]
    fn test_page_tolerates_missing_or_bad_items() {
        let page: Page<ContentItem> = serde_json::from_value(json!({"total": 3})).unwrap();
        assert!(page.items.is_empty());

        let page: Page<ContentItem> =
            serde_json::from_value(json!({"items": "nope", "total": "2"})).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);

        let page: Page<ContentItem> =
            serde_json::from_value(json!({"items": [{"id": "1"}, 5, {"id": 2}]})).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
