//! Page view-models: what each page renders, with every image already
//! resolved for the requesting device and every link already built.

use serde::Serialize;
use shared_content::{
    href_brand, href_of, href_project, pick_banner, pick_hero, pick_hover, pick_logo,
    resolve_image, CollectionKind, ContentItem, Device, ImageSlot, Navigation, NewsFilter,
};

pub const UNTITLED: &str = "Untitled";
pub const SITE_NAME: &str = "19sixtyfive";
pub const TAGLINE: &str = "Experiences flipped our way.";

fn title_of(item: &ContentItem) -> String {
    item.title.clone().unwrap_or_else(|| UNTITLED.to_string())
}

/// Markup stripped and whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Description as plain text, else the excerpt, else the site tagline.
pub fn summary_of(item: &ContentItem) -> String {
    item.description
        .as_deref()
        .map(plain_text)
        .filter(|text| !text.is_empty())
        .or_else(|| item.excerpt.clone())
        .unwrap_or_else(|| TAGLINE.to_string())
}

/// A tile on a listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub href: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub position: u8,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLinks {
    pub prev: String,
    pub next: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

/// Body of a detail page, shared by collection items and brand projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub summary: String,
    pub website_link: Option<String>,
    pub hero: String,
    pub logo: String,
    pub image_1: String,
    pub image_2: String,
    pub banner: String,
    pub gallery: Vec<GalleryImage>,
    pub navigation: Option<NavLinks>,
}

impl DetailView {
    pub fn build(item: &ContentItem, device: Device, navigation: Option<NavLinks>) -> Self {
        Self {
            id: item.id.clone(),
            title: title_of(item),
            description: item.description.clone(),
            summary: summary_of(item),
            website_link: item.website_link.clone().filter(|link| !link.is_empty()),
            hero: pick_hero(item.image_hero.as_ref(), device),
            logo: pick_logo(item.image_logo.as_ref()),
            image_1: resolve_image(item.image(ImageSlot::Image1), device),
            image_2: resolve_image(item.image(ImageSlot::Image2), device),
            banner: pick_banner(item.image_banner.as_ref(), device),
            gallery: item
                .gallery()
                .into_iter()
                .filter(|(_, image)| !image.is_empty())
                .map(|(position, image)| GalleryImage {
                    position,
                    src: resolve_image(Some(image), Device::Desktop),
                })
                .collect(),
            navigation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPage {
    pub kind: CollectionKind,
    pub label: &'static str,
    pub canonical: String,
    pub items: Vec<Card>,
}

impl CollectionPage {
    pub fn build(kind: CollectionKind, items: &[ContentItem]) -> Self {
        Self {
            kind,
            label: kind.label(),
            canonical: format!("/{}", kind.route_segment()),
            items: items
                .iter()
                .map(|item| Card {
                    id: item.id.clone(),
                    title: title_of(item),
                    href: href_of(kind, item),
                    image: pick_hover(item.image_hover.as_ref()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionDetailPage {
    pub kind: CollectionKind,
    pub canonical: String,
    pub breadcrumbs: Vec<Crumb>,
    pub item: DetailView,
}

impl CollectionDetailPage {
    /// `item` is what the page shows; `listed` is the record found in the
    /// listing, which locates the page in the navigation ring.
    pub fn build(
        kind: CollectionKind,
        listed: &ContentItem,
        item: &ContentItem,
        navigation: Option<Navigation>,
        device: Device,
    ) -> Self {
        let listing = format!("/{}", kind.route_segment());
        let canonical = href_of(kind, listed);
        let links = navigation.map(|nav| NavLinks {
            prev: href_of(kind, &nav.prev),
            next: href_of(kind, &nav.next),
        });

        Self {
            kind,
            breadcrumbs: vec![
                Crumb {
                    name: "Home".into(),
                    url: "/".into(),
                },
                Crumb {
                    name: kind.label().into(),
                    url: listing,
                },
                Crumb {
                    name: title_of(item),
                    url: canonical.clone(),
                },
            ],
            canonical,
            item: DetailView::build(item, device, links),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandsPage {
    pub items: Vec<Card>,
}

impl BrandsPage {
    pub fn build(brands: &[ContentItem]) -> Self {
        Self {
            items: brands
                .iter()
                .map(|brand| Card {
                    id: brand.id.clone(),
                    title: brand.title.clone().unwrap_or_else(|| "Brand".into()),
                    href: href_brand(brand),
                    image: pick_hover(brand.image_hover.as_ref()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandSummary {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub href: String,
}

impl BrandSummary {
    fn of(brand: &ContentItem) -> Self {
        Self {
            id: brand.id.clone(),
            title: title_of(brand),
            excerpt: brand.excerpt.clone(),
            href: href_brand(brand),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandPage {
    pub brand: BrandSummary,
    pub projects: Vec<Card>,
}

impl BrandPage {
    pub fn build(brand: &ContentItem, projects: &[ContentItem]) -> Self {
        Self {
            brand: BrandSummary::of(brand),
            projects: projects
                .iter()
                .map(|project| Card {
                    id: project.id.clone(),
                    title: title_of(project),
                    href: href_project(brand, project),
                    image: pick_hover(project.image_hover.as_ref()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPage {
    pub brand: BrandSummary,
    pub canonical: String,
    pub project: DetailView,
}

impl ProjectPage {
    /// Project pages always render desktop imagery.
    pub fn build(brand: &ContentItem, project: &ContentItem, navigation: Option<Navigation>) -> Self {
        let links = navigation.map(|nav| NavLinks {
            prev: href_project(brand, &nav.prev),
            next: href_project(brand, &nav.next),
        });
        Self {
            brand: BrandSummary::of(brand),
            canonical: href_project(brand, project),
            project: DetailView::build(project, Device::Desktop, links),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsCard {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub date: Option<String>,
    pub category: String,
    pub category_name: Option<String>,
    pub link: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsPage {
    pub items: Vec<NewsCard>,
    pub filters: Vec<NewsFilter>,
}

impl NewsPage {
    pub fn build(items: &[ContentItem], filters: Vec<NewsFilter>, device: Device) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| NewsCard {
                    id: item.id.clone(),
                    title: title_of(item),
                    excerpt: item.excerpt.clone(),
                    date: item.date.clone(),
                    category: item
                        .category_slug
                        .as_deref()
                        .filter(|slug| !slug.is_empty())
                        .map(str::to_lowercase)
                        .unwrap_or_else(|| "all".into()),
                    category_name: item.category_name.clone(),
                    link: item.website_link.clone(),
                    image: pick_hero(item.image_hero.as_ref(), device),
                })
                .collect(),
            filters,
        }
    }
}
