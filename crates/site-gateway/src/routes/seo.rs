//! `sitemap.xml` and `robots.txt`.

use std::fmt::Write as _;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use shared_content::{href_of, href_project, CollectionKind, ContentItem, Device};

use crate::domain::env::SiteEnvironment;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

impl SitemapEntry {
    fn new(loc: String, change_frequency: ChangeFrequency, priority: f32) -> Self {
        Self {
            loc,
            change_frequency,
            priority,
        }
    }
}

/// Routes listed even when the content API is unreachable.
pub fn base_routes(site_url: &str) -> Vec<SitemapEntry> {
    let mut routes = vec![SitemapEntry::new(
        site_url.to_string(),
        ChangeFrequency::Weekly,
        1.0,
    )];
    routes.extend(CollectionKind::ALL.iter().map(|kind| {
        SitemapEntry::new(
            format!("{site_url}/{}", kind.route_segment()),
            ChangeFrequency::Weekly,
            0.9,
        )
    }));
    routes.push(SitemapEntry::new(
        format!("{site_url}/brands"),
        ChangeFrequency::Weekly,
        0.9,
    ));
    routes.push(SitemapEntry::new(
        format!("{site_url}/news"),
        ChangeFrequency::Daily,
        0.8,
    ));
    routes
}

/// Base routes, then every collection item, then every brand project.
pub fn build_sitemap(
    site_url: &str,
    collections: &[(CollectionKind, Vec<ContentItem>)],
    brands: &[(ContentItem, Vec<ContentItem>)],
) -> Vec<SitemapEntry> {
    let mut entries = base_routes(site_url);

    for (kind, items) in collections {
        entries.extend(items.iter().map(|item| {
            SitemapEntry::new(
                format!("{site_url}{}", href_of(*kind, item)),
                ChangeFrequency::Monthly,
                0.8,
            )
        }));
    }

    for (brand, projects) in brands {
        entries.extend(projects.iter().map(|project| {
            SitemapEntry::new(
                format!("{site_url}{}", href_project(brand, project)),
                ChangeFrequency::Monthly,
                0.7,
            )
        }));
    }

    entries
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_sitemap(entries: &[SitemapEntry], now: DateTime<Utc>) -> String {
    let lastmod = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        let _ = writeln!(
            xml,
            "<url>\n<loc>{}</loc>\n<lastmod>{lastmod}</lastmod>\n<changefreq>{}</changefreq>\n<priority>{:.1}</priority>\n</url>",
            escape_xml(&entry.loc),
            entry.change_frequency.as_str(),
            entry.priority,
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn render_robots(environment: SiteEnvironment, site_url: &str) -> String {
    if !environment.is_production() {
        return "User-Agent: *\nDisallow: /\n".to_string();
    }

    let mut robots = String::new();
    for agent in ["*", "Googlebot"] {
        let _ = write!(
            robots,
            "User-Agent: {agent}\nAllow: /\nDisallow: /api/\nDisallow: /_next/\nDisallow: /admin/\n\n"
        );
    }
    let _ = write!(robots, "Host: {site_url}\nSitemap: {site_url}/sitemap.xml\n");
    robots
}

fn with_content_type(body: String, content_type: &'static str) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub async fn sitemap(State(state): State<AppState>) -> Response {
    let device = Device::Desktop;
    let content = &state.content;

    let (collections, brands) = tokio::join!(
        join_all(CollectionKind::ALL.into_iter().map(|kind| async move {
            (kind, content.list_collection(kind, device).await)
        })),
        content.list_brands(device),
    );
    let brands = join_all(brands.into_iter().map(|brand| async move {
        let projects = content.list_brand_projects(&brand.id, device).await;
        (brand, projects)
    }))
    .await;

    let entries = build_sitemap(&state.config.site.public_url, &collections, &brands);
    with_content_type(
        render_sitemap(&entries, Utc::now()),
        "application/xml; charset=utf-8",
    )
}

pub async fn robots(State(state): State<AppState>) -> Response {
    with_content_type(
        render_robots(state.config.environment, &state.config.site.public_url),
        "text/plain; charset=utf-8",
    )
}
