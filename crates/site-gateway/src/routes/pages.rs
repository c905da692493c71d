//! Page-data routes.
//!
//! Every page renders from content that may be empty: upstream trouble
//! never fails a page, only a slug that resolves to nothing does (404).
//! Rendered view-models are kept in the page cache under the tags of the
//! fetches behind them.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared_content::{
    build_news_filters, order_and_navigate, tags, CollectionKind, Device,
};
use site_content_client::NEWS_TIMEOUT;
use tracing::debug;

use crate::domain::error::PageError;
use crate::state::AppState;
use crate::views::{
    BrandPage, BrandsPage, CollectionDetailPage, CollectionPage, NewsPage, ProjectPage,
};

/// Device of the caller, from its `User-Agent`.
pub fn device_of(headers: &HeaderMap) -> Device {
    Device::from_user_agent(headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()))
}

fn kind_of(segment: &str) -> Result<CollectionKind, PageError> {
    segment.parse().map_err(|_| PageError::NotFound)
}

fn cached(state: &AppState, device: Device, uri: &Uri) -> Option<Response> {
    let page = state.pages.get(device, uri.path())?;
    debug!(path = %uri.path(), device = device.as_str(), "Page cache hit");
    Some(Json(page).into_response())
}

fn render<V: Serialize>(
    state: &AppState,
    device: Device,
    uri: &Uri,
    view: &V,
    tags: &[String],
) -> Result<Response, PageError> {
    let page = serde_json::to_value(view).map_err(|e| PageError::Render(e.to_string()))?;
    state.pages.insert(device, uri.path(), page.clone(), tags);
    Ok(Json(page).into_response())
}

pub async fn collection_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, PageError> {
    let kind = kind_of(&collection)?;
    let device = device_of(&headers);
    if let Some(page) = cached(&state, device, &uri) {
        return Ok(page);
    }

    let items = state.content.list_collection(kind, device).await;
    render(
        &state,
        device,
        &uri,
        &CollectionPage::build(kind, &items),
        &tags::for_collection(kind),
    )
}

pub async fn collection_detail(
    State(state): State<AppState>,
    Path((collection, slug)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, PageError> {
    let kind = kind_of(&collection)?;
    let device = device_of(&headers);
    if let Some(page) = cached(&state, device, &uri) {
        return Ok(page);
    }

    let (list, found) = tokio::join!(
        state.content.list_collection(kind, device),
        state.content.find_by_slug(kind, &slug, device),
    );
    let listed = found.ok_or(PageError::NotFound)?;

    // The by-id fetch counts a view upstream; the listed record stands in
    // when it fails.
    let shown = state
        .content
        .fetch_detail_for_view_increment(kind, &listed.id, device)
        .await
        .unwrap_or_else(|| listed.clone());

    let navigation = order_and_navigate(&list, &listed);
    render(
        &state,
        device,
        &uri,
        &CollectionDetailPage::build(kind, &listed, &shown, navigation, device),
        &tags::for_collection(kind),
    )
}

// Brand pages are authored for desktop only.

pub async fn brands(State(state): State<AppState>, uri: Uri) -> Result<Response, PageError> {
    let device = Device::Desktop;
    if let Some(page) = cached(&state, device, &uri) {
        return Ok(page);
    }

    let brands = state.content.list_brands(device).await;
    render(
        &state,
        device,
        &uri,
        &BrandsPage::build(&brands),
        &[tags::BRANDS.to_string()],
    )
}

pub async fn brand(
    State(state): State<AppState>,
    Path(brand_slug): Path<String>,
    uri: Uri,
) -> Result<Response, PageError> {
    let device = Device::Desktop;
    if let Some(page) = cached(&state, device, &uri) {
        return Ok(page);
    }

    let brand = state
        .content
        .find_brand_by_slug(&brand_slug, device)
        .await
        .ok_or(PageError::NotFound)?;
    let projects = state.content.list_brand_projects(&brand.id, device).await;

    let mut page_tags = vec![tags::BRANDS.to_string()];
    page_tags.extend(tags::for_brand_projects(&brand.id));
    render(
        &state,
        device,
        &uri,
        &BrandPage::build(&brand, &projects),
        &page_tags,
    )
}

pub async fn project(
    State(state): State<AppState>,
    Path((brand_slug, project_slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, PageError> {
    let device = Device::Desktop;
    if let Some(page) = cached(&state, device, &uri) {
        return Ok(page);
    }

    let brand = state
        .content
        .find_brand_by_slug(&brand_slug, device)
        .await
        .ok_or(PageError::NotFound)?;
    let (projects, found) = tokio::join!(
        state.content.list_brand_projects(&brand.id, device),
        state.content.find_project_by_slug(&brand.id, &project_slug, device),
    );
    let project = found.ok_or(PageError::NotFound)?;
    let navigation = order_and_navigate(&projects, &project);

    let mut page_tags = vec![tags::BRANDS.to_string()];
    page_tags.extend(tags::for_brand_projects(&brand.id));
    render(
        &state,
        device,
        &uri,
        &ProjectPage::build(&brand, &project, navigation),
        &page_tags,
    )
}

/// Always rendered fresh, with the upstream capped at [`NEWS_TIMEOUT`].
pub async fn news(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let device = device_of(&headers);
    let items = state.content.list_news_within(device, NEWS_TIMEOUT).await;
    let filters = build_news_filters(&items);
    Json(NewsPage::build(&items, filters, device)).into_response()
}
