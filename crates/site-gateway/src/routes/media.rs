//! Same-origin proxy for CMS media uploads.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use site_telemetry::UPSTREAM_ERRORS_TOTAL;
use tracing::{debug, warn};

use crate::state::AppState;

/// Proxied files are cached by browsers and CDNs for a day.
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Characters escaped when a decoded segment goes back into a URL.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Re-encode the wildcard capture. `None` for empty or dot segments.
fn encode_file_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
        return None;
    }
    Some(
        segments
            .iter()
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub async fn media(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(file_path) = encode_file_path(&path) else {
        return not_found();
    };
    let url = state.config.upstream.asset_url(&file_path);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let upstream = match state.transport.get_asset(&url, user_agent).await {
        Ok(upstream) => upstream,
        Err(error) => {
            warn!(url = %url, kind = error.kind(), error = %error, "Media fetch failed");
            state.metrics.increment(
                UPSTREAM_ERRORS_TOTAL,
                &[("resource", "/media"), ("kind", error.kind())],
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };
    if !upstream.is_success() {
        debug!(url = %url, status = upstream.status, "Media not found upstream");
        return not_found();
    }

    let content_type = upstream
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let mut response = upstream.body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(MEDIA_CACHE_CONTROL),
    );
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );
    response
}
