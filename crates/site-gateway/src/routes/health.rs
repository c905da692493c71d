use axum::{extract::State, http::HeaderMap, response::Response, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::error::no_store;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub ok: bool,
    pub build_id: String,
    pub region: String,
    pub timestamp: String,
}

/// Edge country of the caller, as reported by the hosting proxy.
fn region(headers: &HeaderMap) -> String {
    ["x-vercel-ip-country", "cf-ipcountry"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    no_store(Json(HealthBody {
        ok: true,
        build_id: state.config.site.build_id.clone(),
        region: region(&headers),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
