//! `/api/revalidate`: authenticated cache invalidation.
//!
//! Rate limiting happens in [`RateLimitLayer`](crate::middleware::RateLimitLayer)
//! before these handlers run. The handlers then check the shared secret,
//! pick exactly one target, sanitize it and purge.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use site_telemetry::REVALIDATIONS_TOTAL;
use tracing::{info, warn};

use crate::domain::error::{no_store, RevalidateBody, RevalidateError, RATE_LIMIT_REMAINING};
use crate::domain::sanitize::{sanitize_path, sanitize_tag};
use crate::middleware::rate_limit::RateLimitDecision;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateQuery {
    pub secret: Option<String>,
    pub tag: Option<String>,
    pub path: Option<String>,
}

/// POST body. Anything that does not parse as this shape is treated as an
/// empty payload.
#[derive(Debug, Default, Deserialize)]
pub struct RevalidatePayload {
    pub token: Option<String>,
    pub path: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<String>,
}

impl RevalidatePayload {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice::<Option<Self>>(body)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

/// The one cache target a request acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Tag(String),
    Path(String),
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Tag(_) => "tag",
            Target::Path(_) => "path",
        }
    }

    /// POST selection: `type` decides when it is `tag` or `path`, otherwise
    /// a tag wins when one is present. A requested tag that is missing
    /// falls back to the path.
    pub fn from_payload(payload: &RevalidatePayload) -> Result<Self, RevalidateError> {
        let tag = non_empty(payload.tag.as_deref());
        let path = non_empty(payload.path.as_deref());
        let wants_tag = match payload.target_type.as_deref() {
            Some("tag") => true,
            Some("path") => false,
            _ => tag.is_some(),
        };

        match (wants_tag, tag, path) {
            (true, Some(tag), _) => Ok(Target::Tag(sanitize_tag(tag)?)),
            (_, _, Some(path)) => Ok(Target::Path(sanitize_path(path)?)),
            _ => Err(RevalidateError::MissingTarget),
        }
    }

    /// GET selection: tag preferred over path.
    pub fn from_query(query: &RevalidateQuery) -> Result<Self, RevalidateError> {
        if let Some(tag) = non_empty(query.tag.as_deref()) {
            return Ok(Target::Tag(sanitize_tag(tag)?));
        }
        if let Some(path) = non_empty(query.path.as_deref()) {
            return Ok(Target::Path(sanitize_path(path)?));
        }
        Err(RevalidateError::MissingTarget)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

pub async fn revalidate_post(
    State(state): State<AppState>,
    decision: Option<Extension<RateLimitDecision>>,
    Query(query): Query<RevalidateQuery>,
    body: Bytes,
) -> Response {
    let payload = RevalidatePayload::parse(&body);
    let token = payload.token.as_deref().map(str::trim);
    let provided = query.secret.as_deref().or(token);

    let result = match authorize(&state, provided) {
        Ok(()) => match Target::from_payload(&payload) {
            Ok(target) => purge(&state, target).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    respond(&state, result, decision)
}

pub async fn revalidate_get(
    State(state): State<AppState>,
    decision: Option<Extension<RateLimitDecision>>,
    Query(query): Query<RevalidateQuery>,
) -> Response {
    let result = match authorize(&state, query.secret.as_deref()) {
        Ok(()) => match Target::from_query(&query) {
            Ok(target) => purge(&state, target).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    respond(&state, result, decision)
}

fn authorize(state: &AppState, provided: Option<&str>) -> Result<(), RevalidateError> {
    match provided {
        Some(candidate)
            if !candidate.is_empty() && state.config.revalidate.secret.matches(candidate) =>
        {
            Ok(())
        }
        _ => Err(RevalidateError::Unauthorized),
    }
}

async fn purge(state: &AppState, target: Target) -> Result<&'static str, RevalidateError> {
    let kind = target.kind();
    let result = match &target {
        Target::Tag(tag) => state.revalidator.purge_tag(tag).await,
        Target::Path(path) => state.revalidator.purge_path(path).await,
    };

    match result {
        Ok(report) => {
            info!(
                target = ?target,
                fetch_entries = report.fetch_entries,
                page_entries = report.page_entries,
                "Revalidated"
            );
            Ok(kind)
        }
        Err(e) => Err(RevalidateError::Purge(e.to_string())),
    }
}

fn respond(
    state: &AppState,
    result: Result<&'static str, RevalidateError>,
    decision: Option<Extension<RateLimitDecision>>,
) -> Response {
    match result {
        Ok(kind) => {
            state
                .metrics
                .increment(REVALIDATIONS_TOTAL, &[("outcome", "ok"), ("type", kind)]);
            let mut response = no_store(Json(RevalidateBody::success(kind)));
            if let Some(Extension(decision)) = decision {
                response.headers_mut().insert(
                    RATE_LIMIT_REMAINING,
                    HeaderValue::from(decision.remaining),
                );
            }
            response
        }
        Err(e) => {
            warn!(outcome = e.outcome(), error = %e, "Revalidation rejected");
            state
                .metrics
                .increment(REVALIDATIONS_TOTAL, &[("outcome", e.outcome())]);
            e.into_response()
        }
    }
}
