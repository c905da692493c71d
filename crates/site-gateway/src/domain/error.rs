//! Gateway error types and their HTTP mapping.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::domain::sanitize::ValidationError;

/// Body shared by every revalidation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevalidateBody {
    pub revalidated: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub target_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RevalidateBody {
    pub fn success(target_type: &'static str) -> Self {
        Self {
            revalidated: true,
            target_type: Some(target_type),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            revalidated: false,
            target_type: None,
            message: Some(message.into()),
        }
    }
}

/// Why a revalidation request did not purge anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevalidateError {
    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid token")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Provide path or tag")]
    MissingTarget,

    #[error("{0}")]
    Purge(String),
}

impl RevalidateError {
    pub fn status(&self) -> StatusCode {
        match self {
            RevalidateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            RevalidateError::Unauthorized => StatusCode::UNAUTHORIZED,
            RevalidateError::Validation(_) | RevalidateError::MissingTarget => {
                StatusCode::BAD_REQUEST
            }
            RevalidateError::Purge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            RevalidateError::RateLimited { .. } => "rate_limited",
            RevalidateError::Unauthorized => "unauthorized",
            RevalidateError::Validation(_) => "invalid",
            RevalidateError::MissingTarget => "missing_target",
            RevalidateError::Purge(_) => "purge_failed",
        }
    }
}

impl IntoResponse for RevalidateError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = no_store((status, Json(RevalidateBody::failure(self.to_string()))));

        if let RevalidateError::RateLimited { retry_after_secs } = self {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
        }
        response
    }
}

/// Remaining requests in the caller's window.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Render `body` with `Cache-Control: no-store`.
pub fn no_store(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Page-data failures. Upstream trouble never lands here; pages degrade to
/// empty content instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("not found")]
    NotFound,

    #[error("failed to render page: {0}")]
    Render(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Gateway service errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server terminated abnormally
    #[error("server error: {0}")]
    Serve(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
