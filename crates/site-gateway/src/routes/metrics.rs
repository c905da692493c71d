use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use site_telemetry::HTTP_REQUESTS_TOTAL;

use crate::domain::error::no_store;
use crate::middleware::rate_limit::client_identifier;
use crate::state::AppState;

pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Counts the scrape itself, then renders every counter.
pub async fn metrics(State(state): State<AppState>, req: Request) -> Response {
    let client = client_identifier(&req);
    state
        .metrics
        .increment(HTTP_REQUESTS_TOTAL, &[("client", client.as_str())]);

    let mut response = no_store(state.metrics.render().into_response());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(METRICS_CONTENT_TYPE),
    );
    response
}
