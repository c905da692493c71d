//! Access logging: one span and one event per request.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::{body::Body, http::Request, response::Response};
use tower::{Layer, Service};
use tracing::{info, info_span, warn, Instrument, Span};

use crate::middleware::request_context::{inbound_request_id, RequestId};

/// Access log layer
#[derive(Clone, Default)]
pub struct AccessLogLayer;

impl AccessLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

/// Access log service
#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for AccessLogService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .or_else(|| inbound_request_id(&req))
            .unwrap_or_default();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let span = info_span!(
            "http_request",
            request_id = %request_id,
            http.method = %method,
            http.target = %path,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(req).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                match &result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        Span::current().record("http.status_code", status);
                        info!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            status,
                            duration_ms,
                            "request"
                        );
                    }
                    Err(_) => {
                        warn!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            duration_ms,
                            "request failed"
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
