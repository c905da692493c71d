//! Shared harness: a stubbed CMS behind the fully layered router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_content::ManualTimeSource;
use site_content_client::StubTransport;
use site_gateway::domain::Secret;
use site_gateway::{
    build_router, AppState, GatewayConfig, PurgeError, PurgeReport, Revalidator, SiteEnvironment,
};
use tower::ServiceExt;

pub const BASE: &str = "http://cms.test/wp-json/custom/v1";
pub const SECRET: &str = "hook-secret";
pub const START_MS: u64 = 1_700_000_000_000;

/// One purge call observed by [`RecordingRevalidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeCall {
    Tag(String),
    Path(String),
}

/// Revalidator that only records what it was asked to purge.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    calls: Mutex<Vec<PurgeCall>>,
}

impl RecordingRevalidator {
    pub fn calls(&self) -> Vec<PurgeCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
    async fn purge_tag(&self, tag: &str) -> Result<PurgeReport, PurgeError> {
        self.calls.lock().push(PurgeCall::Tag(tag.to_string()));
        Ok(PurgeReport::default())
    }

    async fn purge_path(&self, path: &str) -> Result<PurgeReport, PurgeError> {
        self.calls.lock().push(PurgeCall::Path(path.to_string()));
        Ok(PurgeReport::default())
    }
}

pub fn config(environment: SiteEnvironment, max_requests: u32) -> GatewayConfig {
    let mut config = GatewayConfig {
        environment,
        ..GatewayConfig::default()
    };
    config.upstream.base_url = BASE.to_string();
    config.revalidate.secret = Secret::new(SECRET);
    config.revalidate.max_requests = max_requests;
    config.site.build_id = "build-42".to_string();
    config
}

pub struct Harness {
    pub stub: Arc<StubTransport>,
    pub clock: Arc<ManualTimeSource>,
    pub state: AppState,
    pub router: Router,
}

impl Harness {
    pub fn new(config: GatewayConfig) -> Self {
        let stub = Arc::new(StubTransport::new());
        let clock = Arc::new(ManualTimeSource::new(START_MS));
        let state = AppState::new(config, stub.clone(), clock.clone());
        Self::assemble(stub, clock, state)
    }

    pub fn development() -> Self {
        Self::new(config(SiteEnvironment::Development, 30))
    }

    pub fn production() -> Self {
        Self::new(config(SiteEnvironment::Production, 30))
    }

    /// Harness whose revalidator records instead of purging.
    pub fn recording(max_requests: u32) -> (Self, Arc<RecordingRevalidator>) {
        let recorder = Arc::new(RecordingRevalidator::default());
        let stub = Arc::new(StubTransport::new());
        let clock = Arc::new(ManualTimeSource::new(START_MS));
        let state = AppState::new(
            config(SiteEnvironment::Development, max_requests),
            stub.clone(),
            clock.clone(),
        )
        .with_revalidator(recorder.clone());
        (Self::assemble(stub, clock, state), recorder)
    }

    fn assemble(stub: Arc<StubTransport>, clock: Arc<ManualTimeSource>, state: AppState) -> Self {
        let router = build_router(state.clone());
        Self {
            stub,
            clock,
            state,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub fn serve_festivals(&self) {
        self.stub.respond_json(&format!("{BASE}/festival"), &festival_listing());
        self.stub.respond_json(
            &format!("{BASE}/festival/1"),
            &json!({
                "id": "1",
                "title": "Neon Nights",
                "description": "<p>Lights &amp; <b>music</b> all night</p>",
                "image_1": {"desktop": "https://cdn.test/n1.jpg", "mobile": "https://cdn.test/n1-m.jpg"},
                "views": 12
            }),
        );
    }
}

pub fn festival_listing() -> Value {
    json!({
        "items": [
            {"id": "1", "title": "Neon Nights", "slug": null, "display_order": 2},
            {"id": "2", "title": "Arc Sessions", "display_order": 1}
        ],
        "total": 2, "page": 1, "per_page": 20, "total_pages": 1
    })
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
