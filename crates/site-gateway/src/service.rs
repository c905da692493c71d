//! Site gateway service: router assembly and server lifecycle.

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::{cleanup_task, MiddlewareStack, RateLimitLayer};
use crate::routes::{self, pages};
use crate::state::AppState;

/// Site gateway service state
pub struct SiteGatewayService {
    state: AppState,
    cleanup_handle: Option<JoinHandle<()>>,
}

impl SiteGatewayService {
    /// Create the service with production wiring.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self::with_state(AppState::from_config(config)?))
    }

    /// Create the service over prepared state.
    pub fn with_state(state: AppState) -> Self {
        Self {
            state,
            cleanup_handle: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind and serve until `signal` resolves, then drain in-flight
    /// requests.
    pub async fn start<F>(&mut self, signal: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = Arc::clone(&self.state.config);
        info!(
            environment = config.environment.as_str(),
            upstream = %config.upstream.base_url,
            "Starting site gateway..."
        );

        self.start_cleanup_tasks();

        let addr = config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        info!(addr = %addr, "HTTP server listening");

        let result = axum::serve(listener, build_router(self.state.clone()))
            .with_graceful_shutdown(async move {
                signal.await;
                info!("Received shutdown signal");
            })
            .await;

        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
        }

        match result {
            Ok(()) => {
                info!("Site gateway stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Serve(e.to_string()))
            }
        }
    }

    /// Start background cleanup tasks
    fn start_cleanup_tasks(&mut self) {
        let limiter = Arc::clone(&self.state.limiter);
        let interval = self.state.config.revalidate.cleanup_interval;
        self.cleanup_handle = Some(tokio::spawn(async move {
            cleanup_task(limiter, interval).await;
        }));
    }
}

/// Build the full router over `state`.
pub fn build_router(state: AppState) -> Router {
    let stack = MiddlewareStack::from_config(&state.config);
    let max_body_bytes = state.config.limits.max_body_bytes;

    let revalidate = Router::new()
        .route(
            "/api/revalidate",
            get(routes::revalidate_get).post(routes::revalidate_post),
        )
        .route_layer(RateLimitLayer::new(
            Arc::clone(&state.limiter),
            state.rate_limit_policy(),
        ));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/metrics", get(routes::metrics))
        .route("/api/media/*path", get(routes::media))
        .route("/sitemap.xml", get(routes::sitemap))
        .route("/robots.txt", get(routes::robots))
        .route("/brands", get(pages::brands))
        .route("/brands/:brand", get(pages::brand))
        .route("/brands/:brand/:project", get(pages::project))
        .route("/news", get(pages::news))
        .route("/:collection", get(pages::collection_list))
        .route("/:collection/:slug", get(pages::collection_detail))
        .merge(revalidate)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(stack.request_context)
                .layer(stack.access_log)
                .layer(stack.security_headers)
                .layer(stack.timeout),
        )
        .with_state(state)
}
