//! Response hardening: Content-Security-Policy, browser security headers
//! and `X-Robots-Tag` outside production.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    response::Response,
};
use tower::{Layer, Service};

use crate::domain::env::SiteEnvironment;
use crate::middleware::request_context::CspNonce;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

const YOUTUBE_FRAMES: &str = "https://www.youtube.com https://www.youtube-nocookie.com";
const YOUTUBE_THUMBNAILS: &str = "https://i.ytimg.com";

const UNINDEXED_PREFIXES: [&str; 4] = ["/_next", "/api", "/images/", "/videos/"];
const UNINDEXED_SUFFIXES: [&str; 5] = [".xml", ".txt", ".json", ".svg", ".ico"];

/// Settings for [`SecurityHeadersLayer`].
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    pub environment: SiteEnvironment,
    /// Origin of the content API, allowed for images, media and fetches.
    pub backend_origin: String,
}

impl SecurityHeadersConfig {
    /// The policy for one request.
    pub fn content_security_policy(&self, nonce: &CspNonce) -> String {
        let backend = &self.backend_origin;
        let mut script_src = format!("'self' 'strict-dynamic' 'nonce-{}'", nonce.as_str());
        if !self.environment.is_production() {
            script_src.push_str(" 'unsafe-eval'");
        }

        [
            "default-src 'self'".to_string(),
            format!("script-src {script_src}"),
            "style-src 'self' 'unsafe-inline'".to_string(),
            format!("img-src 'self' data: {backend} {YOUTUBE_THUMBNAILS}"),
            "font-src 'self' data:".to_string(),
            format!("connect-src 'self' {backend}"),
            format!("media-src 'self' {backend}"),
            format!("frame-src {YOUTUBE_FRAMES}"),
            "object-src 'none'".to_string(),
            "frame-ancestors 'none'".to_string(),
            "base-uri 'self'".to_string(),
            "form-action 'self'".to_string(),
        ]
        .join("; ")
    }
}

/// Whether a non-production response for `path` gets `X-Robots-Tag`.
pub fn should_noindex(path: &str) -> bool {
    !UNINDEXED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
        && !UNINDEXED_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

fn apply_static_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        PERMISSIONS_POLICY,
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
    );
}

/// Security headers layer
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    config: Arc<SecurityHeadersConfig>,
}

impl SecurityHeadersLayer {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Security headers service
#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    config: Arc<SecurityHeadersConfig>,
}

impl<S> Service<Request<Body>> for SecurityHeadersService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let nonce = match req.extensions().get::<CspNonce>() {
            Some(nonce) => nonce.clone(),
            None => {
                let nonce = CspNonce::generate();
                req.extensions_mut().insert(nonce.clone());
                nonce
            }
        };
        let noindex = !config.environment.is_production() && should_noindex(req.uri().path());

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            let headers = response.headers_mut();

            if let Ok(policy) = HeaderValue::from_str(&config.content_security_policy(&nonce)) {
                headers.insert(header::CONTENT_SECURITY_POLICY, policy);
            }
            apply_static_headers(headers);
            if noindex {
                headers.insert(
                    X_ROBOTS_TAG,
                    HeaderValue::from_static("noindex, nofollow, noarchive"),
                );
            }

            Ok(response)
        })
    }
}
