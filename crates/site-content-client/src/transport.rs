//! HTTP transport port.
//!
//! [`ReqwestTransport`] talks to the real CMS. [`StubTransport`] serves canned
//! bodies and records every URL it was asked for.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;

use crate::error::UpstreamError;

/// Status, content type and raw body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `GET url` with the API key and JSON accept headers attached.
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError>;

    /// Issue `GET url` for a media file, forwarding the caller's
    /// `User-Agent`. No API key is sent.
    async fn get_asset(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

/// Production transport backed by pooled [`reqwest::Client`]s: one for the
/// content API, one for media files.
pub struct ReqwestTransport {
    client: Client,
    assets: Client,
}

impl ReqwestTransport {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut api_key = HeaderValue::from_str(api_key).map_err(|e| UpstreamError::Transport {
            url: String::new(),
            message: format!("API key is not a valid header value: {e}"),
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let build = |headers: HeaderMap| {
            Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .connect_timeout(timeout.min(Duration::from_secs(5)))
                .build()
                .map_err(|e| UpstreamError::Transport {
                    url: String::new(),
                    message: e.to_string(),
                })
        };

        Ok(Self {
            client: build(headers)?,
            assets: build(HeaderMap::new())?,
        })
    }
}

async fn read(
    url: &str,
    request: reqwest::RequestBuilder,
) -> Result<UpstreamResponse, UpstreamError> {
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
            }
        } else {
            UpstreamError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    };

    let response = request.send().await.map_err(map_err)?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(map_err)?;

    Ok(UpstreamResponse {
        status,
        content_type,
        body: body.to_vec(),
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        read(url, self.client.get(url)).await
    }

    async fn get_asset(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        read(url, self.assets.get(url).header(USER_AGENT, user_agent)).await
    }
}

/// Canned responses keyed by URL without its query string.
///
/// Unknown URLs answer 404. URLs marked with [`StubTransport::fail`] error
/// at the transport level. An optional delay applies to every call.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, UpstreamResponse>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        let body: String = body.into();
        self.routes
            .lock()
            .insert(url.to_string(), UpstreamResponse::new(status, body));
        self
    }

    /// Serve `body` with a 200 and the given content type.
    pub fn respond_asset(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<Vec<u8>>,
    ) -> &Self {
        let mut response = UpstreamResponse::new(200, body);
        response.content_type = content_type.map(str::to_string);
        self.routes.lock().insert(url.to_string(), response);
        self
    }

    /// Make every call for `url` fail before a response arrives.
    pub fn fail(&self, url: &str) -> &Self {
        self.failing.lock().insert(url.to_string());
        self
    }

    pub fn respond_json(&self, url: &str, body: &serde_json::Value) -> &Self {
        self.respond(url, 200, body.to_string())
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Every URL requested so far, in call order, query strings included.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// User agents forwarded with asset requests, in call order.
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().clone()
    }

    async fn answer(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.requests.lock().push(url.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let route = url.split('?').next().unwrap_or(url);
        if self.failing.lock().contains(route) {
            return Err(UpstreamError::Transport {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self
            .routes
            .lock()
            .get(route)
            .cloned()
            .unwrap_or_else(|| UpstreamResponse::new(404, Vec::new())))
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.answer(url).await
    }

    async fn get_asset(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.user_agents.lock().push(user_agent.to_string());
        self.answer(url).await
    }
}
