//! Upstream error types.

use thiserror::Error;

/// Failure talking to the content API.
///
/// Accessors never return this to callers; it exists so the failure can be
/// logged and counted before being collapsed into an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("GET {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} returned an undecodable body: {message}")]
    Decode { url: String, message: String },
}

impl UpstreamError {
    /// Short label for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Status { .. } => "status",
            UpstreamError::Transport { .. } => "transport",
            UpstreamError::Timeout { .. } => "timeout",
            UpstreamError::Decode { .. } => "decode",
        }
    }

    /// HTTP status, when the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
