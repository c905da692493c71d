//! Environment resolution.
//!
//! Values are trimmed, an all-whitespace value counts as unset, and every
//! lookup is memoized for the life of the resolver. Configuration is fixed
//! for the life of a process, so a second lookup never refreshes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use dashmap::DashMap;
use reqwest::Url;
use thiserror::Error;

/// Missing or unusable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing required environment variable {0}")]
    Missing(String),

    #[error("invalid URL provided for {name}: {reason}")]
    InvalidUrl { name: String, reason: String },
}

/// Where raw values come from.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Memoizing resolver over an [`EnvSource`].
pub struct EnvResolver {
    source: Box<dyn EnvSource>,
    memo: DashMap<String, Option<String>>,
}

impl EnvResolver {
    pub fn new(source: impl EnvSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            memo: DashMap::new(),
        }
    }

    pub fn from_process() -> Self {
        Self::new(ProcessEnv)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(memoized) = self.memo.get(name) {
            return memoized.value().clone();
        }
        self.memo
            .entry(name.to_string())
            .or_insert_with(|| {
                self.source
                    .var(name)
                    .map(|raw| raw.trim().to_string())
                    .filter(|value| !value.is_empty())
            })
            .value()
            .clone()
    }

    /// Trimmed value of `name`, failing when unset or blank.
    pub fn required(&self, name: &str) -> Result<String, ConfigurationError> {
        self.lookup(name)
            .ok_or_else(|| ConfigurationError::Missing(name.to_string()))
    }

    /// Trimmed value of `name`, `None` when unset or blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.lookup(name)
    }

    pub fn optional_or(&self, name: &str, fallback: &str) -> String {
        self.lookup(name).unwrap_or_else(|| fallback.to_string())
    }

    /// Parsed value of `name`; `default` when unset, blank or unparsable.
    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.lookup(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }
}

impl fmt::Debug for EnvResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; only show which names were resolved.
        let mut names: Vec<String> = self.memo.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("EnvResolver").field("resolved", &names).finish()
    }
}

/// Deployment environment. Anything but `production` is development.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiteEnvironment {
    Production,
    #[default]
    Development,
}

impl SiteEnvironment {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("production") => SiteEnvironment::Production,
            _ => SiteEnvironment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == SiteEnvironment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SiteEnvironment::Production => "production",
            SiteEnvironment::Development => "development",
        }
    }
}

/// Accept only http(s) URLs; drop the fragment and a trailing `/`.
pub fn sanitize_url(input: &str, name: &str) -> Result<String, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidUrl {
        name: name.to_string(),
        reason,
    };
    let mut url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("{name} must use http or https")));
    }
    url.set_fragment(None);
    Ok(url.as_str().trim_end_matches('/').to_string())
}
