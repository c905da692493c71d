//! Collection kinds and device context.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four fixed content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Festival,
    Community,
    Artist,
    Sport,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collection kind: {0}")]
pub struct UnknownKind(pub String);

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Festival,
        CollectionKind::Community,
        CollectionKind::Artist,
        CollectionKind::Sport,
    ];

    /// Canonical name, used in tags and upstream resource paths.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Festival => "festival",
            CollectionKind::Community => "community",
            CollectionKind::Artist => "artist",
            CollectionKind::Sport => "sport",
        }
    }

    /// Upstream list resource, e.g. `/festival`.
    pub fn resource_path(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Public route segment the site serves this kind under.
    pub fn route_segment(self) -> &'static str {
        match self {
            CollectionKind::Festival => "festival",
            CollectionKind::Community => "community",
            CollectionKind::Artist => "artist-spotlight",
            CollectionKind::Sport => "sports",
        }
    }

    /// Human-readable heading.
    pub fn label(self) -> &'static str {
        match self {
            CollectionKind::Festival => "Festivals",
            CollectionKind::Community => "Community",
            CollectionKind::Artist => "Artist Spotlight",
            CollectionKind::Sport => "Sports",
        }
    }
}

impl FromStr for CollectionKind {
    type Err = UnknownKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "festival" | "festivals" => Ok(CollectionKind::Festival),
            "community" => Ok(CollectionKind::Community),
            "artist" | "artist-spotlight" => Ok(CollectionKind::Artist),
            "sport" | "sports" => Ok(CollectionKind::Sport),
            _ => Err(UnknownKind(raw.to_string())),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target form for image selection and the upstream `device` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

const MOBILE_MARKERS: [&str; 8] = [
    "mobi",
    "android",
    "iphone",
    "ipad",
    "ipod",
    "opera mini",
    "iemobile",
    "blackberry",
];

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
        }
    }

    /// The form tried second during image resolution.
    pub fn other(self) -> Device {
        match self {
            Device::Desktop => Device::Mobile,
            Device::Mobile => Device::Desktop,
        }
    }

    /// Classify a `User-Agent` header value. Missing agents are desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Device {
        let Some(agent) = user_agent else {
            return Device::Desktop;
        };
        let agent = agent.to_ascii_lowercase();
        if MOBILE_MARKERS.iter().any(|marker| agent.contains(marker)) {
            Device::Mobile
        } else {
            Device::Desktop
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
