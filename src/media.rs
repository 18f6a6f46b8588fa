use std::fmt;

use serde::Deserialize;
use serde::de::{self, Deserializer};

/// The two media categories. Each kind gets its own listing, cursor, and
/// library subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub const ALL: &'static [Self] = &[Self::Image, Self::Video];
    const NAMES: &'static [&'static str] = &["image", "video"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Subdirectory of the library root holding this kind's files.
    pub fn subdir(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }

    /// Stable index for per-kind arrays (locks, shards).
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Image => 0,
            Self::Video => 1,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        for kind in Self::ALL {
            if raw == kind.as_str() {
                return Ok(*kind);
            }
        }
        Err(de::Error::unknown_variant(&raw, Self::NAMES))
    }
}

/// A single media file. Identity is `(kind, name)`; existence is binary —
/// either present in the store or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaItem {
    pub name: String,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn new(kind: MediaKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
