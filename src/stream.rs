// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::subtitles::TextTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    M3u8,
    Mp4,
}

impl StreamType {
    /// Inferred from the path suffix only; query and fragment are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();

        if path.ends_with(".m3u8") {
            Some(Self::M3u8)
        } else if path.ends_with(".mp4") {
            Some(Self::Mp4)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M3u8 => "m3u8",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directly playable source, with whatever request headers the host insists on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub server: String,
    pub link: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<TextTrack>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeLink {
    pub title: String,
    pub link: String,
}

/// A season (or the movie itself) and the catalog links that can be resolved into streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes_link: Option<String>,
    #[serde(default)]
    pub direct_links: Vec<EpisodeLink>,
}
