// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod dropload;
pub mod fallback;
pub mod supervideo;
pub mod vixcloud;

pub use fallback::{FallbackExtractor, ScriptSourceScan};

use crate::stream::StreamType;
use crate::subtitles::TextTrack;
use crate::urls;

/// Embedding hosts we know how to decode, matched by host substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostFamily {
    SuperVideo,
    Dropload,
    VixCloud,
}

const HOST_PATTERNS: &[(&str, HostFamily)] = &[
    ("supervideo", HostFamily::SuperVideo),
    ("dropload", HostFamily::Dropload),
    ("vixcloud", HostFamily::VixCloud),
    ("vixsrc", HostFamily::VixCloud),
];

impl HostFamily {
    pub fn classify(url: &str) -> Option<Self> {
        let host = urls::host_of(url)?;
        HOST_PATTERNS
            .iter()
            .find(|(pattern, _)| host.contains(pattern))
            .map(|(_, family)| *family)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SuperVideo => "SuperVideo",
            Self::Dropload => "Dropload",
            Self::VixCloud => "VixCloud",
        }
    }

    pub fn decode(&self, html: &str, origin: &str) -> DecodedEmbed {
        match self {
            Self::SuperVideo => supervideo::decode(html, origin),
            Self::Dropload => dropload::decode(html, origin),
            Self::VixCloud => vixcloud::decode(html, origin),
        }
    }
}

/// What one embed page yielded. An empty `stream_url` means nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedEmbed {
    pub stream_url: String,
    /// Set only by decoders whose URLs carry no usable suffix.
    pub declared_type: Option<StreamType>,
    pub subtitles: Vec<TextTrack>,
    /// Deobfuscated script text, kept for cookie harvesting.
    pub payload: String,
}

impl DecodedEmbed {
    pub fn is_empty(&self) -> bool {
        self.stream_url.is_empty()
    }

    pub fn stream_type(&self) -> Option<StreamType> {
        self.declared_type
            .or_else(|| StreamType::from_url(&self.stream_url))
    }
}
