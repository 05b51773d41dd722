// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod altadefinizione;
pub mod animeunity;
pub mod streamingunity;

use anyhow::{Result, anyhow};
use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "altadefinizionez")]
    Altadefinizione,
    StreamingUnity,
    AnimeUnity,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Altadefinizione,
        ProviderKind::StreamingUnity,
        ProviderKind::AnimeUnity,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Altadefinizione => "altadefinizionez",
            Self::StreamingUnity => "streamingunity",
            Self::AnimeUnity => "animeunity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Altadefinizione => "Altadefinizione",
            Self::StreamingUnity => "StreamingUnity",
            Self::AnimeUnity => "AnimeUnity",
        }
    }

    /// Built-in domain, used whenever the live one cannot be determined.
    pub fn default_url(&self) -> &'static str {
        match self {
            Self::Altadefinizione => "https://altadefinizionez.com",
            Self::StreamingUnity => "https://streamingunity.to",
            Self::AnimeUnity => "https://www.animeunity.so",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow!("Unknown provider: {}", s))
    }
}

/// `<titleRef>::<episodeKey>`, or a bare title reference for movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLink {
    pub title_ref: String,
    pub episode: Option<String>,
}

impl CatalogLink {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.rsplit_once("::") {
            Some((title_ref, episode)) if !episode.trim().is_empty() => Self {
                title_ref: title_ref.trim().to_string(),
                episode: Some(episode.trim().to_string()),
            },
            Some((title_ref, _)) => Self {
                title_ref: title_ref.trim().to_string(),
                episode: None,
            },
            None => Self {
                title_ref: raw.to_string(),
                episode: None,
            },
        }
    }

    pub fn compose(title_ref: &str, episode: &str) -> String {
        format!("{}::{}", title_ref, episode)
    }
}

impl fmt::Display for CatalogLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.episode {
            Some(episode) => write!(f, "{}::{}", self.title_ref, episode),
            None => write!(f, "{}", self.title_ref),
        }
    }
}

/// Raw embed candidates plus where they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub candidates: Vec<String>,
    /// Page that linked the candidates; sent as `Referer` when fetching them.
    pub referer: String,
    /// Base for relative candidate URLs.
    pub origin: String,
}

impl Discovery {
    pub fn empty(referer: impl Into<String>) -> Self {
        let referer = referer.into();
        Self {
            origin: referer.clone(),
            referer,
            candidates: Vec::new(),
        }
    }
}

/// Non-empty `data-link` attributes under `selector`, in document order.
pub(crate) fn data_links(document: &Html, selector: &str) -> Vec<String> {
    attribute_values(document, selector, "data-link")
}

pub(crate) fn attribute_values(document: &Html, selector: &str, attribute: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// The Inertia.js page object serialized into `<div id="app" data-page="...">`.
pub(crate) fn inertia_page(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let raw = attribute_values(&document, "#app[data-page]", "data-page")
        .into_iter()
        .next()?;
    serde_json::from_str(&raw).ok()
}

pub(crate) fn deserialize_number_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("Expected string or number")),
    }
}
