// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Caption tracks declared inside decoded player setup scripts.
//!
//! Accepted shape: `tracks: [ { file: "...", label: "...", kind: "captions" }, ... ]`.
//! Keys may be bare or quoted, values single- or double-quoted or bare, in any
//! order. Player configs are rewritten by the hosts from time to time, so this
//! is expected to need adjusting when they do.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::unpacker::unescape_js;
use crate::urls;

const LANGUAGE_LABELS: &[(&str, &str)] = &[
    ("italian", "it"),
    ("italiano", "it"),
    ("english", "en"),
    ("inglese", "en"),
    ("spanish", "es"),
    ("español", "es"),
    ("espanol", "es"),
    ("french", "fr"),
    ("français", "fr"),
    ("francais", "fr"),
    ("german", "de"),
    ("deutsch", "de"),
    ("portuguese", "pt"),
    ("português", "pt"),
    ("japanese", "ja"),
    ("russian", "ru"),
    ("arabic", "ar"),
    ("chinese", "zh"),
    ("korean", "ko"),
    ("dutch", "nl"),
    ("polish", "pl"),
    ("turkish", "tr"),
];

const FILENAME_SUFFIXES: &[(&str, &str)] = &[
    ("ita", "it"),
    ("eng", "en"),
    ("spa", "es"),
    ("esp", "es"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("ger", "de"),
    ("deu", "de"),
    ("por", "pt"),
    ("jpn", "ja"),
    ("rus", "ru"),
    ("ara", "ar"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("kor", "ko"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("pol", "pl"),
    ("tur", "tr"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubtitleFormat {
    #[serde(rename = "text/vtt")]
    Vtt,
    #[serde(rename = "application/x-subrip")]
    Srt,
    #[serde(rename = "application/ttml+xml")]
    Ttml,
}

impl SubtitleFormat {
    /// Chosen from the file extension alone; anything unknown is WebVTT.
    pub fn from_uri(uri: &str) -> Self {
        let path = strip_query(uri).to_ascii_lowercase();
        if path.ends_with(".srt") {
            Self::Srt
        } else if path.ends_with(".ttml") {
            Self::Ttml
        } else {
            Self::Vtt
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Vtt => "text/vtt",
            Self::Srt => "application/x-subrip",
            Self::Ttml => "application/ttml+xml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrack {
    pub title: String,
    pub language: String,
    #[serde(rename = "type")]
    pub format: SubtitleFormat,
    pub uri: String,
}

impl TextTrack {
    fn new(label: &str, uri: String) -> Self {
        let title = if label.trim().is_empty() {
            uri.clone()
        } else {
            label.trim().to_string()
        };

        Self {
            title,
            language: language_code(label, &uri),
            format: SubtitleFormat::from_uri(&uri),
            uri,
        }
    }
}

fn strip_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

/// Language code from a display label, else from a `_eng.vtt` style filename suffix.
pub fn language_code(label: &str, uri: &str) -> String {
    let label = label.trim().to_lowercase();

    if let Some(code) = label_code(&label) {
        return code.to_string();
    }
    if let Some(code) = suffix_code(uri) {
        return code.to_string();
    }
    if label.is_empty() {
        "und".to_string()
    } else {
        label
    }
}

fn label_code(label: &str) -> Option<&'static str> {
    if label.is_empty() {
        return None;
    }
    LANGUAGE_LABELS
        .iter()
        .find(|(name, _)| label == *name)
        .or_else(|| LANGUAGE_LABELS.iter().find(|(name, _)| label.starts_with(name)))
        .map(|(_, code)| *code)
}

fn suffix_code(uri: &str) -> Option<&'static str> {
    static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)[_.\-]([a-z]{3})\.(?:vtt|srt|ttml)$").expect("valid suffix regex")
    });

    let suffix = re
        .captures(strip_query(uri))?
        .get(1)?
        .as_str()
        .to_ascii_lowercase();

    FILENAME_SUFFIXES
        .iter()
        .find(|(name, _)| *name == suffix)
        .map(|(_, code)| *code)
}

/// Caption tracks from a decoded player script, resolving relative files against `base_url`.
pub fn extract_tracks(decoded: &str, base_url: Option<&str>) -> Vec<TextTrack> {
    let tracks = caption_tracks(decoded, base_url);
    if !tracks.is_empty() {
        return tracks;
    }
    loose_vtt_tracks(decoded, base_url)
}

fn resolve(file: &str, base_url: Option<&str>) -> Option<String> {
    urls::normalize(file, base_url.unwrap_or_default())
}

fn caption_tracks(decoded: &str, base_url: Option<&str>) -> Vec<TextTrack> {
    let Some(block) = tracks_block(decoded) else {
        return Vec::new();
    };

    object_literals(block)
        .into_iter()
        .filter_map(|object| {
            let fields = object_fields(object);
            let kind = fields.get("kind")?;
            if !kind.eq_ignore_ascii_case("captions") {
                return None;
            }
            let uri = resolve(fields.get("file")?, base_url)?;
            let label = fields
                .get("label")
                .or_else(|| fields.get("title"))
                .map(String::as_str)
                .unwrap_or_default();
            Some(TextTrack::new(label, uri))
        })
        .collect()
}

fn loose_vtt_tracks(decoded: &str, base_url: Option<&str>) -> Vec<TextTrack> {
    static VTT_RE: OnceLock<Regex> = OnceLock::new();
    let re = VTT_RE.get_or_init(|| {
        Regex::new(r#"https?:(?://|\\/\\/)[^\s"'<>]+?\.vtt(?:\?[^\s"'<>\\]*)?"#)
            .expect("valid vtt regex")
    });

    let mut seen = HashSet::new();
    re.find_iter(decoded)
        .filter_map(|found| resolve(found.as_str(), base_url))
        .filter(|uri| seen.insert(uri.clone()))
        .map(|uri| TextTrack::new("", uri))
        .collect()
}

/// Contents between the brackets of the first `tracks: [...]`.
fn tracks_block(decoded: &str) -> Option<&str> {
    static TRACKS_RE: OnceLock<Regex> = OnceLock::new();
    let re = TRACKS_RE.get_or_init(|| {
        Regex::new(r#"["']?\btracks["']?\s*:\s*\["#).expect("valid tracks regex")
    });

    let open = re.find(decoded)?.end();
    let close = matching_close(&decoded[open..], '[', ']')?;
    Some(&decoded[open..open + close])
}

/// Offset of the bracket closing an already-open `open`, skipping quoted text.
fn matching_close(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Top-level `{...}` bodies in an array literal.
fn object_literals(block: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut rest = block;

    while let Some(start) = rest.find('{') {
        let body = &rest[start + 1..];
        let Some(end) = matching_close(body, '{', '}') else {
            break;
        };
        objects.push(&body[..end]);
        rest = &body[end + 1..];
    }

    objects
}

fn object_fields(object: &str) -> HashMap<String, String> {
    static FIELD_RE: OnceLock<Regex> = OnceLock::new();
    let re = FIELD_RE.get_or_init(|| {
        Regex::new(
            r#"["']?(\w+)["']?\s*:\s*(?:"((?:\\.|[^"\\])*)"|'((?:\\.|[^'\\])*)'|([^,}\s]+))"#,
        )
        .expect("valid field regex")
    });

    re.captures_iter(object)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| unescape_js(m.as_str()))
                .or_else(|| caps.get(4).map(|m| m.as_str().to_string()))?;
            Some((key, value))
        })
        .collect()
}
