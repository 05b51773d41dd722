// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! VixCloud embeds are not obfuscated; the page publishes the signed master playlist
//! as a plain object:
//!
//! ```text
//! window.masterPlaylist = { params: { 'token': '...', 'expires': '...' }, url: '...' }
//! window.canPlayFHD = true
//! ```

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

use super::DecodedEmbed;
use crate::stream::StreamType;
use crate::urls;

const MASTER_PLAYLIST: &str = "window.masterPlaylist";

fn playlist_block(html: &str) -> Option<&str> {
    let start = html.find(MASTER_PLAYLIST)? + MASTER_PLAYLIST.len();
    let rest = &html[start..];
    let end = rest
        .find("window.")
        .or_else(|| rest.find("</script>"))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn quoted_field<'a>(block: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(block)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str())
}

pub fn decode(html: &str, origin: &str) -> DecodedEmbed {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    static EXPIRES_RE: OnceLock<Regex> = OnceLock::new();
    static FHD_RE: OnceLock<Regex> = OnceLock::new();

    let url_re = URL_RE.get_or_init(|| {
        Regex::new(r#"\burl\s*:\s*['"]([^'"]+)['"]"#).expect("valid playlist url regex")
    });
    let token_re = TOKEN_RE.get_or_init(|| {
        Regex::new(r#"['"]?token['"]?\s*:\s*['"]([^'"]*)['"]"#).expect("valid token regex")
    });
    let expires_re = EXPIRES_RE.get_or_init(|| {
        Regex::new(r#"['"]?expires['"]?\s*:\s*['"]([^'"]*)['"]"#).expect("valid expires regex")
    });
    let fhd_re = FHD_RE.get_or_init(|| {
        Regex::new(r"window\.canPlayFHD\s*=\s*true").expect("valid fhd regex")
    });

    let Some(block) = playlist_block(html) else {
        debug!("No masterPlaylist declaration on VixCloud page");
        return DecodedEmbed::default();
    };

    let Some(mut playlist) = quoted_field(block, url_re)
        .and_then(|raw| urls::normalize(raw, origin))
        .and_then(|url| Url::parse(&url).ok())
    else {
        debug!("masterPlaylist declaration has no url");
        return DecodedEmbed::default();
    };

    let mut signature = Vec::new();
    if let Some(token) = quoted_field(block, token_re) {
        signature.push(("token", token));
    }
    if let Some(expires) = quoted_field(block, expires_re) {
        signature.push(("expires", expires));
    }
    if fhd_re.is_match(html) {
        signature.push(("h", "1"));
    }
    if !signature.is_empty() {
        playlist.query_pairs_mut().extend_pairs(signature);
    }

    DecodedEmbed {
        stream_url: playlist.to_string(),
        declared_type: Some(StreamType::M3u8),
        subtitles: Vec::new(),
        payload: block.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBED_PAGE: &str = r#"<script>
        window.video = {"id":555,"name":"Show"};
        window.masterPlaylist = {
            params: {
                'token': 'tok',
                'expires': '1700000000',
                'asn': '',
            },
            url: 'https://vixcloud.test/playlist/555?b=1',
        }
        window.canPlayFHD = true
    </script>"#;

    #[test]
    fn test_builds_signed_playlist_url() {
        let decoded = decode(EMBED_PAGE, "https://vixcloud.test/embed/555");
        assert_eq!(
            decoded.stream_url,
            "https://vixcloud.test/playlist/555?b=1&token=tok&expires=1700000000&h=1"
        );
        assert_eq!(decoded.stream_type(), Some(StreamType::M3u8));
    }

    #[test]
    fn test_without_fhd_flag() {
        let html = "window.masterPlaylist = { params: { 'token': 'a', 'expires': '2' }, url: '/playlist/9' }";
        let decoded = decode(html, "https://vixcloud.test/embed/9");
        assert_eq!(
            decoded.stream_url,
            "https://vixcloud.test/playlist/9?token=a&expires=2"
        );
    }

    #[test]
    fn test_missing_declaration() {
        assert!(decode("<script>window.video = {}</script>", "https://vixcloud.test/embed/1").is_empty());
    }
}
