// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use crate::stream::StreamType;

/// Last-resort media URL lookup for a SuperVideo page whose packer could not be
/// decoded. Implementations must be synchronous and side-effect free.
pub trait FallbackExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<String>;
}

/// Looks for a plain `file:`/`src:` player option, then for `<video>`/`<source>` tags
/// whose path ends in `.m3u8` or `.mp4`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSourceScan;

impl ScriptSourceScan {
    fn from_script(html: &str) -> Option<String> {
        static SOURCE_RE: OnceLock<Regex> = OnceLock::new();
        let re = SOURCE_RE.get_or_init(|| {
            Regex::new(r#"(?:file|src)\s*:\s*["']([^"']+\.(?:m3u8|mp4)[^"']*)["']"#)
                .expect("valid script source regex")
        });

        re.captures(html).map(|caps| caps[1].to_string())
    }

    fn from_markup(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        ["video source[src]", "source[src]", "video[src]"]
            .iter()
            .filter_map(|selector| Selector::parse(selector).ok())
            .find_map(|selector| {
                document
                    .select(&selector)
                    .filter_map(|element| element.value().attr("src"))
                    .map(str::trim)
                    .find(|src| StreamType::from_url(src).is_some())
                    .map(str::to_string)
            })
    }
}

impl FallbackExtractor for ScriptSourceScan {
    fn extract(&self, html: &str) -> Option<String> {
        Self::from_script(html).or_else(|| Self::from_markup(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_option() {
        let html = r#"<script>player.setup({ file: "https://cdn.test/hls/x.m3u8?a=1" })</script>"#;
        assert_eq!(
            ScriptSourceScan.extract(html).as_deref(),
            Some("https://cdn.test/hls/x.m3u8?a=1")
        );
    }

    #[test]
    fn test_video_tag() {
        let html = r#"<video controls><source src="/media/film.mp4" type="video/mp4"></video>"#;
        assert_eq!(ScriptSourceScan.extract(html).as_deref(), Some("/media/film.mp4"));
    }

    #[test]
    fn test_video_tag_needs_media_suffix() {
        let html = r#"<video src="/media/film.webm"></video>"#;
        assert_eq!(ScriptSourceScan.extract(html), None);

        let html = r#"<video src="/poster.jpg"><source src="/hls/x.m3u8?t=1"></video>"#;
        assert_eq!(ScriptSourceScan.extract(html).as_deref(), Some("/hls/x.m3u8?t=1"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(ScriptSourceScan.extract("<p>removed</p>"), None);
    }
}
