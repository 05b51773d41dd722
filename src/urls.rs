// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use url::Url;

/// Turns a raw link found in a page into an absolute http(s) URL.
///
/// Protocol-relative links get `https:`, relative links are joined onto `origin`.
/// Returns `None` for empty input or anything that is not http(s) after resolution.
pub fn normalize(raw: &str, origin: &str) -> Option<String> {
    let cleaned = raw.trim().replace("\\/", "/").replace("&amp;", "&");
    if cleaned.is_empty() {
        return None;
    }

    let parsed = if let Some(rest) = cleaned.strip_prefix("//") {
        Url::parse(&format!("https://{}", rest)).ok()?
    } else if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        Url::parse(&cleaned).ok()?
    } else {
        Url::parse(origin).ok()?.join(&cleaned).ok()?
    };

    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}

pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}

pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_protocol_relative() {
        assert_eq!(
            normalize("//supervideo.tv/e/abc", "https://site.test/"),
            Some("https://supervideo.tv/e/abc".to_string())
        );
    }

    #[test]
    fn test_normalize_relative_against_origin() {
        assert_eq!(
            normalize("/e/abc", "https://dropload.io/page/1"),
            Some("https://dropload.io/e/abc".to_string())
        );
        assert_eq!(
            normalize("subs/a.vtt", "https://dropload.io/e/abc"),
            Some("https://dropload.io/e/subs/a.vtt".to_string())
        );
    }

    #[test]
    fn test_normalize_unescapes_js_and_html() {
        assert_eq!(
            normalize(r"https:\/\/cdn.test\/a.m3u8?x=1&amp;y=2", ""),
            Some("https://cdn.test/a.m3u8?x=1&y=2".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_empty_and_foreign_schemes() {
        assert_eq!(normalize("   ", "https://a.test"), None);
        assert_eq!(normalize("javascript:void(0)", "https://a.test"), None);
        assert_eq!(normalize("/relative", ""), None);
    }

    #[test]
    fn test_origin_and_host() {
        assert_eq!(
            origin_of("https://Dropload.io:8443/e/x"),
            Some("https://dropload.io:8443".to_string())
        );
        assert_eq!(host_of("https://SuperVideo.cc/e/1"), Some("supervideo.cc".to_string()));
        assert_eq!(host_of("not a url"), None);
    }
}
