// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::context::{RequestContext, is_cancelled};
use crate::cookies::{CookieJar, build_cookie_header, extract_cookies};
use crate::embed::{DecodedEmbed, FallbackExtractor, HostFamily};
use crate::http::Fetcher;
use crate::providers::Discovery;
use crate::stream::Stream;
use crate::urls;

/// Turns discovered embed candidates into playable streams, one candidate at a time
/// and in discovery order.
pub struct StreamAssembler<'a, F: Fetcher> {
    context: &'a RequestContext<'a, F>,
    fallback: Option<&'a dyn FallbackExtractor>,
}

impl<'a, F: Fetcher> StreamAssembler<'a, F> {
    pub fn new(
        context: &'a RequestContext<'a, F>,
        fallback: Option<&'a dyn FallbackExtractor>,
    ) -> Self {
        Self { context, fallback }
    }

    /// Only cancellation is returned as an error; any other failure drops the
    /// candidate it happened on.
    pub async fn resolve(&self, discovery: &Discovery) -> Result<Vec<Stream>> {
        let mut seen = HashSet::new();
        let mut counters: HashMap<HostFamily, usize> = HashMap::new();
        let mut streams = Vec::new();

        for raw in &discovery.candidates {
            let Some(url) = urls::normalize(raw, &discovery.origin) else {
                debug!("Ignoring unusable candidate: {:?}", raw);
                continue;
            };
            if !seen.insert(url.clone()) {
                debug!("Skipping duplicate candidate: {}", url);
                continue;
            }
            let Some(family) = HostFamily::classify(&url) else {
                debug!("Skipping unsupported host: {}", url);
                continue;
            };

            match self.resolve_candidate(&url, family, &discovery.referer).await {
                Ok(Some(mut stream)) => {
                    let index = counters.entry(family).or_default();
                    *index += 1;
                    stream.server = format!("{} {}", family.label(), index);
                    debug!("{} -> {}", stream.server, stream.link);
                    streams.push(stream);
                }
                Ok(None) => debug!("No stream found on {}", url),
                Err(e) if is_cancelled(&e) => return Err(e),
                Err(e) => warn!("Candidate {} failed: {:#}", url, e),
            }
        }

        info!(
            "Resolved {} stream(s) from {} candidate(s)",
            streams.len(),
            discovery.candidates.len()
        );
        Ok(streams)
    }

    async fn resolve_candidate(
        &self,
        url: &str,
        family: HostFamily,
        referer: &str,
    ) -> Result<Option<Stream>> {
        self.context.checkpoint()?;

        let response = self
            .context
            .fetch(url, referer)
            .await
            .with_context(|| format!("Failed to load {} embed page", family.label()))?;

        let mut decoded = family.decode(&response.body, url);
        if decoded.is_empty() && family == HostFamily::SuperVideo {
            self.apply_fallback(&mut decoded, &response.body, url);
        }
        if decoded.is_empty() {
            return Ok(None);
        }
        let Some(stream_type) = decoded.stream_type() else {
            debug!("Dropping {}: no m3u8/mp4 suffix", decoded.stream_url);
            return Ok(None);
        };

        let mut jar = CookieJar::new();
        jar.extend_from_set_cookie(response.header_values("set-cookie"));
        jar.extend(extract_cookies(&response.body));
        jar.extend(extract_cookies(&decoded.payload));

        let headers = self.stream_headers(url, &jar);

        Ok(Some(Stream {
            server: family.label().to_string(),
            link: decoded.stream_url,
            stream_type,
            subtitles: decoded.subtitles,
            headers,
        }))
    }

    fn apply_fallback(&self, decoded: &mut DecodedEmbed, html: &str, url: &str) {
        let Some(extractor) = self.fallback else {
            return;
        };
        if let Some(found) = extractor
            .extract(html)
            .and_then(|raw| urls::normalize(&raw, url))
        {
            debug!("Fallback extractor recovered {}", found);
            decoded.stream_url = found;
        }
    }

    fn stream_headers(&self, embed_url: &str, jar: &CookieJar) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Referer".to_string(), embed_url.to_string());
        if let Some(origin) = urls::origin_of(embed_url) {
            headers.insert("Origin".to_string(), origin);
        }
        headers.insert("User-Agent".to_string(), self.context.user_agent.to_string());

        let cookie = build_cookie_header(jar);
        if !cookie.is_empty() {
            headers.insert("Cookie".to_string(), cookie);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::ScriptSourceScan;
    use crate::http::{FetchRequest, FetchResponse};
    use crate::stream::StreamType;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct PageFetcher {
        pages: HashMap<String, FetchResponse>,
        requested: Mutex<Vec<String>>,
    }

    impl PageFetcher {
        fn new(pages: &[(&str, FetchResponse)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, response)| (url.to_string(), response.clone()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl Fetcher for PageFetcher {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
            self.requested.lock().unwrap().push(request.url.clone());
            Ok(self
                .pages
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| FetchResponse::new(404, "")))
        }
    }

    struct FixedFallback(&'static str);

    impl FallbackExtractor for FixedFallback {
        fn extract(&self, _html: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn discovery(candidates: &[&str]) -> Discovery {
        Discovery {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            referer: "https://site.test/film/1".to_string(),
            origin: "https://site.test".to_string(),
        }
    }

    fn context<'a>(fetcher: &'a PageFetcher, cancel: &'a CancellationToken) -> RequestContext<'a, PageFetcher> {
        RequestContext {
            fetcher,
            cancel,
            base_url: "https://site.test".to_string(),
            user_agent: "test-agent",
            timeout: Duration::from_secs(1),
        }
    }

    const VIX_PAGE: &str = "window.masterPlaylist = { params: { 'token': 't', 'expires': '1' }, url: 'https://vixcloud.test/playlist/7' }";

    #[tokio::test]
    async fn test_labels_count_per_family() {
        let fetcher = PageFetcher::new(&[
            ("https://vixcloud.test/embed/1", FetchResponse::new(200, VIX_PAGE)),
            ("https://vixcloud.test/embed/2", FetchResponse::new(200, VIX_PAGE)),
        ]);
        let cancel = CancellationToken::new();
        let ctx = context(&fetcher, &cancel);

        let streams = StreamAssembler::new(&ctx, None)
            .resolve(&discovery(&[
                "https://vixcloud.test/embed/1",
                "https://unknown.test/e/1",
                "//vixcloud.test/embed/1",
                "https://vixcloud.test/embed/2",
            ]))
            .await
            .unwrap();

        let labels: Vec<_> = streams.iter().map(|s| s.server.as_str()).collect();
        assert_eq!(labels, ["VixCloud 1", "VixCloud 2"]);
        assert_eq!(streams[0].stream_type, StreamType::M3u8);
        assert_eq!(streams[0].headers["Referer"], "https://vixcloud.test/embed/1");
        assert_eq!(streams[0].headers["Origin"], "https://vixcloud.test");
        assert_eq!(streams[0].headers["User-Agent"], "test-agent");
        assert!(!streams[0].headers.contains_key("Cookie"));
        assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_candidate_does_not_stop_the_rest() {
        let fetcher = PageFetcher::new(&[(
            "https://vixcloud.test/embed/2",
            FetchResponse::new(200, VIX_PAGE).with_header("Set-Cookie", "sid=abc; path=/"),
        )]);
        let cancel = CancellationToken::new();
        let ctx = context(&fetcher, &cancel);

        let streams = StreamAssembler::new(&ctx, None)
            .resolve(&discovery(&["https://vixcloud.test/embed/1", "https://vixcloud.test/embed/2"]))
            .await
            .unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].server, "VixCloud 1");
        assert_eq!(streams[0].headers["Cookie"], "sid=abc");
    }

    #[tokio::test]
    async fn test_fallback_only_for_supervideo() {
        let fetcher = PageFetcher::new(&[
            ("https://supervideo.test/e/1", FetchResponse::new(200, "<html>changed</html>")),
            ("https://dropload.test/e/1", FetchResponse::new(200, "<html>changed</html>")),
        ]);
        let cancel = CancellationToken::new();
        let ctx = context(&fetcher, &cancel);
        let fallback = FixedFallback("/hls/recovered.m3u8");

        let streams = StreamAssembler::new(&ctx, Some(&fallback))
            .resolve(&discovery(&["https://supervideo.test/e/1", "https://dropload.test/e/1"]))
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].server, "SuperVideo 1");
        assert_eq!(streams[0].link, "https://supervideo.test/hls/recovered.m3u8");
    }

    #[tokio::test]
    async fn test_unknown_media_type_is_dropped() {
        let fetcher = PageFetcher::new(&[
            (
                "https://supervideo.test/e/1",
                FetchResponse::new(200, r#"<video src="/media/film.webm"></video>"#),
            ),
            (
                "https://supervideo.test/e/2",
                FetchResponse::new(200, r#"<script>player({ file: "/play?f=b.m3u8" })</script>"#),
            ),
            (
                "https://supervideo.test/e/3",
                FetchResponse::new(200, r#"<video><source src="/media/film.mp4"></video>"#),
            ),
        ]);
        let cancel = CancellationToken::new();
        let ctx = context(&fetcher, &cancel);

        let streams = StreamAssembler::new(&ctx, Some(&ScriptSourceScan))
            .resolve(&discovery(&[
                "https://supervideo.test/e/1",
                "https://supervideo.test/e/2",
                "https://supervideo.test/e/3",
            ]))
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].server, "SuperVideo 1");
        assert_eq!(streams[0].link, "https://supervideo.test/media/film.mp4");
        assert_eq!(streams[0].stream_type, StreamType::Mp4);
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let fetcher = PageFetcher::new(&[]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = context(&fetcher, &cancel);

        let err = StreamAssembler::new(&ctx, None)
            .resolve(&discovery(&["https://vixcloud.test/embed/1"]))
            .await
            .unwrap_err();

        assert!(is_cancelled(&err));
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }
}
