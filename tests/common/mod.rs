// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

#![allow(dead_code)]

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use streamhop::base_url::StaticBaseUrls;
use streamhop::http::{FetchRequest, FetchResponse, Fetcher};
use streamhop::{Config, ProviderKind, Resolver};

/// In-memory transport: canned responses by exact URL, 404 for everything else.
#[derive(Clone, Default)]
pub struct MockFetcher {
    routes: Arc<HashMap<String, FetchResponse>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl MockFetcher {
    pub fn new(routes: Vec<(&str, FetchResponse)>) -> Self {
        Self {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(url, response)| (url.to_string(), response))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// Cancel `token` while serving `url`, as if the user gave up mid-request.
    pub fn cancel_on(mut self, url: &str, token: &CancellationToken) -> Self {
        self.cancel_on = Some((url.to_string(), token.clone()));
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some((url, token)) = &self.cancel_on {
            if *url == request.url {
                token.cancel();
            }
        }

        Ok(self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, "not found")))
    }
}

pub fn page(body: &str) -> FetchResponse {
    FetchResponse::new(200, body)
}

pub const ALTA_BASE: &str = "https://alta.test";
pub const STREAMINGUNITY_BASE: &str = "https://su.test";
pub const ANIMEUNITY_BASE: &str = "https://au.test";

pub fn resolver(fetcher: &MockFetcher) -> Resolver<MockFetcher, StaticBaseUrls> {
    let base_urls = StaticBaseUrls::new()
        .with(ProviderKind::Altadefinizione, ALTA_BASE)
        .with(ProviderKind::StreamingUnity, STREAMINGUNITY_BASE)
        .with(ProviderKind::AnimeUnity, ANIMEUNITY_BASE);
    Resolver::new(fetcher.clone(), base_urls, &Config::default())
}

/// SuperVideo player page: base-36 packer around a jwplayer setup with one
/// Italian caption track.
pub const SUPERVIDEO_PAGE: &str = r#"<html><body><div id="vplayer"></div>
<script type='text/javascript'>eval(function(p,a,c,k,e,d){while(c--)if(k[c])p=p.replace(new RegExp('\\b'+c.toString(a)+'\\b','g'),k[c]);return p}('0("1").2({3:[{4:"5://6.7.8/9/abc/a.b?t=xyz"}],c:[{4:"5://6.7.8/h/abc_ita.i",d:"e",f:"g"}]})',36,19,'jwplayer|vplayer|setup|sources|file|https|cdn|supervideo|test|hls|master|m3u8|tracks|label|Italian|kind|captions|subs|vtt'.split('|')))
</script></body></html>"#;

pub const SUPERVIDEO_STREAM: &str = "https://cdn.supervideo.test/hls/abc/master.m3u8?t=xyz";

/// Dropload player page: generic packer, a relative caption track and a jQuery cookie.
pub const DROPLOAD_PAGE: &str = r#"<html><head><script>$.cookie('file_id', '4242', { expires: 10 });</script></head>
<body><script type="text/javascript">eval(function(p,a,c,k,e,d){e=function(c){return c.toString(36)};if(!''.replace(/^/,String)){while(c--){d[c.toString(a)]=k[c]||c.toString(a)}k=[function(e){return d[e]}];e=function(){return'\\w+'};c=1};while(c--){if(k[c]){p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c])}}return p}('1 2={3:"4://5.6.7/8/9.a?s=xy",b:[{3:"/c/d_ita.e",f:"g",h:"i"}]};0',36,19,'|var|cfg|file|https|cdn|dropload|test|hls|index|m3u8|tracks|subs|episode|vtt|label|Italian|kind|captions'.split('|'),0,{}))
</script></body></html>"#;

pub const DROPLOAD_STREAM: &str = "https://cdn.dropload.test/hls/index.m3u8?s=xy";

pub const VIXCLOUD_PAGE: &str = r#"<script>
    window.video = {"id":555};
    window.masterPlaylist = {
        params: { 'token': 'tok', 'expires': '1700000000' },
        url: 'https://vixcloud.test/playlist/555?b=1',
    }
    window.canPlayFHD = true
</script>"#;

pub const VIXCLOUD_STREAM: &str = "https://vixcloud.test/playlist/555?b=1&token=tok&expires=1700000000&h=1";
