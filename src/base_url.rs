// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Providers hop between domains; the live one is read from a pointer document
//! and remembered for a while.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheManager;
use crate::config::{Config, ProviderConfig};
use crate::http::{FetchRequest, Fetcher};
use crate::providers::ProviderKind;

pub trait BaseUrlSource: Send + Sync {
    fn resolve(&self, kind: ProviderKind) -> impl Future<Output = Result<String>> + Send;
}

/// Fixed domains, no network.
#[derive(Debug, Clone, Default)]
pub struct StaticBaseUrls {
    urls: HashMap<ProviderKind, String>,
}

impl StaticBaseUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        ProviderKind::ALL
            .into_iter()
            .fold(Self::new(), |urls, kind| {
                let default_url = config.provider(kind).default_url;
                urls.with(kind, default_url)
            })
    }

    pub fn with(mut self, kind: ProviderKind, url: impl Into<String>) -> Self {
        self.urls.insert(kind, url.into());
        self
    }
}

impl BaseUrlSource for StaticBaseUrls {
    async fn resolve(&self, kind: ProviderKind) -> Result<String> {
        Ok(self
            .urls
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_url().to_string()))
    }
}

/// Pulls the domain from each provider's `pointer_url`, caching it on disk.
pub struct RemoteBaseUrls<F: Fetcher> {
    fetcher: F,
    cache: CacheManager,
    ttl: Duration,
    timeout: Duration,
    user_agent: String,
    providers: Vec<ProviderConfig>,
}

impl<F: Fetcher> RemoteBaseUrls<F> {
    pub fn new(fetcher: F, cache: CacheManager, config: &Config) -> Self {
        Self {
            fetcher,
            cache,
            ttl: config.cache.base_url_ttl(),
            timeout: config.http.timeout(),
            user_agent: config.http.user_agent.clone(),
            providers: ProviderKind::ALL
                .into_iter()
                .map(|kind| config.provider(kind))
                .collect(),
        }
    }

    fn provider(&self, kind: ProviderKind) -> ProviderConfig {
        self.providers
            .iter()
            .find(|provider| provider.key == kind.key())
            .cloned()
            .unwrap_or_else(|| ProviderConfig::builtin(kind))
    }

    async fn fetch_pointer(&self, pointer_url: &str, key: &str) -> Result<String> {
        let request = FetchRequest::get(pointer_url)
            .header("User-Agent", self.user_agent.as_str())
            .timeout(self.timeout);

        let response = self
            .fetcher
            .fetch(request)
            .await
            .with_context(|| format!("Failed to fetch domain pointer {}", pointer_url))?
            .ensure_success(pointer_url)?;

        parse_pointer(&response.body, key)
            .ok_or_else(|| anyhow!("Domain pointer {} names no URL for {}", pointer_url, key))
    }
}

impl<F: Fetcher> BaseUrlSource for RemoteBaseUrls<F> {
    async fn resolve(&self, kind: ProviderKind) -> Result<String> {
        let provider = self.provider(kind);
        let Some(pointer_url) = provider.pointer_url.as_deref() else {
            return Ok(provider.default_url.trim_end_matches('/').to_string());
        };

        let cache_key = format!("base_url:{}", provider.key);
        match self
            .cache
            .get_or_refresh(&cache_key, self.ttl, || {
                self.fetch_pointer(pointer_url, &provider.key)
            })
            .await
        {
            Ok(url) => {
                debug!("Live domain for {}: {}", provider.key, url);
                Ok(url)
            }
            Err(e) => {
                warn!(
                    "Could not resolve live domain for {}, using {}: {:#}",
                    provider.key, provider.default_url, e
                );
                Ok(provider.default_url.trim_end_matches('/').to_string())
            }
        }
    }
}

/// Accepts a bare URL, `{"url": ...}`, `{"<key>": "..."}` or `{"<key>": {"url": ...}}`.
pub fn parse_pointer(body: &str, key: &str) -> Option<String> {
    let body = body.trim();

    let url = if body.starts_with('{') {
        let value: Value = serde_json::from_str(body).ok()?;
        let entry = value.get(key);
        value
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| entry.and_then(Value::as_str))
            .or_else(|| entry.and_then(|e| e.get("url")).and_then(Value::as_str))?
            .to_string()
    } else {
        body.split_whitespace()
            .find(|token| token.starts_with("http://") || token.starts_with("https://"))?
            .to_string()
    };

    let url = url.trim().trim_end_matches('/');
    (url.starts_with("http://") || url.starts_with("https://")).then(|| url.to_string())
}
