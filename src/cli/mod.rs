// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

use streamhop::base_url::RemoteBaseUrls;
use streamhop::embed::ScriptSourceScan;
use streamhop::http::HttpFetcher;
use streamhop::{CacheManager, Config, HttpResolver, ProviderKind, Resolver};

pub mod cache;
pub mod links;
pub mod play;
pub mod providers;
pub mod streams;

pub use cache::CacheCommand;
pub use links::LinksCommand;
pub use play::PlayCommand;
pub use providers::ProvidersCommand;
pub use streams::StreamsCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    M3u,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "m3u" => Ok(Self::M3u),
            _ => anyhow::bail!("Invalid format: {}. Use 'text', 'json', or 'm3u'", s),
        }
    }
}

/// Shared state for command execution
pub struct CommandContext {
    pub config: Config,
    pub resolver: HttpResolver,
    pub cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http.user_agent, config.http.timeout())?;
        let base_urls = RemoteBaseUrls::new(fetcher.clone(), CacheManager::new()?, &config);
        let resolver = Resolver::new(fetcher, base_urls, &config).with_fallback(ScriptSourceScan);

        Ok(Self {
            config,
            resolver,
            cancel,
        })
    }

    pub fn provider(name: &str) -> Result<ProviderKind> {
        name.parse::<ProviderKind>().map_err(|e| {
            let known: Vec<_> = ProviderKind::ALL.iter().map(|kind| kind.key()).collect();
            anyhow::anyhow!("{}. Known providers: {}", e, known.join(", "))
        })
    }
}
