// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assembler::StreamAssembler;
use crate::base_url::BaseUrlSource;
use crate::config::Config;
use crate::context::{Cancelled, RequestContext, is_cancelled};
use crate::embed::FallbackExtractor;
use crate::http::Fetcher;
use crate::providers::altadefinizione::{self, DEFAULT_RESOLVER_URL};
use crate::providers::streamingunity::{self, DEFAULT_LOCALE};
use crate::providers::{CatalogLink, Discovery, ProviderKind, animeunity};
use crate::stream::{Link, Stream};

/// Entry point for turning catalog links into playable streams.
///
/// Neither [`Resolver::get_streams`] nor [`Resolver::get_links`] ever fails: any
/// error, cancellation included, yields an empty list.
pub struct Resolver<F: Fetcher, B: BaseUrlSource> {
    fetcher: F,
    base_urls: B,
    config: Config,
    fallback: Option<Box<dyn FallbackExtractor>>,
}

impl<F: Fetcher, B: BaseUrlSource> Resolver<F, B> {
    pub fn new(fetcher: F, base_urls: B, config: &Config) -> Self {
        Self {
            fetcher,
            base_urls,
            config: config.clone(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, extractor: impl FallbackExtractor + 'static) -> Self {
        self.fallback = Some(Box::new(extractor));
        self
    }

    /// The provider's live domain, or its configured default when that cannot be
    /// determined.
    pub async fn base_url(&self, kind: ProviderKind) -> String {
        match self.base_urls.resolve(kind).await {
            Ok(url) => url.trim_end_matches('/').to_string(),
            Err(e) => {
                let fallback = self.config.provider(kind).default_url;
                warn!("Base URL lookup for {} failed, using {}: {:#}", kind, fallback, e);
                fallback.trim_end_matches('/').to_string()
            }
        }
    }

    pub async fn get_streams(
        &self,
        kind: ProviderKind,
        link: &str,
        cancel: &CancellationToken,
    ) -> Vec<Stream> {
        if cancel.is_cancelled() {
            debug!("Cancelled before resolving {}", link);
            return Vec::new();
        }

        match self.try_get_streams(kind, link, cancel).await {
            Ok(streams) => streams,
            Err(e) if is_cancelled(&e) => {
                info!("Resolution of {} cancelled", link);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to resolve {} on {}: {:#}", link, kind, e);
                Vec::new()
            }
        }
    }

    pub async fn get_links(
        &self,
        kind: ProviderKind,
        title_ref: &str,
        cancel: &CancellationToken,
    ) -> Vec<Link> {
        if cancel.is_cancelled() {
            debug!("Cancelled before listing {}", title_ref);
            return Vec::new();
        }

        match self.try_get_links(kind, title_ref, cancel).await {
            Ok(links) => links,
            Err(e) if is_cancelled(&e) => {
                info!("Listing of {} cancelled", title_ref);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to list {} on {}: {:#}", title_ref, kind, e);
                Vec::new()
            }
        }
    }

    async fn context<'a>(
        &'a self,
        kind: ProviderKind,
        cancel: &'a CancellationToken,
    ) -> Result<RequestContext<'a, F>> {
        let base_url = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled.into()),
            url = self.base_url(kind) => url,
        };
        debug!("Using {} for {}", base_url, kind);

        Ok(RequestContext {
            fetcher: &self.fetcher,
            cancel,
            base_url,
            user_agent: &self.config.http.user_agent,
            timeout: self.config.http.timeout(),
        })
    }

    async fn try_get_streams(
        &self,
        kind: ProviderKind,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stream>> {
        let link = CatalogLink::parse(link);
        let ctx = self.context(kind, cancel).await?;
        let provider = self.config.provider(kind);

        let discovery: Discovery = match kind {
            ProviderKind::Altadefinizione => {
                let resolver_url = provider.resolver_url.as_deref().unwrap_or(DEFAULT_RESOLVER_URL);
                altadefinizione::discover(&ctx, &link, resolver_url).await?
            }
            ProviderKind::StreamingUnity => {
                let locale = provider.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
                streamingunity::discover(&ctx, &link, locale).await?
            }
            ProviderKind::AnimeUnity => animeunity::discover(&ctx, &link).await?,
        };

        if discovery.candidates.is_empty() {
            info!("No embed candidates for {}", link);
            return Ok(Vec::new());
        }

        let streams = StreamAssembler::new(&ctx, self.fallback.as_deref())
            .resolve(&discovery)
            .await?;
        Ok(streams)
    }

    async fn try_get_links(
        &self,
        kind: ProviderKind,
        title_ref: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Link>> {
        let link = CatalogLink::parse(title_ref);
        let ctx = self.context(kind, cancel).await?;

        let links = match kind {
            ProviderKind::Altadefinizione => altadefinizione::links(&ctx, &link).await?,
            ProviderKind::StreamingUnity => streamingunity::links(&ctx, &link).await?,
            ProviderKind::AnimeUnity => animeunity::links(&ctx, &link).await?,
        };
        info!("Found {} link group(s) for {}", links.len(), title_ref);
        Ok(links)
    }
}
