// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

use super::{CatalogLink, Discovery, attribute_values, deserialize_number_as_string, inertia_page};
use crate::context::RequestContext;
use crate::http::Fetcher;
use crate::stream::{EpisodeLink, Link};
use crate::urls;

pub const DEFAULT_LOCALE: &str = "it";

#[derive(Debug, Clone, Default, Deserialize)]
struct TitleProps {
    #[serde(default)]
    title: Option<TitleInfo>,
    #[serde(default, rename = "loadedSeason")]
    loaded_season: Option<LoadedSeason>,
}

#[derive(Debug, Clone, Deserialize)]
struct TitleInfo {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    id: String,
    #[serde(default)]
    seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonInfo {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    number: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LoadedSeason {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    number: String,
    #[serde(default)]
    episodes: Vec<EpisodeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct EpisodeInfo {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    id: String,
    #[serde(deserialize_with = "deserialize_number_as_string")]
    number: String,
    #[serde(default)]
    name: Option<String>,
}

fn title_props(html: &str) -> TitleProps {
    inertia_page(html)
        .and_then(|page| page.get("props").cloned())
        .and_then(|props| serde_json::from_value(props).ok())
        .unwrap_or_default()
}

fn title_id_from_ref(title_ref: &str) -> Option<String> {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE_RE.get_or_init(|| Regex::new(r"/titles/(\d+)").expect("valid title id regex"));
    re.captures(title_ref).map(|caps| caps[1].to_string())
}

pub fn iframe_endpoint(base_url: &str, locale: &str, title_id: &str, episode: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    match episode {
        Some(episode_id) => format!(
            "{}/{}/iframe/{}?episode_id={}&next_episode=1",
            base,
            locale,
            title_id,
            urlencoding::encode(episode_id)
        ),
        None => format!("{}/{}/iframe/{}", base, locale, title_id),
    }
}

fn first_iframe(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    attribute_values(&document, "iframe[src]", "src").into_iter().next()
}

fn detail_url<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<String> {
    ctx.absolute(&link.title_ref)
        .ok_or_else(|| anyhow!("Invalid title reference: {}", link.title_ref))
}

pub async fn discover<F: Fetcher>(
    ctx: &RequestContext<'_, F>,
    link: &CatalogLink,
    locale: &str,
) -> Result<Discovery> {
    let detail = detail_url(ctx, link)?;
    let html = ctx
        .get_page(&detail, &ctx.base_url)
        .await
        .context("Failed to load title page")?;

    let Some(title_id) = title_props(&html)
        .title
        .map(|title| title.id)
        .or_else(|| title_id_from_ref(&link.title_ref))
    else {
        debug!("No title id for {}", detail);
        return Ok(Discovery::empty(detail));
    };

    let endpoint = iframe_endpoint(&ctx.base_url, locale, &title_id, link.episode.as_deref());
    let frame = ctx
        .get_page(&endpoint, &detail)
        .await
        .with_context(|| format!("Failed to load player frame for title {}", title_id))?;

    let candidates: Vec<String> = first_iframe(&frame).into_iter().collect();
    let origin = urls::origin_of(&endpoint).unwrap_or_else(|| endpoint.clone());
    Ok(Discovery {
        candidates,
        referer: endpoint,
        origin,
    })
}

fn season_link(title_ref: &str, season: &LoadedSeason) -> Link {
    Link {
        title: format!("Season {}", season.number),
        episodes_link: None,
        direct_links: season
            .episodes
            .iter()
            .map(|episode| EpisodeLink {
                title: match episode.name.as_deref().map(str::trim) {
                    Some(name) if !name.is_empty() => {
                        format!("Episode {} - {}", episode.number, name)
                    }
                    _ => format!("Episode {}", episode.number),
                },
                link: CatalogLink::compose(title_ref, &episode.id),
            })
            .collect(),
    }
}

pub async fn links<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<Vec<Link>> {
    let detail = detail_url(ctx, link)?;
    let html = ctx
        .get_page(&detail, &ctx.base_url)
        .await
        .context("Failed to load title page")?;

    let props = title_props(&html);
    let seasons = props
        .title
        .as_ref()
        .map(|title| title.seasons.clone())
        .unwrap_or_default();

    if seasons.is_empty() {
        return Ok(vec![Link {
            title: "Movie".to_string(),
            episodes_link: None,
            direct_links: vec![EpisodeLink {
                title: "Movie".to_string(),
                link: link.title_ref.clone(),
            }],
        }]);
    }

    let mut result = Vec::with_capacity(seasons.len());
    for season in &seasons {
        let loaded = match &props.loaded_season {
            Some(loaded) if loaded.number == season.number => loaded.clone(),
            _ => {
                let season_url = format!("{}/season-{}", detail.trim_end_matches('/'), season.number);
                let page = ctx
                    .get_page(&season_url, &detail)
                    .await
                    .with_context(|| format!("Failed to load season {}", season.number))?;
                match title_props(&page).loaded_season {
                    Some(loaded) => loaded,
                    None => {
                        debug!("Season page {} carries no episodes", season_url);
                        continue;
                    }
                }
            }
        };
        result.push(season_link(&link.title_ref, &loaded));
    }

    Ok(result)
}
