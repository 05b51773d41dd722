// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Movies are resolved through the IMDB-keyed "set-movie" mirror page; series pages
//! carry one mirror dropdown per episode, tagged `data-season` / `data-episode`.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use super::{CatalogLink, Discovery, attribute_values, data_links};
use crate::context::RequestContext;
use crate::http::Fetcher;
use crate::stream::{EpisodeLink, Link};
use crate::urls;

pub const DEFAULT_RESOLVER_URL: &str = "https://mostraguarda.stream/set-movie-a/{imdb}";

fn imdb_re() -> &'static Regex {
    static IMDB_RE: OnceLock<Regex> = OnceLock::new();
    IMDB_RE.get_or_init(|| Regex::new(r"(tt\d{6,9})").expect("valid imdb regex"))
}

fn imdb_in(text: &str) -> Option<String> {
    imdb_re().captures(text).map(|caps| caps[1].to_string())
}

/// First IMDB id found, trying in order: iframe `src`/`data-*` attributes, a scan
/// of the raw page, `data-imdb*` attributes (entity-decoded), then outbound IMDB
/// title links.
pub fn find_imdb_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let from_iframes = Selector::parse("iframe").ok().and_then(|selector| {
        document.select(&selector).find_map(|iframe| {
            iframe
                .value()
                .attrs()
                .filter(|(name, _)| *name == "src" || name.starts_with("data-"))
                .find_map(|(_, value)| imdb_in(value))
        })
    });
    if from_iframes.is_some() {
        return from_iframes;
    }

    if let Some(id) = imdb_in(html) {
        return Some(id);
    }

    let from_data_attributes = Selector::parse("*").ok().and_then(|selector| {
        document.select(&selector).find_map(|element| {
            element
                .value()
                .attrs()
                .filter(|(name, _)| name.starts_with("data-imdb"))
                .find_map(|(_, value)| imdb_in(value))
        })
    });
    if from_data_attributes.is_some() {
        return from_data_attributes;
    }

    attribute_values(&document, r#"a[href*="imdb.com/title/"]"#, "href")
        .iter()
        .find_map(|href| imdb_in(href))
}

pub fn resolver_endpoint(template: &str, imdb_id: &str) -> String {
    if template.contains("{imdb}") {
        template.replace("{imdb}", imdb_id)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), imdb_id)
    }
}

/// Mirror links on the resolver page, falling back to its player iframe.
pub fn resolver_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut candidates = data_links(&document, "ul._player-mirrors li[data-link]");
    for link in data_links(&document, "div._player-mirrors [data-link]") {
        if !candidates.contains(&link) {
            candidates.push(link);
        }
    }

    if candidates.is_empty() {
        candidates.extend(
            attribute_values(&document, "iframe[src]", "src")
                .into_iter()
                .take(1),
        );
    }
    candidates
}

/// Mirror links for `<season>-<episode>`, retrying without the season scope when
/// the page omits or mislabels `data-season`.
pub fn episode_mirrors(html: &str, episode_key: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let season = episode_key
        .split_once('-')
        .map(|(season, _)| season)
        .unwrap_or(episode_key);

    let scoped = format!(
        r#"div.dropdown.mirrors[data-season="{}"][data-episode="{}"] [data-link]"#,
        season, episode_key
    );
    let links = data_links(&document, &scoped);
    if !links.is_empty() {
        return links;
    }

    debug!("No season-scoped mirrors for {}, retrying by episode", episode_key);
    let unscoped = format!(
        r#"div.dropdown.mirrors[data-episode="{}"] [data-link]"#,
        episode_key
    );
    data_links(&document, &unscoped)
}

/// Relative mirrors point back at the title page's own site.
fn episode_discovery(html: &str, episode_key: &str, detail: String, base_url: &str) -> Discovery {
    Discovery {
        candidates: episode_mirrors(html, episode_key),
        origin: urls::origin_of(&detail).unwrap_or_else(|| base_url.to_string()),
        referer: detail,
    }
}

fn episode_keys(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut keys: Vec<String> =
        attribute_values(&document, "div.dropdown.mirrors[data-episode]", "data-episode");
    keys.dedup();
    keys
}

fn detail_url<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<String> {
    ctx.absolute(&link.title_ref)
        .ok_or_else(|| anyhow!("Invalid title reference: {}", link.title_ref))
}

pub async fn discover<F: Fetcher>(
    ctx: &RequestContext<'_, F>,
    link: &CatalogLink,
    resolver_template: &str,
) -> Result<Discovery> {
    let detail = detail_url(ctx, link)?;
    let html = ctx
        .get_page(&detail, &ctx.base_url)
        .await
        .context("Failed to load title page")?;

    if let Some(episode_key) = &link.episode {
        let discovery = episode_discovery(&html, episode_key, detail, &ctx.base_url);
        debug!("Episode {} has {} mirror(s)", episode_key, discovery.candidates.len());
        return Ok(discovery);
    }

    let Some(imdb_id) = find_imdb_id(&html) else {
        debug!("No IMDB id on {}", detail);
        return Ok(Discovery::empty(detail));
    };

    let endpoint = resolver_endpoint(resolver_template, &imdb_id);
    let mirrors = ctx
        .get_page(&endpoint, &detail)
        .await
        .with_context(|| format!("Failed to load mirror list for {}", imdb_id))?;

    let candidates = resolver_candidates(&mirrors);
    debug!("{} has {} mirror(s)", imdb_id, candidates.len());
    let origin = urls::origin_of(&endpoint).unwrap_or_else(|| endpoint.clone());
    Ok(Discovery {
        candidates,
        referer: endpoint,
        origin,
    })
}

pub async fn links<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<Vec<Link>> {
    let detail = detail_url(ctx, link)?;
    let html = ctx
        .get_page(&detail, &ctx.base_url)
        .await
        .context("Failed to load title page")?;

    let mut seasons: BTreeMap<u32, Vec<(u32, String)>> = BTreeMap::new();
    for key in episode_keys(&html) {
        let Some((season, episode)) = key.split_once('-') else {
            continue;
        };
        let (Ok(season), Ok(episode)) = (season.trim().parse(), episode.trim().parse()) else {
            continue;
        };
        seasons.entry(season).or_default().push((episode, key));
    }

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

    Ok(seasons
        .into_iter()
        .map(|(season, mut episodes)| {
            episodes.sort_by_key(|(number, _)| *number);
            episodes.dedup_by_key(|(number, _)| *number);
            Link {
                title: format!("Season {}", season),
                episodes_link: None,
                direct_links: episodes
                    .into_iter()
                    .map(|(number, key)| EpisodeLink {
                        title: format!("Episode {}", number),
                        link: CatalogLink::compose(&link.title_ref, &key),
                    })
                    .collect(),
            }
        })
        .collect())
}
