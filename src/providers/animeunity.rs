// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result, anyhow};
use scraper::Html;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogLink, Discovery, attribute_values, deserialize_number_as_string};
use crate::context::RequestContext;
use crate::http::Fetcher;
use crate::stream::{EpisodeLink, Link};
use crate::urls;

#[derive(Debug, Clone, Deserialize)]
struct PlayerEpisode {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    id: String,
    #[serde(deserialize_with = "deserialize_number_as_string")]
    number: String,
}

/// What the `<video-player>` component on a title page exposes.
#[derive(Debug, Clone, Default)]
struct VideoPlayer {
    embed_url: Option<String>,
    episodes: Vec<PlayerEpisode>,
}

fn video_player(html: &str) -> VideoPlayer {
    let document = Html::parse_document(html);
    let embed_url = attribute_values(&document, "video-player[embed_url]", "embed_url")
        .into_iter()
        .next();
    let episodes = attribute_values(&document, "video-player[episodes]", "episodes")
        .into_iter()
        .next()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();

    VideoPlayer {
        embed_url,
        episodes,
    }
}

pub fn embed_endpoint(base_url: &str, episode_id: &str) -> String {
    format!(
        "{}/embed-url/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(episode_id)
    )
}

fn detail_url<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<String> {
    ctx.absolute(&link.title_ref)
        .ok_or_else(|| anyhow!("Invalid title reference: {}", link.title_ref))
}

async fn embed_for_episode<F: Fetcher>(
    ctx: &RequestContext<'_, F>,
    episode_id: &str,
    referer: &str,
) -> Result<Option<String>> {
    let endpoint = embed_endpoint(&ctx.base_url, episode_id);
    let body = ctx
        .get_page(&endpoint, referer)
        .await
        .with_context(|| format!("Failed to look up embed for episode {}", episode_id))?;

    let embed = body.trim();
    Ok((!embed.is_empty()).then(|| embed.to_string()))
}

pub async fn discover<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<Discovery> {
    let detail = detail_url(ctx, link)?;

    let embed = match &link.episode {
        Some(episode_id) => embed_for_episode(ctx, episode_id, &detail).await?,
        None => {
            let html = ctx
                .get_page(&detail, &ctx.base_url)
                .await
                .context("Failed to load title page")?;
            let player = video_player(&html);
            match (player.embed_url, player.episodes.first()) {
                (Some(embed_url), _) => Some(embed_url),
                (None, Some(first)) => embed_for_episode(ctx, &first.id, &detail).await?,
                (None, None) => None,
            }
        }
    };

    let Some(embed) = embed else {
        debug!("No embed link for {}", link);
        return Ok(Discovery::empty(detail));
    };

    Ok(Discovery {
        candidates: vec![embed],
        origin: urls::origin_of(&detail).unwrap_or_else(|| ctx.base_url.clone()),
        referer: detail,
    })
}

pub async fn links<F: Fetcher>(ctx: &RequestContext<'_, F>, link: &CatalogLink) -> Result<Vec<Link>> {
    let detail = detail_url(ctx, link)?;
    let html = ctx
        .get_page(&detail, &ctx.base_url)
        .await
        .context("Failed to load title page")?;

    let episodes = video_player(&html).episodes;
    if episodes.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Link {
        title: "Episodes".to_string(),
        episodes_link: None,
        direct_links: episodes
            .into_iter()
            .map(|episode| EpisodeLink {
                title: format!("Episode {}", episode.number),
                link: CatalogLink::compose(&link.title_ref, &episode.id),
            })
            .collect(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_player_attributes() {
        let html = r#"<video-player anime="{}" embed_url="https://vixcloud.test/embed/77?token=x"
            episodes='[{"id":901,"number":"1"},{"id":"902","number":2}]'></video-player>"#;
        let player = video_player(html);
        assert_eq!(
            player.embed_url.as_deref(),
            Some("https://vixcloud.test/embed/77?token=x")
        );
        assert_eq!(player.episodes.len(), 2);
        assert_eq!(player.episodes[0].id, "901");
        assert_eq!(player.episodes[1].number, "2");
    }

    #[test]
    fn test_missing_player() {
        let player = video_player("<div></div>");
        assert!(player.embed_url.is_none());
        assert!(player.episodes.is_empty());
    }

    #[test]
    fn test_embed_endpoint() {
        assert_eq!(
            embed_endpoint("https://au.test/", "901"),
            "https://au.test/embed-url/901"
        );
    }
}
