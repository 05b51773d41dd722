// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

mod common;

use common::*;
use streamhop::ProviderKind;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_altadefinizione_seasons_from_mirror_dropdowns() {
    let detail = r#"
        <div class="dropdown mirrors" data-season="2" data-episode="2-1"><a data-link="x">x</a></div>
        <div class="dropdown mirrors" data-season="1" data-episode="1-2"><a data-link="x">x</a></div>
        <div class="dropdown mirrors" data-season="1" data-episode="1-1"><a data-link="x">x</a></div>"#;
    let fetcher = MockFetcher::new(vec![("https://alta.test/serie/the-show", page(detail))]);

    let links = resolver(&fetcher)
        .get_links(ProviderKind::Altadefinizione, "/serie/the-show", &CancellationToken::new())
        .await;

    let titles: Vec<_> = links.iter().map(|link| link.title.as_str()).collect();
    assert_eq!(titles, ["Season 1", "Season 2"]);
    assert_eq!(links[0].direct_links[0].title, "Episode 1");
    assert_eq!(links[0].direct_links[0].link, "/serie/the-show::1-1");
    assert_eq!(links[0].direct_links[1].link, "/serie/the-show::1-2");
    assert_eq!(links[1].direct_links[0].link, "/serie/the-show::2-1");
}

#[tokio::test]
async fn test_altadefinizione_movie_is_single_link() {
    let fetcher = MockFetcher::new(vec![(
        "https://alta.test/film/the-film",
        page("<html><body>movie</body></html>"),
    )]);

    let links = resolver(&fetcher)
        .get_links(ProviderKind::Altadefinizione, "/film/the-film", &CancellationToken::new())
        .await;

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title, "Movie");
    assert_eq!(links[0].direct_links[0].link, "/film/the-film");
}

#[tokio::test]
async fn test_streamingunity_fetches_other_seasons() {
    let detail = r#"<div id="app" data-page='{"props":{"title":{"id":42,"seasons":[{"number":1},{"number":2}]},"loadedSeason":{"number":1,"episodes":[{"id":901,"number":1,"name":"Pilot"},{"id":902,"number":2}]}}}'></div>"#;
    let season_two = r#"<div id="app" data-page='{"props":{"title":{"id":42},"loadedSeason":{"number":2,"episodes":[{"id":950,"number":1}]}}}'></div>"#;
    let fetcher = MockFetcher::new(vec![
        ("https://su.test/it/titles/42-the-show", page(detail)),
        ("https://su.test/it/titles/42-the-show/season-2", page(season_two)),
    ]);

    let links = resolver(&fetcher)
        .get_links(ProviderKind::StreamingUnity, "/it/titles/42-the-show", &CancellationToken::new())
        .await;

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].title, "Season 1");
    assert_eq!(links[0].direct_links[0].title, "Episode 1 - Pilot");
    assert_eq!(links[0].direct_links[1].link, "/it/titles/42-the-show::902");
    assert_eq!(links[1].direct_links[0].link, "/it/titles/42-the-show::950");
    assert_eq!(fetcher.requested_urls().len(), 2);
}

#[tokio::test]
async fn test_animeunity_episodes_from_player() {
    let detail = r#"<video-player episodes='[{"id":901,"number":"1"},{"id":902,"number":"2"}]'></video-player>"#;
    let fetcher = MockFetcher::new(vec![("https://au.test/anime/77-show", page(detail))]);

    let links = resolver(&fetcher)
        .get_links(ProviderKind::AnimeUnity, "/anime/77-show", &CancellationToken::new())
        .await;

    assert_eq!(links.len(), 1);
    let episodes: Vec<_> = links[0]
        .direct_links
        .iter()
        .map(|episode| (episode.title.as_str(), episode.link.as_str()))
        .collect();
    assert_eq!(
        episodes,
        [
            ("Episode 1", "/anime/77-show::901"),
            ("Episode 2", "/anime/77-show::902"),
        ]
    );
}

#[tokio::test]
async fn test_failed_listing_is_empty() {
    let fetcher = MockFetcher::new(Vec::new());

    let links = resolver(&fetcher)
        .get_links(ProviderKind::StreamingUnity, "/it/titles/1-x", &CancellationToken::new())
        .await;

    assert!(links.is_empty());
}
