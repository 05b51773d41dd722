// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod assembler;
pub mod base_url;
pub mod cache;
pub mod config;
pub mod context;
pub mod cookies;
pub mod embed;
pub mod http;
pub mod player;
pub mod providers;
pub mod resolver;
pub mod stream;
pub mod subtitles;
pub mod unpacker;
pub mod urls;

pub use cache::CacheManager;
pub use config::Config;
pub use player::Player;
pub use providers::{CatalogLink, ProviderKind};
pub use resolver::Resolver;
pub use stream::{EpisodeLink, Link, Stream, StreamType};
pub use subtitles::TextTrack;

/// Resolver wired to the real network stack.
pub type HttpResolver = Resolver<http::HttpFetcher, base_url::RemoteBaseUrls<http::HttpFetcher>>;
