// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::http::DEFAULT_USER_AGENT;
use crate::providers::ProviderKind;
use crate::providers::altadefinizione::DEFAULT_RESOLVER_URL;
use crate::providers::streamingunity::DEFAULT_LOCALE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: Vec<ProviderConfig>,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub key: String,
    pub name: Option<String>,
    pub default_url: String,
    /// Remote document naming the provider's current domain.
    #[serde(default)]
    pub pointer_url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    /// Mirror list endpoint; `{imdb}` is replaced with the title's IMDB id.
    #[serde(default)]
    pub resolver_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub base_url_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl ProviderConfig {
    pub fn builtin(kind: ProviderKind) -> Self {
        Self {
            key: kind.key().to_string(),
            name: Some(kind.display_name().to_string()),
            default_url: kind.default_url().to_string(),
            pointer_url: None,
            locale: match kind {
                ProviderKind::StreamingUnity => Some(DEFAULT_LOCALE.to_string()),
                _ => None,
            },
            resolver_url: match kind {
                ProviderKind::Altadefinizione => Some(DEFAULT_RESOLVER_URL.to_string()),
                _ => None,
            },
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 12,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_url_ttl_secs: 6 * 60 * 60,
        }
    }
}

impl CacheConfig {
    pub fn base_url_ttl(&self) -> Duration {
        Duration::from_secs(self.base_url_ttl_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            args: vec!["--fs".to_string(), "--quiet".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderKind::ALL
                .into_iter()
                .map(ProviderConfig::builtin)
                .collect(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("streamhop").join("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            warn!("Could not load config file, using defaults: {:#}", e);
            Self::default()
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// The configured entry for `kind`, or its built-in settings.
    pub fn provider(&self, kind: ProviderKind) -> ProviderConfig {
        self.providers
            .iter()
            .find(|provider| provider.key.eq_ignore_ascii_case(kind.key()))
            .cloned()
            .unwrap_or_else(|| ProviderConfig::builtin(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_has_builtin_providers() {
        let config = Config::default();
        let keys: Vec<_> = config.providers.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["altadefinizionez", "streamingunity", "animeunity"]);
        assert_eq!(config.http.timeout(), Duration::from_secs(12));
        assert_eq!(
            config.provider(ProviderKind::Altadefinizione).resolver_url.as_deref(),
            Some(DEFAULT_RESOLVER_URL)
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [[providers]]
            key = "animeunity"
            default_url = "https://anime.test"
            pointer_url = "https://pointer.test/domains.json"

            [player]
            command = "vlc"
            "#,
        )
        .unwrap();

        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.provider(ProviderKind::AnimeUnity).default_url, "https://anime.test");
        assert_eq!(
            config.provider(ProviderKind::StreamingUnity),
            ProviderConfig::builtin(ProviderKind::StreamingUnity)
        );
        assert_eq!(config.player.command, "vlc");
        assert_eq!(config.player.args, ["--fs", "--quiet"]);
        assert_eq!(config.cache.base_url_ttl_secs, 6 * 60 * 60);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.player.command = "ffplay".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.player.command, "ffplay");
        assert_eq!(loaded.providers, config.providers);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml"));
        assert_eq!(config.providers.len(), 3);
    }
}
