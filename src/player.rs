// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::PlayerConfig;
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerFlavor {
    Mpv,
    Vlc,
    Ffplay,
    Other,
}

/// Launches an external media player with the headers a stream needs.
#[derive(Debug, Clone)]
pub struct Player {
    config: PlayerConfig,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn flavor(&self) -> PlayerFlavor {
        let program = Path::new(&self.config.command)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.config.command)
            .to_lowercase();

        match program.as_str() {
            "mpv" => PlayerFlavor::Mpv,
            "vlc" | "cvlc" => PlayerFlavor::Vlc,
            "ffplay" => PlayerFlavor::Ffplay,
            _ => PlayerFlavor::Other,
        }
    }

    pub async fn is_available(&self) -> bool {
        Command::new(&self.config.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Arguments passed after the program name, ending with the stream URL.
    pub fn command_args(&self, stream: &Stream) -> Vec<String> {
        let mut args = self.config.args.clone();
        let header = |name: &str| stream.headers.get(name).map(String::as_str);

        match self.flavor() {
            PlayerFlavor::Mpv => {
                if let Some(agent) = header("User-Agent") {
                    args.push(format!("--user-agent={}", agent));
                }
                if let Some(referer) = header("Referer") {
                    args.push(format!("--referrer={}", referer));
                }
                for name in ["Origin", "Cookie"] {
                    if let Some(value) = header(name) {
                        args.push(format!("--http-header-fields-append={}: {}", name, value));
                    }
                }
                for track in &stream.subtitles {
                    args.push(format!("--sub-file={}", track.uri));
                }
            }
            PlayerFlavor::Vlc => {
                if let Some(agent) = header("User-Agent") {
                    args.push(format!("--http-user-agent={}", agent));
                }
                if let Some(referer) = header("Referer") {
                    args.push(format!("--http-referrer={}", referer));
                }
                for track in &stream.subtitles {
                    args.push(format!("--input-slave={}", track.uri));
                }
            }
            PlayerFlavor::Ffplay => {
                let headers: String = stream
                    .headers
                    .iter()
                    .map(|(name, value)| format!("{}: {}\r\n", name, value))
                    .collect();
                if !headers.is_empty() {
                    args.push("-headers".to_string());
                    args.push(headers);
                }
            }
            PlayerFlavor::Other => {}
        }

        args.push(stream.link.clone());
        args
    }

    /// Runs the player in the foreground until it exits.
    pub async fn play(&self, stream: &Stream) -> Result<()> {
        let args = self.command_args(stream);
        debug!("Starting player: {} {:?}", self.config.command, args);

        println!("Starting player: {} {}", self.config.command, stream.link);
        println!("Press Ctrl+C or quit the player to return");

        let status = Command::new(&self.config.command)
            .args(&args)
            .status()
            .await
            .with_context(|| {
                format!("Failed to execute player command: {}", self.config.command)
            })?;

        if !status.success() {
            return Err(anyhow::anyhow!(
                "Player process failed with exit code: {}",
                status
            ));
        }

        Ok(())
    }
}
