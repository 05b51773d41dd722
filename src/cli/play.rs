// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::CommandContext;
use anyhow::Result;
use inquire::Select;
use streamhop::{Player, Stream};

pub struct PlayCommand {
    pub provider: String,
    pub link: String,
}

impl PlayCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let kind = CommandContext::provider(&self.provider)?;
        let player = Player::new(&context.config.player);
        if !player.is_available().await {
            anyhow::bail!(
                "Player '{}' is not available. Install it or set [player] in config.toml",
                context.config.player.command
            );
        }

        eprintln!("Resolving {} on {}...", self.link, kind.display_name());
        let mut streams = context
            .resolver
            .get_streams(kind, &self.link, &context.cancel)
            .await;

        if streams.is_empty() {
            anyhow::bail!("No playable streams found for {}", self.link);
        }

        let index = if streams.len() == 1 {
            0
        } else {
            let options: Vec<String> = streams.iter().map(describe).collect();
            Select::new("Select stream:", options).raw_prompt()?.index
        };

        let stream = streams.swap_remove(index);
        player.play(&stream).await
    }
}

fn describe(stream: &Stream) -> String {
    if stream.subtitles.is_empty() {
        format!("{} ({})", stream.server, stream.stream_type)
    } else {
        format!(
            "{} ({}, {} subtitle track(s))",
            stream.server,
            stream.stream_type,
            stream.subtitles.len()
        )
    }
}
