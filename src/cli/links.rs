// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;

pub struct LinksCommand {
    pub provider: String,
    pub title_ref: String,
    pub format: OutputFormat,
}

impl LinksCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let kind = CommandContext::provider(&self.provider)?;
        let links = context
            .resolver
            .get_links(kind, &self.title_ref, &context.cancel)
            .await;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&links)?);
            }
            OutputFormat::Text => {
                if links.is_empty() {
                    println!("No links found");
                }
                for link in &links {
                    println!("{}", link.title);
                    for episode in &link.direct_links {
                        println!("  {:<30} {}", episode.title, episode.link);
                    }
                }
            }
            OutputFormat::M3u => {
                eprintln!("M3U format not supported for link listing");
            }
        }

        Ok(())
    }
}
