// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use serde_json::json;
use streamhop::ProviderKind;

pub struct ProvidersCommand {
    pub format: OutputFormat,
}

impl ProvidersCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let mut providers_info = Vec::new();
        for kind in ProviderKind::ALL {
            let provider = context.config.provider(kind);
            let live_url = context.resolver.base_url(kind).await;
            providers_info.push(json!({
                "key": kind.key(),
                "name": provider.display_name(),
                "default_url": provider.default_url,
                "url": live_url,
            }));
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&providers_info)?);
            }
            OutputFormat::Text => {
                println!("Configured providers:");
                for (i, info) in providers_info.iter().enumerate() {
                    let key = info["key"].as_str().unwrap_or("");
                    let name = info["name"].as_str().unwrap_or("");
                    let url = info["url"].as_str().unwrap_or("");
                    println!("  {}. {} [{}] ({})", i + 1, name, key, url);
                }
            }
            OutputFormat::M3u => {
                eprintln!("M3U format not supported for provider list");
            }
        }

        Ok(())
    }
}
