// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use streamhop::Stream;

pub struct StreamsCommand {
    pub provider: String,
    pub link: String,
    pub format: OutputFormat,
}

impl StreamsCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let kind = CommandContext::provider(&self.provider)?;
        eprintln!("Resolving {} on {}...", self.link, kind.display_name());

        let streams = context
            .resolver
            .get_streams(kind, &self.link, &context.cancel)
            .await;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&streams)?),
            OutputFormat::M3u => print!("{}", render_m3u(&streams)),
            OutputFormat::Text => print!("{}", render_text(&streams)),
        }

        Ok(())
    }
}

pub fn render_text(streams: &[Stream]) -> String {
    if streams.is_empty() {
        return "No playable streams found\n".to_string();
    }

    let mut out = String::new();
    for (i, stream) in streams.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} [{}]\n   {}\n",
            i + 1,
            stream.server,
            stream.stream_type,
            stream.link
        ));
        for track in &stream.subtitles {
            out.push_str(&format!("   sub {} ({}): {}\n", track.title, track.language, track.uri));
        }
        for (name, value) in &stream.headers {
            out.push_str(&format!("   {}: {}\n", name, value));
        }
    }
    out
}

/// Extended M3U with the VLC options players need to replay the headers.
pub fn render_m3u(streams: &[Stream]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for stream in streams {
        out.push_str(&format!("#EXTINF:-1,{}\n", stream.server));
        if let Some(referer) = stream.headers.get("Referer") {
            out.push_str(&format!("#EXTVLCOPT:http-referrer={}\n", referer));
        }
        if let Some(agent) = stream.headers.get("User-Agent") {
            out.push_str(&format!("#EXTVLCOPT:http-user-agent={}\n", agent));
        }
        if let Some(cookie) = stream.headers.get("Cookie") {
            out.push_str(&format!("#EXTVLCOPT:http-cookie={}\n", cookie));
        }
        out.push_str(&stream.link);
        out.push('\n');
    }
    out
}
