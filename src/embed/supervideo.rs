// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! SuperVideo pages wrap the player setup in a base-36 eval packer:
//! `eval(function(p,a,c,k,e,d){...return p}('<payload>',36,<count>,'<dict>'.split('|')))`.
//! The decoded setup declares the stream as `file:"<url>.m3u8?..."`.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::DecodedEmbed;
use crate::subtitles::extract_tracks;
use crate::unpacker::{PackedScript, unescape_js};
use crate::urls;

const PACKER_BASE: u32 = 36;

pub fn find_packed(html: &str) -> Option<PackedScript> {
    static PACKER_RE: OnceLock<Regex> = OnceLock::new();
    let re = PACKER_RE.get_or_init(|| {
        Regex::new(
            r"(?s)eval\(function\([^)]*\)\{.*?return p\}\('(.*?)',36,(\d+),'(.*?)'\.split\('\|'\)",
        )
        .expect("valid supervideo packer regex")
    });

    let caps = re.captures(html)?;
    Some(PackedScript {
        payload: unescape_js(&caps[1]),
        base: PACKER_BASE,
        count: caps[2].parse().ok()?,
        dictionary: caps[3].split('|').map(str::to_string).collect(),
    })
}

fn stream_file(decoded: &str) -> Option<&str> {
    static FILE_RE: OnceLock<Regex> = OnceLock::new();
    let re = FILE_RE.get_or_init(|| {
        Regex::new(r#"file\s*:\s*["']([^"']+?\.m3u8[^"']*)["']"#).expect("valid file regex")
    });

    re.captures(decoded)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str())
}

pub fn decode(html: &str, origin: &str) -> DecodedEmbed {
    let Some(packed) = find_packed(html) else {
        debug!("No SuperVideo packer block found");
        return DecodedEmbed::default();
    };

    let payload = packed.unpack();
    let stream_url = stream_file(&payload)
        .and_then(|file| urls::normalize(file, origin))
        .unwrap_or_default();

    if stream_url.is_empty() {
        debug!("SuperVideo payload decoded but carries no m3u8 file");
    }

    DecodedEmbed {
        stream_url,
        declared_type: None,
        subtitles: extract_tracks(&payload, Some(origin)),
        payload,
    }
}
