// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Dropload pages use the stock `p,a,c,k,e,d` packer with any base; the decoded
//! script holds the absolute media URL somewhere in its player config.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::DecodedEmbed;
use crate::subtitles::extract_tracks;
use crate::unpacker::find_packed;
use crate::urls;

fn media_url(decoded: &str) -> Option<String> {
    static M3U8_RE: OnceLock<Regex> = OnceLock::new();
    static MP4_RE: OnceLock<Regex> = OnceLock::new();

    let m3u8 = M3U8_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s"'<>\\]+?\.m3u8(?:\?[^\s"'<>\\]*)?"#).expect("valid m3u8 regex")
    });
    let mp4 = MP4_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s"'<>\\]+?\.mp4(?:\?[^\s"'<>\\]*)?"#).expect("valid mp4 regex")
    });

    let text = decoded.replace("\\/", "/");
    m3u8.find(&text)
        .or_else(|| mp4.find(&text))
        .map(|found| found.as_str().to_string())
}

pub fn decode(html: &str, origin: &str) -> DecodedEmbed {
    let Some(packed) = find_packed(html) else {
        debug!("No packer block found on Dropload page");
        return DecodedEmbed::default();
    };

    let payload = packed.unpack();
    let stream_url = media_url(&payload)
        .and_then(|url| urls::normalize(&url, origin))
        .unwrap_or_default();

    DecodedEmbed {
        stream_url,
        declared_type: None,
        subtitles: extract_tracks(&payload, Some(origin)),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamType;

    const EMBED_PAGE: &str = r#"<html><head><script>$.cookie('file_id', '4242', { expires: 10 });</script></head>
<body><script type="text/javascript">eval(function(p,a,c,k,e,d){e=function(c){return c.toString(36)};if(!''.replace(/^/,String)){while(c--){d[c.toString(a)]=k[c]||c.toString(a)}k=[function(e){return d[e]}];e=function(){return'\\w+'};c=1};while(c--){if(k[c]){p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c])}}return p}('1 2={3:"4://5.6.7/8/9.a?s=xy",b:[{3:"/c/d_ita.e",f:"g",h:"i"}]};0',36,19,'|var|cfg|file|https|cdn|dropload|test|hls|index|m3u8|tracks|subs|episode|vtt|label|Italian|kind|captions'.split('|'),0,{}))
</script></body></html>"#;

    #[test]
    fn test_decodes_known_page() {
        let decoded = decode(EMBED_PAGE, "https://dropload.test/e/ep25");
        assert_eq!(
            decoded.payload,
            r#"var cfg={file:"https://cdn.dropload.test/hls/index.m3u8?s=xy",tracks:[{file:"/subs/d_ita.vtt",label:"Italian",kind:"captions"}]};0"#
        );
        assert_eq!(decoded.stream_url, "https://cdn.dropload.test/hls/index.m3u8?s=xy");
        assert_eq!(decoded.stream_type(), Some(StreamType::M3u8));
        assert_eq!(decoded.subtitles.len(), 1);
        assert_eq!(decoded.subtitles[0].uri, "https://dropload.test/subs/d_ita.vtt");
    }

    #[test]
    fn test_falls_back_to_mp4() {
        let decoded = "player.src({src:'https:\\/\\/cdn.test\\/v\\/movie.mp4?e=1'})";
        assert_eq!(
            media_url(decoded).as_deref(),
            Some("https://cdn.test/v/movie.mp4?e=1")
        );
    }

    #[test]
    fn test_prefers_m3u8_over_mp4() {
        let decoded = r#"poster:"https://cdn.test/p.mp4",file:"https://cdn.test/hls/master.m3u8""#;
        assert_eq!(
            media_url(decoded).as_deref(),
            Some("https://cdn.test/hls/master.m3u8")
        );
    }

    #[test]
    fn test_page_without_packer() {
        assert!(decode("<html></html>", "https://dropload.test/e/1").is_empty());
    }
}
