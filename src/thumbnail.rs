//! Downloading and decoding YouTube thumbnails and video metadata.

use eframe::egui::ColorImage;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;

use crate::{error::LoadError, model::VideoInfo};

static META_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta\s+name="title"\s+content="([^"]*)""#).unwrap());
static PAGE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>(.*?)(?: - YouTube)?</title>").unwrap());
static LENGTH_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""lengthSeconds"\s*:\s*"(\d+)""#).unwrap());

/// Thumbnail renditions published for every video, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailQuality {
    Default,
    Medium,
    High,
    Standard,
    MaxRes,
}

impl ThumbnailQuality {
    pub const ALL: [ThumbnailQuality; 5] = [
        ThumbnailQuality::Default,
        ThumbnailQuality::Medium,
        ThumbnailQuality::High,
        ThumbnailQuality::Standard,
        ThumbnailQuality::MaxRes,
    ];

    pub fn width(self) -> u32 {
        match self {
            ThumbnailQuality::Default => 120,
            ThumbnailQuality::Medium => 320,
            ThumbnailQuality::High => 480,
            ThumbnailQuality::Standard => 640,
            ThumbnailQuality::MaxRes => 1280,
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default.jpg",
            ThumbnailQuality::Medium => "mqdefault.jpg",
            ThumbnailQuality::High => "hqdefault.jpg",
            ThumbnailQuality::Standard => "sddefault.jpg",
            ThumbnailQuality::MaxRes => "maxresdefault.jpg",
        }
    }

    pub fn url(self, video_id: &str) -> String {
        format!("https://img.youtube.com/vi/{}/{}", video_id, self.file_name())
    }

    /// Variants to try for a requested minimum width: the smallest one wide
    /// enough first, then every smaller one as a fallback.
    pub fn candidates_for(min_width: u32) -> Vec<ThumbnailQuality> {
        // Smallest variant wide enough, or the largest if none is
        let first = Self::ALL
            .iter()
            .position(|q| q.width() >= min_width)
            .unwrap_or(Self::ALL.len() - 1);
        // Then walk back down towards the smallest
        Self::ALL[..=first].iter().rev().copied().collect()
    }
}

/// Fetches and decodes an image. Runs on a background worker thread.
pub trait ImageLoader: Send + Sync {
    fn load(&self, image_url: &str) -> Result<ColorImage, LoadError>;
}

/// Resolves title and length of a video. Runs on a background worker thread.
pub trait VideoInfoProvider: Send + Sync {
    fn video_info(&self, video_id: &str) -> Result<VideoInfo, LoadError>;
}

/// Default network collaborator backed by a blocking reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, LoadError> {
        let client = Client::builder()
            .user_agent(concat!("youtube_thumbnail_view/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        // Missing variants answer 404, which must count as a failure
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

impl ImageLoader for HttpFetcher {
    fn load(&self, image_url: &str) -> Result<ColorImage, LoadError> {
        let bytes = self.get_bytes(image_url)?;
        decode_image(&bytes)
    }
}

impl VideoInfoProvider for HttpFetcher {
    fn video_info(&self, video_id: &str) -> Result<VideoInfo, LoadError> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let page = self.client.get(&url).send()?.error_for_status()?.text()?;
        parse_watch_page(video_id, &page)
    }
}

/// Decodes encoded image bytes into an RGBA image egui can upload
pub fn decode_image(bytes: &[u8]) -> Result<ColorImage, LoadError> {
    // Sniff the format and convert to RGBA8
    let img = image::load_from_memory(bytes)?.to_rgba8();
    // egui wants the dimensions separately from the raw bytes
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &img))
}

/// Pulls the title and length out of a watch page's HTML
pub fn parse_watch_page(video_id: &str, html: &str) -> Result<VideoInfo, LoadError> {
    // Prefer the meta tag; the <title> element carries a " - YouTube" suffix
    let title = META_TITLE
        .captures(html)
        .or_else(|| PAGE_TITLE.captures(html))
        .map(|c| decode_entities(c[1].trim()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LoadError::MissingMetadata(video_id.to_string()))?;
    // Live streams and some embeds carry no length; treat as unknown
    let length_seconds = LENGTH_SECONDS
        .captures(html)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    Ok(VideoInfo { title, length_seconds })
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ThumbnailQuality::*;

    #[test]
    fn candidates_start_at_smallest_sufficient_variant() {
        assert_eq!(ThumbnailQuality::candidates_for(320), vec![Medium, Default]);
        assert_eq!(ThumbnailQuality::candidates_for(321), vec![High, Medium, Default]);
        assert_eq!(ThumbnailQuality::candidates_for(0), vec![Default]);
    }

    #[test]
    fn oversized_request_starts_at_maxres() {
        assert_eq!(
            ThumbnailQuality::candidates_for(4000),
            vec![MaxRes, Standard, High, Medium, Default]
        );
    }

    #[test]
    fn thumbnail_urls() {
        assert_eq!(
            High.url("iCkYw3cRwLo"),
            "https://img.youtube.com/vi/iCkYw3cRwLo/hqdefault.jpg"
        );
    }

    #[test]
    fn parses_meta_title_and_length() {
        let html = r#"<html><head><title>ignored - YouTube</title>
            <meta name="title" content="Tom &amp; Jerry &quot;Live&quot;">
            </head><script>var x = {"videoDetails":{"lengthSeconds":"12345","title":"x"}};</script>"#;
        let info = parse_watch_page("iCkYw3cRwLo", html).unwrap();
        assert_eq!(info.title, "Tom & Jerry \"Live\"");
        assert_eq!(info.length_seconds, 12345);
    }

    #[test]
    fn falls_back_to_page_title_without_length() {
        let info = parse_watch_page("id", "<title>Plain video - YouTube</title>").unwrap();
        assert_eq!(info.title, "Plain video");
        assert_eq!(info.length_seconds, 0);
    }

    #[test]
    fn page_without_title_is_missing_metadata() {
        let err = parse_watch_page("abc", "<html></html>").unwrap_err();
        assert!(matches!(err, LoadError::MissingMetadata(id) if id == "abc"));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode_image(b"not an image"), Err(LoadError::Decode(_))));
    }
}
