use reqwest::Url;

use crate::error::LoadError;

const VIDEO_ID_LEN: usize = 11;

/// Extracts the YouTube video id from a watch, share, embed or shorts URL.
pub fn extract_video_id(url: &str) -> Result<String, LoadError> {
    let malformed = || LoadError::MalformedUrl(url.to_string());

    let parsed = Url::parse(url.trim()).map_err(|_| malformed())?;
    let host = parsed.host_str().ok_or_else(malformed)?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    // Short links carry the id as the path, full links in `v=` or after a prefix
    let candidate = match host {
        "youtu.be" => parsed.path_segments().and_then(|mut s| s.next()).map(str::to_owned),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = parsed.path_segments().into_iter().flatten();
            match segments.next() {
                Some("watch") => parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed" | "shorts" | "v" | "live") => segments.next().map(str::to_owned),
                _ => None,
            }
        }
        _ => None,
    };

    candidate
        .filter(|id| is_video_id(id))
        .ok_or_else(malformed)
}

fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
