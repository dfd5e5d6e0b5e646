use std::{fs, path::Path, time::Duration};

use eframe::egui::{Color32, Margin};
use serde::{Deserialize, Serialize};

use crate::error::StyleError;

pub const DEFAULT_MIN_THUMBNAIL_WIDTH: u32 = 320;
pub const DEFAULT_FADE_DURATION_MS: u64 = 500;
const DEFAULT_TITLE_MAX_LINES: usize = 1;
const OVERLAY_BACKGROUND: u32 = 0x8000_0000;
const WHITE: u32 = 0xFFFF_FFFF;

/// Converts a packed `0xAARRGGBB` color.
pub fn argb(color: u32) -> Color32 {
    let [a, r, g, b] = color.to_be_bytes();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Padding or margin in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Insets {
    pub const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self { left, right, top, bottom }
    }
}

impl Default for Insets {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl From<Insets> for Margin {
    fn from(i: Insets) -> Self {
        Margin {
            left: i.left,
            right: i.right,
            top: i.top,
            bottom: i.bottom,
        }
    }
}

/// Styling of the title strip along the top edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleStyle {
    pub text_color: u32,
    pub background_color: u32,
    pub padding: Insets,
    pub text_size: f32,
    /// Longer titles are ellipsized on the last line
    pub max_lines: usize,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            text_color: WHITE,
            background_color: OVERLAY_BACKGROUND,
            padding: Insets::new(10.0, 10.0, 5.0, 5.0),
            text_size: 16.0,
            max_lines: DEFAULT_TITLE_MAX_LINES,
        }
    }
}

/// Styling of the duration badge in the bottom-right corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStyle {
    pub text_color: u32,
    pub background_color: u32,
    pub padding: Insets,
    pub margin_bottom: f32,
    pub margin_right: f32,
    pub text_size: f32,
}

impl Default for TimeStyle {
    fn default() -> Self {
        Self {
            text_color: WHITE,
            background_color: OVERLAY_BACKGROUND,
            padding: Insets::new(5.0, 5.0, 0.0, 0.0),
            margin_bottom: 10.0,
            margin_right: 10.0,
            text_size: 12.0,
        }
    }
}

/// Construction-time configuration of a [`ThumbnailView`](crate::ThumbnailView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailStyle {
    /// Smallest thumbnail width worth downloading; larger variants are preferred
    pub min_thumbnail_width: u32,
    pub title_visible: bool,
    pub time_visible: bool,
    pub fade_duration_ms: u64,
    pub title: TitleStyle,
    pub time: TimeStyle,
}

impl Default for ThumbnailStyle {
    fn default() -> Self {
        Self {
            min_thumbnail_width: DEFAULT_MIN_THUMBNAIL_WIDTH,
            title_visible: true,
            time_visible: true,
            fade_duration_ms: DEFAULT_FADE_DURATION_MS,
            title: TitleStyle::default(),
            time: TimeStyle::default(),
        }
    }
}

impl ThumbnailStyle {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StyleError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let style: ThumbnailStyle =
            serde_json::from_str(r#"{"time_visible": false, "title": {"max_lines": 2}}"#).unwrap();
        assert!(!style.time_visible);
        assert!(style.title_visible);
        assert_eq!(style.min_thumbnail_width, 320);
        assert_eq!(style.title.max_lines, 2);
        assert_eq!(style.title.padding, Insets::new(10.0, 10.0, 5.0, 5.0));
        assert_eq!(style.time, TimeStyle::default());
    }

    #[test]
    fn argb_unpacks_channels() {
        assert_eq!(argb(0xFFFF_FFFF), Color32::WHITE);
        assert_eq!(argb(0x8000_0000), Color32::from_rgba_unmultiplied(0, 0, 0, 0x80));
        assert_eq!(argb(0xFF12_3456), Color32::from_rgb(0x12, 0x34, 0x56));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ThumbnailStyle::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, StyleError::Io { .. }));
    }
}
