//! An egui widget showing a YouTube video thumbnail with its title and
//! duration overlaid, loaded in the background from a video URL.

// Error types surfaced through listeners and style loading
pub mod error;
// Duration badge text
pub mod format;
// Loading listener callbacks
pub mod listener;
// Background load requests and the shared worker runtime
pub mod loader;
// Data passed between loader and widget
pub mod model;
// Construction-time styling
pub mod style;
// Thumbnail and metadata fetching
pub mod thumbnail;
// Video id extraction from URLs
pub mod video_id;
// The widget itself
pub mod widget;

pub use error::{LoadError, StyleError};
pub use format::format_duration;
pub use listener::ThumbnailLoadingListener;
pub use loader::ThumbnailLoader;
pub use model::{ThumbnailImage, VideoInfo};
pub use style::ThumbnailStyle;
pub use thumbnail::{decode_image, HttpFetcher, ImageLoader, ThumbnailQuality, VideoInfoProvider};
pub use video_id::extract_video_id;
pub use widget::ThumbnailView;
