use eframe::egui::{ColorImage, TextureHandle};

/// Metadata resolved for a video before its thumbnail is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    /// Human-readable video title
    pub title: String,
    /// Video length; zero when the source did not report one
    pub length_seconds: i64,
}

/// Everything a successful load pushes back into the widget
#[derive(Debug)]
pub struct LoadedThumbnail {
    pub info: VideoInfo,
    pub image: ColorImage,
}

/// Image content accepted by the widget.
///
/// `Pixels` is decoded data the widget uploads itself on the next frame;
/// `Texture` is something the host already uploaded (an icon, a shared cache
/// entry) and is drawn as-is.
#[derive(Clone)]
pub enum ThumbnailImage {
    Pixels(ColorImage),
    Texture(TextureHandle),
}

impl ThumbnailImage {
    /// Pixel size of the content, used for center-crop math
    pub fn size(&self) -> [usize; 2] {
        match self {
            ThumbnailImage::Pixels(img) => img.size,
            ThumbnailImage::Texture(tex) => tex.size(),
        }
    }
}

impl std::fmt::Debug for ThumbnailImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThumbnailImage::Pixels(img) => f.debug_tuple("Pixels").field(&img.size).finish(),
            ThumbnailImage::Texture(tex) => f.debug_tuple("Texture").field(&tex.name()).finish(),
        }
    }
}

impl From<ColorImage> for ThumbnailImage {
    fn from(img: ColorImage) -> Self {
        ThumbnailImage::Pixels(img)
    }
}

impl From<TextureHandle> for ThumbnailImage {
    fn from(tex: TextureHandle) -> Self {
        ThumbnailImage::Texture(tex)
    }
}
