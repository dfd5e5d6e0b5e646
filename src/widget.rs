//! The composite thumbnail widget: image surface, title strip and time badge.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use eframe::egui::{
    self,
    pos2,
    text::{LayoutJob, TextFormat, TextWrapping},
    vec2, Color32, ColorImage, FontId, Margin, Painter, Rect, Sense, TextureHandle,
    TextureOptions, Vec2,
};
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    error::LoadError,
    format::format_duration,
    listener::ThumbnailLoadingListener,
    loader::{Completion, LoadRequest, RepaintSlot, ThumbnailLoader},
    model::ThumbnailImage,
    style::{argb, ThumbnailStyle, TimeStyle, TitleStyle},
    thumbnail::ImageLoader,
};

const ASPECT_RATIO: f32 = 16.0 / 9.0;

/// Title strip along the top edge
#[derive(Debug, Default)]
pub struct TitleView {
    text: String,
    visible: bool,
    style: TitleStyle,
}

impl TitleView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn style(&self) -> &TitleStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut TitleStyle {
        &mut self.style
    }

    fn paint(&self, painter: &Painter, rect: Rect, alpha: f32) {
        if self.text.is_empty() {
            return;
        }
        let padding = Margin::from(self.style.padding);
        let text_color = argb(self.style.text_color).gamma_multiply(alpha);
        let mut job = LayoutJob::single_section(
            self.text.clone(),
            TextFormat::simple(FontId::proportional(self.style.text_size), text_color),
        );
        job.wrap = TextWrapping {
            max_width: (rect.width() - padding.sum().x).max(0.0),
            max_rows: self.style.max_lines.max(1),
            break_anywhere: false,
            overflow_character: Some('…'),
        };
        let galley = painter.layout_job(job);

        // Strip spans the full width and grows with the wrapped title
        let strip = Rect::from_min_size(
            rect.min,
            vec2(rect.width(), galley.size().y + padding.sum().y),
        );
        painter.rect_filled(strip, 0.0, argb(self.style.background_color).gamma_multiply(alpha));
        painter.galley(strip.min + vec2(padding.left, padding.top), galley, text_color);
    }
}

/// Duration badge in the bottom-right corner
#[derive(Debug, Default)]
pub struct TimeView {
    text: String,
    seconds: i64,
    visible: bool,
    style: TimeStyle,
}

impl TimeView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn style(&self) -> &TimeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut TimeStyle {
        &mut self.style
    }

    fn paint(&self, painter: &Painter, rect: Rect, alpha: f32) {
        if self.text.is_empty() {
            return;
        }
        let padding = Margin::from(self.style.padding);
        let text_color = argb(self.style.text_color).gamma_multiply(alpha);
        let mut job = LayoutJob::single_section(
            self.text.clone(),
            TextFormat::simple(FontId::proportional(self.style.text_size), text_color),
        );
        job.wrap = TextWrapping {
            max_width: rect.width(),
            max_rows: 1,
            break_anywhere: true,
            overflow_character: None,
        };
        let galley = painter.layout_job(job);

        // Anchor the badge to the bottom-right corner, inset by its margins
        let size = galley.size() + padding.sum();
        let corner = rect.right_bottom() - vec2(self.style.margin_right, self.style.margin_bottom);
        let badge = Rect::from_min_max(corner - size, corner);
        painter.rect_filled(badge, 0.0, argb(self.style.background_color).gamma_multiply(alpha));
        painter.galley(badge.min + vec2(padding.left, padding.top), galley, text_color);
    }
}

/// The center-cropped image behind the overlays
#[derive(Debug, Default)]
pub struct ImageSurface {
    source: Option<ThumbnailImage>,
}

impl ImageSurface {
    pub fn image(&self) -> Option<&ThumbnailImage> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn set_image(&mut self, image: impl Into<ThumbnailImage>) {
        self.source = Some(image.into());
    }

    pub fn clear(&mut self) {
        self.source = None;
    }

    /// Uploads pending pixels on first use; the CPU copy is released afterwards.
    fn texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        // Swap the pixel buffer for a GPU texture exactly once
        if matches!(self.source, Some(ThumbnailImage::Pixels(_))) {
            if let Some(ThumbnailImage::Pixels(pixels)) = self.source.take() {
                let texture = ctx.load_texture("youtube-thumbnail", pixels, TextureOptions::LINEAR);
                self.source = Some(ThumbnailImage::Texture(texture));
            }
        }
        match &self.source {
            Some(ThumbnailImage::Texture(texture)) => Some(texture),
            _ => None,
        }
    }

    fn paint(&mut self, painter: &Painter, rect: Rect, alpha: f32) {
        if let Some(texture) = self.texture(painter.ctx()) {
            let uv = center_crop_uv(texture.size(), rect.size());
            painter.image(texture.id(), rect, uv, Color32::WHITE.gamma_multiply(alpha));
        }
    }
}

/// UV rectangle that fills `target` with the image, cropping the overflow
/// evenly on both sides.
fn center_crop_uv(image: [usize; 2], target: Vec2) -> Rect {
    let full = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
    let [w, h] = image;
    if w == 0 || h == 0 || target.x <= 0.0 || target.y <= 0.0 {
        return full;
    }
    let image_aspect = w as f32 / h as f32;
    let target_aspect = target.x / target.y;
    // Wider than the target: crop left and right, otherwise top and bottom
    if image_aspect > target_aspect {
        let span = target_aspect / image_aspect;
        let x0 = (1.0 - span) / 2.0;
        Rect::from_min_max(pos2(x0, 0.0), pos2(x0 + span, 1.0))
    } else {
        let span = image_aspect / target_aspect;
        let y0 = (1.0 - span) / 2.0;
        Rect::from_min_max(pos2(0.0, y0), pos2(1.0, y0 + span))
    }
}

fn decelerate(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    started: Instant,
    title: bool,
    time: bool,
}

struct PendingLoad {
    request: LoadRequest,
    listener: Option<Box<dyn ThumbnailLoadingListener>>,
}

/// Video thumbnail with an overlaid title and duration badge.
///
/// Content comes either from [`display_thumbnail`](Self::display_thumbnail)
/// or from a background load started with one of the `load_thumbnail*`
/// methods. At most one load is in flight; starting another one, displaying
/// content directly, clearing, or dropping the view cancels it.
pub struct ThumbnailView {
    thumbnail: ImageSurface,
    title: TitleView,
    time: TimeView,

    is_loaded: bool,
    min_thumbnail_width: u32,
    title_visible: bool,
    time_visible: bool,
    fade_duration: Duration,
    fade: Option<Fade>,

    next_request_id: u64,
    pending: Option<PendingLoad>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    loader: Option<Arc<ThumbnailLoader>>,
    repaint: RepaintSlot,
}

impl Default for ThumbnailView {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailView {
    pub fn new() -> Self {
        Self::with_style(ThumbnailStyle::default())
    }

    pub fn with_style(style: ThumbnailStyle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            thumbnail: ImageSurface::default(),
            title: TitleView {
                style: style.title.clone(),
                ..TitleView::default()
            },
            time: TimeView {
                style: style.time.clone(),
                ..TimeView::default()
            },
            is_loaded: false,
            min_thumbnail_width: style.min_thumbnail_width,
            title_visible: style.title_visible,
            time_visible: style.time_visible,
            fade_duration: style.fade_duration(),
            fade: None,
            next_request_id: 0,
            pending: None,
            tx,
            rx,
            loader: None,
            repaint: Arc::new(OnceCell::new()),
        }
    }

    /// Lets background loads wake the UI. [`ui`](Self::ui) does this on the
    /// first frame; hosts that start loads earlier (e.g. in `App::new`)
    /// should call it with the creation context. Loads already in flight
    /// pick the context up too.
    pub fn bind_context(&mut self, ctx: &egui::Context) {
        // First binding wins; a view lives in one egui context
        self.repaint.get_or_init(|| ctx.clone());
    }

    /// Replaces the process-wide loader for this view's future loads
    pub fn set_loader(&mut self, loader: Arc<ThumbnailLoader>) {
        self.loader = Some(loader);
    }

    pub fn set_fade_duration(&mut self, duration: Duration) {
        self.fade_duration = duration;
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Whether a background load is still outstanding
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn title_view(&self) -> &TitleView {
        &self.title
    }

    pub fn title_view_mut(&mut self) -> &mut TitleView {
        &mut self.title
    }

    pub fn time_view(&self) -> &TimeView {
        &self.time
    }

    pub fn time_view_mut(&mut self) -> &mut TimeView {
        &mut self.time
    }

    pub fn thumbnail_view(&self) -> &ImageSurface {
        &self.thumbnail
    }

    pub fn thumbnail_view_mut(&mut self) -> &mut ImageSurface {
        &mut self.thumbnail
    }

    pub fn clear_thumbnail(&mut self) {
        self.cancel_pending();
        self.title.visible = false;
        self.time.visible = false;
        self.thumbnail.clear();
        self.fade = None;
        self.is_loaded = false;
    }

    /// Remembers the flag; it is applied right away only once content is shown.
    pub fn set_title_visibility(&mut self, visible: bool) {
        self.title_visible = visible;
        if self.is_loaded {
            self.title.visible = visible;
            // Join a fade that is still running instead of popping in
            if let Some(fade) = self.fade.as_mut() {
                fade.title |= visible;
            }
        }
    }

    /// Like [`set_title_visibility`](Self::set_title_visibility). The badge
    /// stays hidden for videos without a length.
    pub fn set_time_visibility(&mut self, visible: bool) {
        self.time_visible = visible;
        if self.is_loaded {
            self.time.visible = visible && self.time.seconds > 0;
            if let Some(fade) = self.fade.as_mut() {
                fade.time |= self.time.visible;
            }
        }
    }

    /// Shows content immediately, cancelling any pending load. `None` keeps
    /// the current image.
    pub fn display_thumbnail(
        &mut self,
        title: Option<&str>,
        length_seconds: i64,
        image: Option<ThumbnailImage>,
    ) {
        self.cancel_pending();
        self.set_thumbnail_and_show(title, length_seconds, image);
    }

    pub fn display_thumbnail_image(&mut self, title: Option<&str>, length_seconds: i64, image: ColorImage) {
        self.display_thumbnail(title, length_seconds, Some(image.into()));
    }

    pub fn display_thumbnail_texture(
        &mut self,
        title: Option<&str>,
        length_seconds: i64,
        texture: TextureHandle,
    ) {
        self.display_thumbnail(title, length_seconds, Some(texture.into()));
    }

    pub fn load_thumbnail(&mut self, url: &str) {
        self.load_thumbnail_with(url, None, None);
    }

    pub fn load_thumbnail_with_listener(
        &mut self,
        url: &str,
        listener: impl ThumbnailLoadingListener + 'static,
    ) {
        self.load_thumbnail_with(url, Some(Box::new(listener)), None);
    }

    pub fn load_thumbnail_with_loader(&mut self, url: &str, image_loader: Arc<dyn ImageLoader>) {
        self.load_thumbnail_with(url, None, Some(image_loader));
    }

    /// Starts loading the thumbnail for a video URL in the background.
    ///
    /// `on_loading_started` fires before this returns; completion or failure
    /// is reported from [`poll`](Self::poll) on the UI thread.
    pub fn load_thumbnail_with(
        &mut self,
        url: &str,
        listener: Option<Box<dyn ThumbnailLoadingListener>>,
        image_loader: Option<Arc<dyn ImageLoader>>,
    ) {
        // Only one load per view: the previous listener is dropped here
        self.cancel_pending();

        self.next_request_id += 1;
        let request = LoadRequest::new(self.next_request_id, url);
        let mut listener = listener;
        if let Some(listener) = listener.as_mut() {
            listener.on_loading_started(url, self);
        }

        // An injected loader wins over the process-wide HTTP one
        let loader = match &self.loader {
            Some(loader) => Ok(Arc::clone(loader)),
            None => ThumbnailLoader::shared(),
        };
        let spawned = loader.and_then(|loader| {
            loader.spawn(
                &request,
                self.min_thumbnail_width,
                image_loader,
                self.tx.clone(),
                Arc::clone(&self.repaint),
            )
        });

        // Failing to even start (no runtime, no HTTP client) still goes to the listener
        match spawned {
            Ok(()) => self.pending = Some(PendingLoad { request, listener }),
            Err(err) => self.report_failure(url, listener, &err),
        }
    }

    /// Applies finished loads. Called by [`ui`](Self::ui) every frame; hosts
    /// that skip drawing the view can call it directly.
    pub fn poll(&mut self) {
        while let Ok(completion) = self.rx.try_recv() {
            // Anything but the current request was superseded or cleared
            let current = self.pending.as_ref().map(|p| p.request.id());
            if current != Some(completion.request_id) {
                debug!("dropping stale thumbnail request #{}", completion.request_id);
                continue;
            }
            let Some(PendingLoad { listener, .. }) = self.pending.take() else {
                continue;
            };

            // The request is settled; its listener gets exactly one final callback
            match completion.result {
                Ok(loaded) => {
                    info!("thumbnail for {} loaded: {}", completion.url, loaded.info.title);
                    self.set_thumbnail_and_show(
                        Some(&loaded.info.title),
                        loaded.info.length_seconds,
                        Some(loaded.image.into()),
                    );
                    if let Some(mut listener) = listener {
                        listener.on_loading_complete(&completion.url, self);
                    }
                }
                Err(err) => self.report_failure(&completion.url, listener, &err),
            }
        }
    }

    /// Draws the view at 16:9 of the available width.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        self.bind_context(ui.ctx());
        self.poll();

        let width = ui.available_width();
        let (rect, response) =
            ui.allocate_exact_size(vec2(width, width / ASPECT_RATIO), Sense::click());
        if !ui.is_rect_visible(rect) {
            return response;
        }

        // Elements that were hidden when the fade started draw at full opacity
        let alpha = self.fade_alpha(Instant::now());
        let (fade_title, fade_time) = self.fade.map_or((false, false), |f| (f.title, f.time));
        let element_alpha = |faded: bool| if faded { alpha } else { 1.0 };

        let painter = ui.painter_at(rect);
        self.thumbnail.paint(&painter, rect, alpha);
        if self.title.visible {
            self.title.paint(&painter, rect, element_alpha(fade_title));
        }
        if self.time.visible {
            self.time.paint(&painter, rect, element_alpha(fade_time));
        }

        // Keep frames coming until the fade settles
        if alpha < 1.0 {
            ui.ctx().request_repaint();
        }
        response
    }

    fn set_thumbnail_and_show(
        &mut self,
        title: Option<&str>,
        length_seconds: i64,
        image: Option<ThumbnailImage>,
    ) {
        self.title.text = title.unwrap_or_default().to_string();
        if self.title_visible {
            self.title.visible = true;
        }

        self.time.text = format_duration(length_seconds);
        self.time.seconds = length_seconds;
        if self.time_visible {
            self.time.visible = length_seconds > 0;
        }

        if let Some(image) = image {
            self.thumbnail.set_image(image);
        }

        self.start_fade(length_seconds > 0);
        self.is_loaded = true;
    }

    fn start_fade(&mut self, fade_time: bool) {
        if !self.is_loaded {
            self.fade = Some(Fade {
                started: Instant::now(),
                title: self.title_visible,
                time: self.time_visible && fade_time,
            });
        }
    }

    fn fade_alpha(&self, now: Instant) -> f32 {
        match self.fade {
            Some(fade) if !self.fade_duration.is_zero() => {
                let elapsed = now.saturating_duration_since(fade.started);
                decelerate(elapsed.as_secs_f32() / self.fade_duration.as_secs_f32())
            }
            _ => 1.0,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(
                "cancelling thumbnail request #{} for {}",
                pending.request.id(),
                pending.request.url()
            );
            pending.request.cancel();
        }
    }

    fn report_failure(
        &self,
        url: &str,
        listener: Option<Box<dyn ThumbnailLoadingListener>>,
        err: &LoadError,
    ) {
        match listener {
            Some(mut listener) => listener.on_loading_failed(url, self, err),
            None => warn!("thumbnail load for {} failed: {}", url, err),
        }
    }
}

impl Drop for ThumbnailView {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
