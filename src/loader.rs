//! Background resolution of thumbnails for [`ThumbnailView`](crate::ThumbnailView).

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use eframe::egui;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use tokio::{
    runtime::{Builder, Runtime},
    sync::mpsc::UnboundedSender,
};

use crate::{
    error::LoadError,
    model::LoadedThumbnail,
    thumbnail::{HttpFetcher, ImageLoader, ThumbnailQuality, VideoInfoProvider},
    video_id::extract_video_id,
};

// Shared worker runtime, started on the first load
static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static SHARED_LOADER: OnceCell<Arc<ThumbnailLoader>> = OnceCell::new();

fn runtime() -> Result<&'static Runtime, LoadError> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .thread_name("thumbnail-loader")
            .enable_all()
            .build()
            .map_err(LoadError::Runtime)
    })
}

/// Handle for one in-flight load. Cancelling it makes the worker stop at the
/// next step and drop whatever it produced. Clones share the cancel flag.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    id: u64,
    url: String,
    cancelled: Arc<AtomicBool>,
}

impl LoadRequest {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Context slot shared between a view and its workers. The view fills it
/// once it knows its `egui::Context`, possibly after a load was started.
pub type RepaintSlot = Arc<OnceCell<egui::Context>>;

/// Result of a load, sent back to the owning widget
#[derive(Debug)]
pub struct Completion {
    pub request_id: u64,
    pub url: String,
    pub result: Result<LoadedThumbnail, LoadError>,
}

/// Resolves metadata and thumbnail image for a video URL off the UI thread.
pub struct ThumbnailLoader {
    info: Arc<dyn VideoInfoProvider>,
    images: Arc<dyn ImageLoader>,
}

impl ThumbnailLoader {
    pub fn new(info: Arc<dyn VideoInfoProvider>, images: Arc<dyn ImageLoader>) -> Self {
        Self { info, images }
    }

    /// Process-wide loader backed by [`HttpFetcher`]
    pub fn shared() -> Result<Arc<ThumbnailLoader>, LoadError> {
        SHARED_LOADER
            .get_or_try_init(|| {
                let http = Arc::new(HttpFetcher::new()?);
                Ok(Arc::new(ThumbnailLoader::new(http.clone(), http)))
            })
            .cloned()
    }

    /// Starts resolving `request` on a blocking worker.
    ///
    /// The completion is sent over `tx` unless the request was cancelled in
    /// the meantime. `image_loader` replaces the loader's own image fetcher
    /// for this request only.
    pub fn spawn(
        &self,
        request: &LoadRequest,
        min_width: u32,
        image_loader: Option<Arc<dyn ImageLoader>>,
        tx: UnboundedSender<Completion>,
        repaint: RepaintSlot,
    ) -> Result<(), LoadError> {
        let runtime = runtime()?;
        let info = Arc::clone(&self.info);
        let images = image_loader.unwrap_or_else(|| Arc::clone(&self.images));
        let cancelled = Arc::clone(&request.cancelled);
        let request_id = request.id;
        let url = request.url.clone();

        debug!("thumbnail request #{} started for {}", request_id, url);
        runtime.spawn_blocking(move || {
            // A panicking collaborator still has to produce a failure for the listener
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                resolve(&url, min_width, &cancelled, info.as_ref(), images.as_ref())
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                warn!("thumbnail request #{} panicked: {}", request_id, message);
                Err(LoadError::Panicked(message))
            });
            let Some(result) = outcome.transpose() else {
                debug!("thumbnail request #{} cancelled", request_id);
                return;
            };
            if cancelled.load(Ordering::Acquire) {
                debug!("thumbnail request #{} finished after cancel, dropped", request_id);
                return;
            }
            // Send first so the repaint it triggers finds the completion queued
            if tx.send(Completion { request_id, url, result }).is_ok() {
                if let Some(ctx) = repaint.get() {
                    ctx.request_repaint();
                }
            }
        });
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs the whole pipeline synchronously. `Ok(None)` means the request was
/// cancelled before it produced anything.
fn resolve(
    url: &str,
    min_width: u32,
    cancelled: &AtomicBool,
    info: &dyn VideoInfoProvider,
    images: &dyn ImageLoader,
) -> Result<Option<LoadedThumbnail>, LoadError> {
    let is_cancelled = || cancelled.load(Ordering::Acquire);
    if is_cancelled() {
        return Ok(None);
    }

    // Metadata first; a bad URL or missing title fails before any image traffic
    let video_id = extract_video_id(url)?;
    let info = info.video_info(&video_id)?;

    // Walk from the preferred size down to the smallest, keeping the last error
    let mut last_err = None;
    for quality in ThumbnailQuality::candidates_for(min_width) {
        // Stop between network round trips once superseded
        if is_cancelled() {
            return Ok(None);
        }
        let image_url = quality.url(&video_id);
        match images.load(&image_url) {
            Ok(image) => {
                info!(
                    "loaded {:?} thumbnail for {} ({}x{})",
                    quality, video_id, image.size[0], image.size[1]
                );
                return Ok(Some(LoadedThumbnail { info, image }));
            }
            Err(err) => {
                debug!("thumbnail {} unavailable: {}", image_url, err);
                last_err = Some(err);
            }
        }
    }

    // No error recorded means the loop never ran
    match last_err {
        Some(err) => Err(LoadError::NoThumbnail(Box::new(err))),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use eframe::egui::{Color32, ColorImage};

    use super::*;
    use crate::model::VideoInfo;

    pub(crate) struct FakeInfo;

    impl VideoInfoProvider for FakeInfo {
        fn video_info(&self, video_id: &str) -> Result<VideoInfo, LoadError> {
            Ok(VideoInfo {
                title: format!("title of {}", video_id),
                length_seconds: 12345,
            })
        }
    }

    /// Serves images only for URLs containing one of `available`, recording
    /// every URL it was asked for.
    pub(crate) struct FakeImages {
        pub available: Vec<&'static str>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeImages {
        pub fn serving(available: &[&'static str]) -> Self {
            Self {
                available: available.to_vec(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageLoader for FakeImages {
        fn load(&self, image_url: &str) -> Result<ColorImage, LoadError> {
            self.requested.lock().unwrap().push(image_url.to_string());
            if self.available.iter().any(|a| image_url.contains(a)) {
                Ok(ColorImage::new([4, 3], Color32::RED))
            } else {
                Err(LoadError::MissingMetadata(image_url.to_string()))
            }
        }
    }

    const URL: &str = "https://www.youtube.com/watch?v=iCkYw3cRwLo";

    #[test]
    fn falls_back_to_smaller_variants() {
        let images = FakeImages::serving(&["/default.jpg"]);
        let loaded = resolve(URL, 480, &AtomicBool::new(false), &FakeInfo, &images)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.info.title, "title of iCkYw3cRwLo");
        assert_eq!(loaded.image.size, [4, 3]);
        let requested = images.requested.lock().unwrap();
        assert_eq!(
            *requested,
            vec![
                "https://img.youtube.com/vi/iCkYw3cRwLo/hqdefault.jpg",
                "https://img.youtube.com/vi/iCkYw3cRwLo/mqdefault.jpg",
                "https://img.youtube.com/vi/iCkYw3cRwLo/default.jpg",
            ]
        );
    }

    #[test]
    fn every_variant_failing_is_no_thumbnail() {
        let images = FakeImages::serving(&[]);
        let err = resolve(URL, 320, &AtomicBool::new(false), &FakeInfo, &images).unwrap_err();
        assert!(matches!(err, LoadError::NoThumbnail(_)));
        assert_eq!(images.requested.lock().unwrap().len(), 2);
    }

    #[test]
    fn malformed_url_fails_before_fetching() {
        let images = FakeImages::serving(&["default"]);
        let err = resolve("https://example.com/", 320, &AtomicBool::new(false), &FakeInfo, &images)
            .unwrap_err();
        assert!(matches!(err, LoadError::MalformedUrl(_)));
        assert!(images.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn cancelled_request_produces_nothing() {
        let images = FakeImages::serving(&["default"]);
        let outcome = resolve(URL, 320, &AtomicBool::new(true), &FakeInfo, &images).unwrap();
        assert!(outcome.is_none());
        assert!(images.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"static str"), "static str");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u32), "unknown panic");
    }

    #[test]
    fn cancel_flag_is_shared_with_request() {
        let request = LoadRequest::new(7, URL);
        assert!(!request.is_cancelled());
        let flag = Arc::clone(&request.cancelled);
        request.cancel();
        assert!(flag.load(Ordering::Acquire));
        assert_eq!(request.id(), 7);
        assert_eq!(request.url(), URL);
    }
}
