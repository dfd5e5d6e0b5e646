//! Sample application for the thumbnail widget

use std::{fs, path::PathBuf, sync::Arc};

use clap::Parser;
// eframe/egui for GUI application framework
use eframe::{egui, App, CreationContext, Frame};
use egui::{ColorImage, TextureHandle, TextureOptions, Visuals};
use log::{error, info, warn};
// FileDialog for picking a local image to display
use rfd::FileDialog;
use rust_embed::RustEmbed;
use youtube_thumbnail_view::{
    decode_image, HttpFetcher, ImageLoader, LoadError, ThumbnailLoadingListener, ThumbnailStyle,
    ThumbnailView,
};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

const DEFAULT_URL: &str = "https://www.youtube.com/watch?v=iCkYw3cRwLo";
const DISPLAY_TITLE: &str = "YouTube video test title";
const DISPLAY_LENGTH: i64 = 12345;

#[derive(Parser, Debug)]
#[command(name = "thumbnail-sample")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the default thumbnail style
    #[arg(short, long, value_name = "FILE")]
    style: Option<PathBuf>,

    /// Video URL prefilled in the URL field
    #[arg(short, long, default_value = DEFAULT_URL)]
    url: String,

    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    debug: u8,
}

/// Program entry point: sets up logging and launches the GUI
fn main() -> Result<(), eframe::Error> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG overrides the -d setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let style = match &cli.style {
        Some(path) => ThumbnailStyle::from_json_file(path).unwrap_or_else(|err| {
            warn!("{}; falling back to the default style", err);
            ThumbnailStyle::default()
        }),
        None => ThumbnailStyle::default(),
    };
    let url = cli.url;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "YouTube Thumbnail View",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(SampleApp::new(cc, style, url))
        }),
    )
}

/// Logs every loading event
struct LogListener;

impl ThumbnailLoadingListener for LogListener {
    fn on_loading_started(&mut self, url: &str, _view: &ThumbnailView) {
        info!("Thumbnail load started: {}", url);
    }

    fn on_loading_complete(&mut self, url: &str, view: &ThumbnailView) {
        info!("Thumbnail load finished: {} ({})", url, view.title_view().text());
    }

    fn on_loading_failed(&mut self, url: &str, _view: &ThumbnailView, error: &LoadError) {
        error!("Thumbnail load failed for {}: {}", url, error);
    }
}

/// Image loader override used by the "Custom loader" button
struct TracingImageLoader {
    inner: HttpFetcher,
}

impl ImageLoader for TracingImageLoader {
    fn load(&self, image_url: &str) -> Result<ColorImage, LoadError> {
        info!("custom loader fetching {}", image_url);
        let image = self.inner.load(image_url)?;
        info!("custom loader got {}x{}", image.size[0], image.size[1]);
        Ok(image)
    }
}

/// Application state for the GUI
struct SampleApp {
    thumb: ThumbnailView,
    url_input: String,
    show_title: bool,
    show_time: bool,
    /// Embedded icon shown by the "Display" button
    icon: Option<TextureHandle>,
    custom_loader: Option<Arc<dyn ImageLoader>>,
}

impl SampleApp {
    fn new(cc: &CreationContext<'_>, style: ThumbnailStyle, url: String) -> Self {
        let icon = Asset::get("icon.png")
            .and_then(|file| match decode_image(&file.data) {
                Ok(img) => Some(img),
                Err(err) => {
                    warn!("embedded icon unusable: {}", err);
                    None
                }
            })
            .map(|img| cc.egui_ctx.load_texture("sample-icon", img, TextureOptions::LINEAR));

        let custom_loader = match HttpFetcher::new() {
            Ok(inner) => Some(Arc::new(TracingImageLoader { inner }) as Arc<dyn ImageLoader>),
            Err(err) => {
                warn!("custom loader unavailable: {}", err);
                None
            }
        };

        let (show_title, show_time) = (style.title_visible, style.time_visible);

        // Bind the context up front so the startup load can wake the UI
        let mut thumb = ThumbnailView::with_style(style);
        thumb.bind_context(&cc.egui_ctx);
        if !url.trim().is_empty() {
            thumb.load_thumbnail_with_listener(url.trim(), LogListener);
        }

        Self {
            show_title,
            show_time,
            thumb,
            url_input: url,
            icon,
            custom_loader,
        }
    }

    fn open_local_image(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp"])
            .pick_file()
        else {
            return;
        };
        let decoded = fs::read(&path)
            .map_err(|err| err.to_string())
            .and_then(|bytes| decode_image(&bytes).map_err(|err| err.to_string()));
        match decoded {
            Ok(img) => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                self.thumb.display_thumbnail_image(name.as_deref(), 0, img);
            }
            Err(err) => error!("could not open {}: {}", path.display(), err),
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for SampleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Video URL:");
                ui.text_edit_singleline(&mut self.url_input);
            });

            ui.horizontal(|ui| {
                let url = self.url_input.trim().to_string();
                if ui.button("Fetch").clicked() {
                    self.thumb.load_thumbnail_with_listener(&url, LogListener);
                }
                if ui.button("Custom loader").clicked() {
                    self.thumb.load_thumbnail_with(
                        &url,
                        Some(Box::new(LogListener)),
                        self.custom_loader.clone(),
                    );
                }
                if ui.button("Display").clicked() {
                    let icon = self.icon.clone().map(Into::into);
                    self.thumb.display_thumbnail(Some(DISPLAY_TITLE), DISPLAY_LENGTH, icon);
                }
                if ui.button("Open image…").clicked() {
                    self.open_local_image();
                }
                if ui.button("Clear").clicked() {
                    self.thumb.clear_thumbnail();
                }
            });

            ui.horizontal(|ui| {
                if ui.checkbox(&mut self.show_title, "Show title").changed() {
                    self.thumb.set_title_visibility(self.show_title);
                }
                if ui.checkbox(&mut self.show_time, "Show time").changed() {
                    self.thumb.set_time_visibility(self.show_time);
                }
                if self.thumb.is_loading() {
                    ui.spinner();
                }
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.thumb.ui(ui).clicked() {
                info!("thumbnail clicked: {}", self.thumb.title_view().text());
            }
        });
    }
}
