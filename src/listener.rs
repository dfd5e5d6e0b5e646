use crate::{error::LoadError, widget::ThumbnailView};

/// Observer of a single `load_thumbnail` call.
///
/// All callbacks run on the UI thread. A listener whose load was superseded,
/// cleared or dropped is dropped without receiving further callbacks.
pub trait ThumbnailLoadingListener {
    fn on_loading_started(&mut self, _url: &str, _view: &ThumbnailView) {}

    fn on_loading_complete(&mut self, _url: &str, _view: &ThumbnailView) {}

    fn on_loading_failed(&mut self, _url: &str, _view: &ThumbnailView, _error: &LoadError) {}
}
