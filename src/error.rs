use std::{io, path::PathBuf};

use thiserror::Error;

/// Why a thumbnail load did not produce content.
///
/// Load errors never escape the widget's public methods; they are handed to
/// the listener's `on_loading_failed` callback.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no video id found in url `{0}`")]
    MalformedUrl(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode thumbnail image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("watch page for `{0}` has no title")]
    MissingMetadata(String),

    /// Every thumbnail variant failed; holds the error of the last one tried.
    #[error("no thumbnail variant could be loaded: {0}")]
    NoThumbnail(Box<LoadError>),

    /// A loader or metadata provider panicked on the worker thread.
    #[error("thumbnail loader panicked: {0}")]
    Panicked(String),

    #[error("background runtime unavailable: {0}")]
    Runtime(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("could not read style file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid style file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
