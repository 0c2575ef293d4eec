//! Snapshot object-detection client.
//!
//! Grabs a frame from a webcam or reads an image file, uploads it to the
//! detection endpoint and presents the annotated image that comes back.
use std::path::PathBuf;

pub mod capture;
pub mod client;
pub mod command;
pub mod controller;
pub mod intake;
pub mod presenter;
pub mod sensors;

/// Error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{device}: {source}")]
    CameraOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{device}: {source}")]
    CameraStart {
        device: String,
        #[source]
        source: rscam::Error,
    },
    #[error("{device}: no {what} found for format {format}")]
    CameraMode {
        device: String,
        format: String,
        what: &'static str,
    },
    #[error("unsupported pixel format {0}, only MJPG frames can be captured")]
    UnsupportedFormat(String),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to read {path:?}: {source}")]
    Intake {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Detection(#[from] reqwest::Error),
    #[error("failed to write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
