//! Capture errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Permission denied, or no camera present.
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// `capture_photo` was called with no bound stream.
    #[error("Camera not started")]
    NotReady,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Image encoding error: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}
