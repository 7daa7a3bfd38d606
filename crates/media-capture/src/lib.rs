//! Camera acquisition and still-frame capture.
//!
//! A [`MediaCapture`] owns at most one live [`VideoStream`] acquired from a
//! [`CaptureDevice`]. Stills are sampled from the bound stream and encoded as
//! PNG [`CapturedImage`] values; the stream is released on [`MediaCapture::release`]
//! or when the component is dropped.

mod capture;
mod device;
mod error;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use capture::MediaCapture;
pub use device::{CaptureDevice, StillImageDevice, VideoStream};
pub use error::CaptureError;
pub use types::{CapturedImage, Frame, StreamInfo, PNG_CONTENT_TYPE};
