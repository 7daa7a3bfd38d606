//! Live stream ownership and still capture.

use crate::device::{CaptureDevice, VideoStream};
use crate::error::CaptureError;
use crate::types::{CapturedImage, StreamInfo};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Owns at most one live stream from a capture device.
///
/// The stream is held from a successful [`start_camera`](Self::start_camera)
/// until [`release`](Self::release) or drop.
pub struct MediaCapture {
    device: Arc<dyn CaptureDevice>,
    stream: Mutex<Option<Box<dyn VideoStream>>>,
}

impl MediaCapture {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            stream: Mutex::new(None),
        }
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Bind a live stream. A no-op returning the current stream info when one
    /// is already bound; concurrent callers are serialized so the device is
    /// acquired at most once.
    #[instrument(skip(self), fields(device = %self.device.name()))]
    pub async fn start_camera(&self) -> Result<StreamInfo, CaptureError> {
        let mut stream = self.stream.lock().await;

        if let Some(existing) = stream.as_ref() {
            debug!("Camera already started");
            return Ok(existing.info());
        }

        let acquired = self.device.acquire().await.map_err(|e| {
            warn!(error = %e, "Unable to access the camera");
            e
        })?;
        let info = acquired.info();
        *stream = Some(acquired);

        info!(width = info.width, height = info.height, "Camera started");
        Ok(info)
    }

    /// Sample the current frame into a PNG still with the stream's dimensions.
    ///
    /// Returns [`CaptureError::NotReady`] without capturing when no stream is bound.
    #[instrument(skip(self), fields(device = %self.device.name()))]
    pub async fn capture_photo(&self) -> Result<CapturedImage, CaptureError> {
        let stream = self.stream.lock().await;
        let stream = stream.as_ref().ok_or(CaptureError::NotReady)?;

        let info = stream.info();
        let frame = stream.sample().await?;
        if frame.width != info.width || frame.height != info.height {
            return Err(CaptureError::InvalidFrame(format!(
                "frame is {}x{}, stream is {}x{}",
                frame.width, frame.height, info.width, info.height
            )));
        }

        let image = CapturedImage::encode(&frame)?;
        debug!(
            width = image.width(),
            height = image.height(),
            bytes = image.bytes().len(),
            "Photo captured"
        );
        Ok(image)
    }

    /// Drop the bound stream, releasing the device. Returns whether one was bound.
    pub async fn release(&self) -> bool {
        let released = self.stream.lock().await.take().is_some();
        if released {
            info!(device = %self.device.name(), "Camera released");
        }
        released
    }

    pub async fn is_started(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}
