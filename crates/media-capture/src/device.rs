//! Capture device interface and the still-image file device.

use crate::error::CaptureError;
use crate::types::{Frame, StreamInfo};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A source of live video streams.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Acquire an exclusive stream. The device handle is held until the
    /// returned stream is dropped.
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// A bound live stream.
#[async_trait]
pub trait VideoStream: Send + Sync {
    fn info(&self) -> StreamInfo;

    /// Sample the current frame. Must not stop or otherwise disturb the stream.
    async fn sample(&self) -> Result<Frame, CaptureError>;
}

/// Device that treats an image file as the camera.
///
/// Every sample re-reads the file, so an external process can keep replacing
/// it with fresh frames. Only one stream may be bound at a time.
#[derive(Debug, Clone)]
pub struct StillImageDevice {
    name: String,
    path: PathBuf,
    in_use: Arc<AtomicBool>,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("still-image:{}", path.display()),
            path,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }
}

async fn read_frame(path: &Path) -> Result<Frame, CaptureError> {
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            CaptureError::DeviceUnavailable(format!("no camera source at {}", path.display()))
        }
        ErrorKind::PermissionDenied => CaptureError::DeviceUnavailable(format!(
            "permission denied for {}",
            path.display()
        )),
        _ => CaptureError::DeviceUnavailable(format!("{}: {}", path.display(), e)),
    })?;

    let decoded = image::load_from_memory(&data).map_err(|e| {
        CaptureError::DeviceUnavailable(format!("unreadable frame at {}: {}", path.display(), e))
    })?;

    Ok(Frame::from_image(&decoded))
}

#[async_trait]
impl CaptureDevice for StillImageDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is already in use",
                self.name
            )));
        }

        // The flag is cleared by the stream's Drop, or here on failure.
        let first = match read_frame(&self.path).await {
            Ok(frame) => frame,
            Err(e) => {
                self.in_use.store(false, Ordering::Release);
                return Err(e);
            }
        };

        info!(device = %self.name, width = first.width, height = first.height, "Device acquired");

        Ok(Box::new(StillImageStream {
            path: self.path.clone(),
            info: StreamInfo {
                width: first.width,
                height: first.height,
            },
            in_use: self.in_use.clone(),
        }))
    }
}

struct StillImageStream {
    path: PathBuf,
    info: StreamInfo,
    in_use: Arc<AtomicBool>,
}

#[async_trait]
impl VideoStream for StillImageStream {
    fn info(&self) -> StreamInfo {
        self.info
    }

    async fn sample(&self) -> Result<Frame, CaptureError> {
        let frame = read_frame(&self.path).await?;
        if frame.width != self.info.width || frame.height != self.info.height {
            return Err(CaptureError::InvalidFrame(format!(
                "source changed size from {}x{} to {}x{}",
                self.info.width, self.info.height, frame.width, frame.height
            )));
        }
        Ok(frame)
    }
}

impl Drop for StillImageStream {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
        debug!(path = %self.path.display(), "Device released");
    }
}
