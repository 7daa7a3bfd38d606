//! In-memory capture device for tests.

use crate::device::{CaptureDevice, VideoStream};
use crate::error::CaptureError;
use crate::types::{Frame, StreamInfo};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    samples: AtomicUsize,
}

/// Capture device that serves a fixed frame and counts handle usage.
#[derive(Debug, Clone)]
pub struct MockDevice {
    frame: Frame,
    deny: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl MockDevice {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            deny: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// A device whose user has denied camera permission.
    pub fn denied() -> Self {
        let device = Self::new(Frame::solid(1, 1, [0, 0, 0, 255]));
        device.set_denied(true);
        device
    }

    pub fn set_denied(&self, denied: bool) {
        self.deny.store(denied, Ordering::SeqCst);
    }

    /// Number of successful acquisitions.
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    /// Number of streams dropped.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn samples(&self) -> usize {
        self.counters.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for MockDevice {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(
                "permission denied".to_string(),
            ));
        }

        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            frame: self.frame.clone(),
            counters: self.counters.clone(),
        }))
    }
}

struct MockStream {
    frame: Frame,
    counters: Arc<Counters>,
}

#[async_trait]
impl VideoStream for MockStream {
    fn info(&self) -> StreamInfo {
        StreamInfo {
            width: self.frame.width,
            height: self.frame.height,
        }
    }

    async fn sample(&self) -> Result<Frame, CaptureError> {
        self.counters.samples.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
