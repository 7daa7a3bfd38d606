//! Frames and captured stills.

use crate::error::CaptureError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat, RgbaImage};
use std::fmt;
use std::io::Cursor;

/// MIME type of every [`CapturedImage`].
pub const PNG_CONTENT_TYPE: &str = "image/png";

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Raw RGBA8 frame sampled from a live stream.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame, checking the buffer holds exactly `width * height` RGBA pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidFrame(format!(
                "empty frame: {}x{}",
                width, height
            )));
        }
        if pixels.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert a decoded image into an RGBA frame.
    pub fn from_image(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.to_rgba8().into_raw(),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Dimensions of a bound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
}

/// A PNG-encoded still frame.
///
/// Never mutated after creation. Cloning shares nothing with the live stream.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Encode a frame as PNG, keeping its pixel dimensions.
    pub fn encode(frame: &Frame) -> Result<Self, CaptureError> {
        let buffer = RgbaImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .ok_or_else(|| {
                CaptureError::InvalidFrame(format!(
                    "buffer does not match {}x{}",
                    frame.width, frame.height
                ))
            })?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;

        Ok(Self {
            width: frame.width,
            height: frame.height,
            bytes,
            captured_at: Utc::now(),
        })
    }

    /// Parse a `data:image/png;base64,...` URL as produced by [`CapturedImage::to_data_url`].
    pub fn from_data_url(data_url: &str) -> Result<Self, CaptureError> {
        let encoded = data_url.strip_prefix(DATA_URL_PREFIX).ok_or_else(|| {
            CaptureError::InvalidDataUrl("expected a base64 PNG data URL".to_string())
        })?;

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CaptureError::InvalidDataUrl(e.to_string()))?;

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .map_err(|e| CaptureError::InvalidDataUrl(format!("not a PNG image: {}", e)))?;
        let (width, height) = decoded.dimensions();

        Ok(Self {
            width,
            height,
            bytes,
            captured_at: Utc::now(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded PNG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn content_type(&self) -> &'static str {
        PNG_CONTENT_TYPE
    }

    /// Render as a `data:` URL for previewing in a browser.
    pub fn to_data_url(&self) -> String {
        format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
