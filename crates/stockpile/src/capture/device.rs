//! Video devices the capture adapter can stream from.

use std::path::PathBuf;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use tracing::debug;

use super::CaptureError;

/// A camera-like device that grants exclusive access on `open`.
#[async_trait]
pub trait VideoDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Request access. Denial or a missing device is `CaptureError::Unavailable`.
    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;
}

/// An open stream. Dropping it without `close` is allowed but leaves cleanup to the device.
pub trait FrameSource: Send {
    /// The frame currently on screen, at the device's native size.
    fn frame(&mut self) -> Result<RgbaImage, CaptureError>;

    fn close(&mut self);
}

/// Streams a still image file, as a webcam pointed at a print would.
#[derive(Debug, Clone)]
pub struct StillImageDevice {
    name: String,
    path: PathBuf,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("still:{}", path.display()),
            path,
        }
    }
}

#[async_trait]
impl VideoDevice for StillImageDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureError::Unavailable(format!("{}: {e}", self.path.display())))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {e}", self.path.display())))?
            .into_rgba8();
        debug!(
            device = %self.name,
            width = image.width(),
            height = image.height(),
            "opened still image device"
        );
        Ok(Box::new(StillSource { image: Some(image) }))
    }
}

struct StillSource {
    image: Option<RgbaImage>,
}

impl FrameSource for StillSource {
    fn frame(&mut self) -> Result<RgbaImage, CaptureError> {
        self.image
            .clone()
            .ok_or_else(|| CaptureError::Frame("stream closed".to_string()))
    }

    fn close(&mut self) {
        self.image = None;
    }
}

/// Deterministic test pattern: a diagonal gradient that shifts by one step per frame.
#[derive(Debug, Clone)]
pub struct PatternDevice {
    width: u32,
    height: u32,
}

impl PatternDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for PatternDevice {
    fn default() -> Self {
        Self::new(320, 240)
    }
}

#[async_trait]
impl VideoDevice for PatternDevice {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::Unavailable(
                "pattern device has no pixels".to_string(),
            ));
        }
        Ok(Box::new(PatternSource {
            width: self.width,
            height: self.height,
            tick: 0,
            open: true,
        }))
    }
}

struct PatternSource {
    width: u32,
    height: u32,
    tick: u32,
    open: bool,
}

impl FrameSource for PatternSource {
    fn frame(&mut self) -> Result<RgbaImage, CaptureError> {
        if !self.open {
            return Err(CaptureError::Frame("stream closed".to_string()));
        }
        let (w, h, tick) = (self.width, self.height, self.tick);
        self.tick = self.tick.wrapping_add(1);
        Ok(RgbaImage::from_fn(w, h, |x, y| {
            let r = (x * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            let b = (x + y).wrapping_add(tick) as u8;
            Rgba([r, g, b, 255])
        }))
    }

    fn close(&mut self) {
        self.open = false;
    }
}
