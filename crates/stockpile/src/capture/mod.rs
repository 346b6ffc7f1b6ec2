//! Media capture: exclusive camera access and snapshot staging.
//!
//! The adapter is a singleton over one [`VideoDevice`]. [`CaptureAdapter::start`] hands out a
//! [`CaptureSession`] that owns the open stream; dropping the session stops the stream and puts
//! the adapter back to `Idle`, whichever way the caller leaves.
//!
//! ```text
//! Idle ──start──▶ Requesting ──grant──▶ Streaming ──capture_frame──▶ Captured
//!   ▲                 │ deny                 │ stop/drop                 │ stop/drop
//!   └─────────────────┴──────────────────────┴───────────────────────────┘
//! ```

pub mod device;

pub use device::{FrameSource, PatternDevice, StillImageDevice, VideoDevice};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Requesting,
    Streaming,
    Captured,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Captured => "captured",
        })
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("camera is already in use")]
    Busy,

    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: CaptureState,
    },

    #[error("snapshot size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },

    #[error("frame error: {0}")]
    Frame(String),
}

/// A staged snapshot, held in memory until the dialog is submitted or discarded.
#[derive(Clone, PartialEq)]
pub struct CapturedFrame {
    pub image: RgbaImage,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

type SharedState = Arc<Mutex<CaptureState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, CaptureState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Claim on the adapter from `start` until the session ends. Resets to `Idle` on drop,
/// which also covers a `start` future dropped while the device was still being requested.
struct DeviceLease {
    state: SharedState,
}

impl DeviceLease {
    fn acquire(state: &SharedState) -> Result<Self, CaptureError> {
        let mut current = lock(state);
        if *current != CaptureState::Idle {
            return Err(CaptureError::Busy);
        }
        *current = CaptureState::Requesting;
        Ok(Self {
            state: Arc::clone(state),
        })
    }

    fn get(&self) -> CaptureState {
        *lock(&self.state)
    }

    fn set(&self, next: CaptureState) {
        *lock(&self.state) = next;
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.set(CaptureState::Idle);
    }
}

/// Singleton access to one capture device.
#[derive(Clone)]
pub struct CaptureAdapter {
    device: Arc<dyn VideoDevice>,
    state: SharedState,
}

impl CaptureAdapter {
    pub fn new(device: Arc<dyn VideoDevice>) -> Self {
        Self {
            device,
            state: Arc::new(Mutex::new(CaptureState::Idle)),
        }
    }

    pub fn state(&self) -> CaptureState {
        *lock(&self.state)
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Request the device and start streaming.
    ///
    /// Fails with `Busy` while another session is alive and with `Unavailable` when the device
    /// refuses. Either way the adapter is left as it was found.
    pub async fn start(&self) -> Result<CaptureSession, CaptureError> {
        let lease = DeviceLease::acquire(&self.state)?;
        debug!(device = %self.device.name(), "requesting capture device");

        let source = match self.device.open().await {
            Ok(source) => source,
            Err(e) => {
                warn!(device = %self.device.name(), error = %e, "capture device refused");
                return Err(e);
            }
        };

        lease.set(CaptureState::Streaming);
        info!(device = %self.device.name(), "capture streaming");
        Ok(CaptureSession {
            source: Some(source),
            lease: Some(lease),
        })
    }
}

impl fmt::Debug for CaptureAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureAdapter")
            .field("device", &self.device.name())
            .field("state", &self.state())
            .finish()
    }
}

/// An active stream. Stops on drop.
pub struct CaptureSession {
    source: Option<Box<dyn FrameSource>>,
    lease: Option<DeviceLease>,
}

impl CaptureSession {
    pub fn state(&self) -> CaptureState {
        self.lease
            .as_ref()
            .map_or(CaptureState::Idle, DeviceLease::get)
    }

    pub fn is_active(&self) -> bool {
        self.lease.is_some()
    }

    /// Sample the current frame into a `width` x `height` raster.
    pub fn capture_frame(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<CapturedFrame, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidSize { width, height });
        }
        let state = self.state();
        let (Some(source), Some(lease), CaptureState::Streaming) =
            (self.source.as_mut(), self.lease.as_ref(), state)
        else {
            return Err(CaptureError::InvalidState {
                op: "capture a frame",
                state,
            });
        };

        let raw = source.frame()?;
        let image = if raw.dimensions() == (width, height) {
            raw
        } else {
            imageops::resize(&raw, width, height, FilterType::Triangle)
        };

        lease.set(CaptureState::Captured);
        debug!(width, height, "captured frame");
        Ok(CapturedFrame::new(image))
    }

    /// Release the device. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        if self.lease.take().is_some() {
            debug!("capture stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state())
            .finish()
    }
}
