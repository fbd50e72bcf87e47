//! Frame sources.
//!
//! A `FrameSource` owns the capture device lifecycle: `start` acquires the
//! device (idempotent), `stop` releases it (idempotent, never errors), and
//! `capture_frame` returns the most recent frame or fails if the source is
//! not active.
//!
//! Physical devices are exclusive: a process-wide claim registry makes a
//! second `start` against an already-claimed device id fail with
//! `CameraError::DeviceBusy` instead of stealing the device.

use crate::error::CameraError;
use crate::models::Frame;
use image::ImageReader;
use log::{debug, info};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex};

static DEVICE_CLAIMS: LazyLock<Mutex<HashSet<String>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Exclusive hold on a capture device. Released on drop.
#[derive(Debug)]
pub struct DeviceClaim {
    device_id: String,
}

impl DeviceClaim {
    /// Claim a device id. Fails if another source currently holds it.
    pub fn acquire(device_id: &str) -> Result<Self, CameraError> {
        let mut claims = DEVICE_CLAIMS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !claims.insert(device_id.to_string()) {
            return Err(CameraError::DeviceBusy(device_id.to_string()));
        }
        debug!("claimed capture device {device_id:?}");
        Ok(Self {
            device_id: device_id.to_string(),
        })
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        let mut claims = DEVICE_CLAIMS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        claims.remove(&self.device_id);
        debug!("released capture device {:?}", self.device_id);
    }
}

/// A source of video frames bound to one capture device.
pub trait FrameSource {
    /// Acquire the device and begin delivering frames. Calling `start` on
    /// an already-started source is a no-op.
    fn start(&self) -> Result<(), CameraError>;

    /// Release the device. Safe to call when already stopped.
    fn stop(&self);

    /// Return the most recent frame. Fails if the source is not active or
    /// the device was released mid-capture.
    fn capture_frame(&self) -> impl Future<Output = Result<Frame, CameraError>> + Send;
}

impl<T> FrameSource for std::sync::Arc<T>
where
    T: FrameSource + Send + Sync,
{
    fn start(&self) -> Result<(), CameraError> {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn capture_frame(&self) -> impl Future<Output = Result<Frame, CameraError>> + Send {
        (**self).capture_frame()
    }
}

/// Configuration for a [`FileSource`].
#[derive(Clone, Debug)]
pub struct FileSourceConfig {
    /// Device id used for exclusivity claims.
    pub device_id: String,
    /// Image files replayed as frames, in order.
    pub frames: Vec<PathBuf>,
}

struct FileSourceState {
    claim: Option<DeviceClaim>,
    cursor: usize,
}

/// Replays a list of image files as frames. Stands in for the camera
/// driver layer in the demo binary and tests; the real codec layer is an
/// external collaborator.
pub struct FileSource {
    config: FileSourceConfig,
    state: Mutex<FileSourceState>,
}

impl FileSource {
    pub fn new(config: FileSourceConfig) -> Self {
        Self {
            config,
            state: Mutex::new(FileSourceState {
                claim: None,
                cursor: 0,
            }),
        }
    }
}

impl FrameSource for FileSource {
    fn start(&self) -> Result<(), CameraError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.claim.is_some() {
            return Ok(());
        }
        state.claim = Some(DeviceClaim::acquire(&self.config.device_id)?);
        state.cursor = 0;
        info!(
            "file source started on {:?} ({} frames)",
            self.config.device_id,
            self.config.frames.len()
        );
        Ok(())
    }

    fn stop(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.claim.take().is_some() {
            info!("file source stopped on {:?}", self.config.device_id);
        }
    }

    async fn capture_frame(&self) -> Result<Frame, CameraError> {
        let path = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if state.claim.is_none() {
                return Err(CameraError::NotStarted);
            }
            let Some(path) = self.config.frames.get(state.cursor) else {
                return Err(CameraError::DeviceUnavailable(
                    "frame list exhausted".to_string(),
                ));
            };
            state.cursor += 1;
            path.clone()
        };

        let image = ImageReader::open(&path)
            .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {e}", path.display())))?
            .decode()
            .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {e}", path.display())))?;
        Ok(Frame::new(image))
    }
}
