//! Error types for the lane-scan pipeline.
//!
//! `CameraError` is fatal to a session. `RecognitionError` is recovered
//! locally as "no detection this cycle". A validation miss is not an error
//! at all (the validator returns `Option`). `BusinessActionError` returns
//! the session to `Locked` so the user can retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("camera device {0:?} is already claimed by another session")]
    DeviceBusy(String),

    #[error("capture requested while the source is stopped")]
    NotStarted,

    #[error("device released while a capture was in flight")]
    ReleasedMidCapture,
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("recognition call timed out")]
    Timeout,

    #[error("malformed input image: {0}")]
    MalformedImage(String),

    #[error("engine rejected the request: {0}")]
    Rejected(String),
}

/// The rent/settle call failed server-side. Carries the human-readable
/// reason the backend returned.
#[derive(Debug, Error)]
#[error("business action failed: {reason}")]
pub struct BusinessActionError {
    pub reason: String,
}

impl BusinessActionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    BusinessAction(#[from] BusinessActionError),

    #[error("rent session requires a parking lot id before start")]
    MissingLot,

    #[error("operation not valid in state {state}: {operation}")]
    InvalidTransition {
        state: &'static str,
        operation: &'static str,
    },
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
