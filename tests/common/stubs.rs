//! Scripted stand-ins for the session's three injected capabilities.

use lanescan::camera::FrameSource;
use lanescan::error::{BusinessActionError, CameraError, RecognitionError};
use lanescan::lane::{LaneBackend, RentReceipt, RentRequest, SettleReceipt, SettleRequest};
use lanescan::models::{Frame, PreparedImage, RecognitionResult};
use lanescan::recognition::{Charset, RecognitionClient, RecognitionMode};
use lanescan::PipelineConfig;
use image::DynamicImage;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Test config: default heuristics, but no real inter-cycle pause.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        cycle_interval_ms: 1,
        ..PipelineConfig::default()
    }
}

/// Camera producing blank frames and counting every call.
pub struct ScriptedCamera {
    max_frames: Option<usize>,
    deny_permission: bool,
    started: AtomicBool,
    captures: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self {
            max_frames: None,
            deny_permission: false,
            started: AtomicBool::new(false),
            captures: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Fail after this many captures, like a device going away.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Simulate the host denying the camera capability.
    pub fn with_permission_denied(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedCamera {
    fn start(&self) -> Result<(), CameraError> {
        if self.deny_permission {
            return Err(CameraError::PermissionDenied);
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn capture_frame(&self) -> Result<Frame, CameraError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(CameraError::NotStarted);
        }
        let seen = self.captures.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_frames {
            if seen >= max {
                return Err(CameraError::DeviceUnavailable("scripted end".to_string()));
            }
        }
        Ok(Frame::new(DynamicImage::new_luma8(64, 64)))
    }
}

/// One scripted recognition cycle.
pub enum ScriptedRead {
    /// Engine returns this text at this confidence.
    Text(&'static str, f32),
    /// Engine fails this cycle (unreachable/timeout).
    EngineError,
}

/// Recognition client that replays a script, optionally delaying each
/// call to simulate a slow engine.
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<ScriptedRead>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<ScriptedRead>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecognitionClient for ScriptedRecognizer {
    async fn recognize(
        &self,
        _image: &PreparedImage,
        _charset: &Charset,
        _mode: RecognitionMode,
    ) -> Result<RecognitionResult, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(ScriptedRead::Text(text, confidence)) => Ok(RecognitionResult {
                raw_text: text.to_string(),
                confidence,
            }),
            Some(ScriptedRead::EngineError) => Err(RecognitionError::EngineUnavailable(
                "scripted outage".to_string(),
            )),
            // Script exhausted: engine sees nothing.
            None => Ok(RecognitionResult {
                raw_text: String::new(),
                confidence: 0.0,
            }),
        }
    }
}

/// Lane backend that records every submission and can fail on demand.
pub struct RecordingBackend {
    pub rents: Mutex<Vec<RentRequest>>,
    pub settles: Mutex<Vec<SettleRequest>>,
    fail_next: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            rents: Mutex::new(Vec::new()),
            settles: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn rent_attempts(&self) -> usize {
        self.rents.lock().unwrap().len()
    }

    pub fn settle_attempts(&self) -> usize {
        self.settles.lock().unwrap().len()
    }
}

impl LaneBackend for RecordingBackend {
    async fn rent(&self, request: &RentRequest) -> Result<RentReceipt, BusinessActionError> {
        self.rents.lock().unwrap().push(request.clone());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BusinessActionError::new("lot is full"));
        }
        Ok(RentReceipt {
            reference: format!("rent-{}", self.rent_attempts()),
        })
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleReceipt, BusinessActionError> {
        self.settles.lock().unwrap().push(request.clone());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BusinessActionError::new("no open rental for plate"));
        }
        Ok(SettleReceipt { total_cost: 120.0 })
    }
}
