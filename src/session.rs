//! Lane session orchestration.
//!
//! One `SessionController` drives one lane-use session (entry or exit):
//! it runs the capture → extract → preprocess → recognize → validate →
//! vote cycle on a cooperative cadence, exposes the locked plate for
//! confirmation, and delegates the business action to the injected
//! backend.
//!
//! Concurrency contract: cycles are serialized by an in-flight guard (an
//! overlap attempt skips the cycle, nothing is queued), the cadence is
//! measured end-of-cycle → start-of-next so a slow recognition call
//! throttles the loop, and cancellation is cooperative — the active flag
//! is re-checked before any cycle outcome is applied, so results arriving
//! after `cancel()` are discarded. Two sessions share nothing but the
//! device claim registry.

use crate::camera::FrameSource;
use crate::config::PipelineConfig;
use crate::detection::{ImagePreprocessor, RegionExtractor};
use crate::error::{CameraError, SessionError};
use crate::lane::{LaneBackend, Receipt, RentRequest, SettleRequest};
use crate::models::{LaneKind, SessionStatus};
use crate::recognition::{Charset, RecognitionClient, RecognitionMode};
use crate::validator::FormatValidator;
use crate::voter::{StabilityVoter, VoteOutcome};
use log::{debug, info, warn};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

/// How a scan phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Stability voting locked this plate; the session is ready to confirm.
    Locked(String),
    /// The session was cancelled while scanning.
    Cancelled,
}

enum CycleResult {
    Continue,
    Locked(String),
    /// In-flight guard refused an overlapping cycle, or the outcome was
    /// discarded after cancellation.
    Skipped,
}

pub struct SessionController<C, R, B> {
    lane_kind: LaneKind,
    parking_lot_id: Option<i64>,
    camera: C,
    recognizer: R,
    backend: B,
    extractor: RegionExtractor,
    preprocessor: ImagePreprocessor,
    validator: FormatValidator,
    charset: Charset,
    cycle_interval: Duration,
    status: Mutex<SessionStatus>,
    voter: Mutex<StabilityVoter>,
    locked_plate: Mutex<Option<String>>,
    active: AtomicBool,
    in_flight: AtomicBool,
}

impl<C, R, B> SessionController<C, R, B>
where
    C: FrameSource,
    R: RecognitionClient,
    B: LaneBackend,
{
    pub fn new(
        lane_kind: LaneKind,
        camera: C,
        recognizer: R,
        backend: B,
        config: &PipelineConfig,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            lane_kind,
            parking_lot_id: None,
            camera,
            recognizer,
            backend,
            extractor: RegionExtractor::from_config(config),
            preprocessor: ImagePreprocessor::new(),
            validator: FormatValidator::from_config(config)?,
            charset: Charset::plate(config.plate_separator),
            cycle_interval: config.cycle_interval(),
            status: Mutex::new(SessionStatus::Idle),
            voter: Mutex::new(StabilityVoter::new(config.required_streak)),
            locked_plate: Mutex::new(None),
            active: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Required before `start()` on a rent lane; settle lanes identify the
    /// vehicle by plate alone.
    pub fn with_parking_lot(mut self, parking_lot_id: i64) -> Self {
        self.parking_lot_id = Some(parking_lot_id);
        self
    }

    pub fn lane_kind(&self) -> LaneKind {
        self.lane_kind
    }

    pub fn status(&self) -> SessionStatus {
        *self.lock_status()
    }

    pub fn locked_plate(&self) -> Option<String> {
        self.locked_plate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Acquire the camera and scan until a plate locks or the session is
    /// cancelled. Camera failures are fatal to the session.
    pub async fn start(&self) -> Result<ScanOutcome, SessionError> {
        if self.lane_kind == LaneKind::Rent && self.parking_lot_id.is_none() {
            return Err(SessionError::MissingLot);
        }
        {
            let status = self.lock_status();
            if *status != SessionStatus::Idle {
                return Err(SessionError::InvalidTransition {
                    state: status_name(*status),
                    operation: "start",
                });
            }
        }

        self.camera.start()?;
        self.enter_scanning();
        info!("session started ({:?} lane)", self.lane_kind);
        self.scan_loop().await
    }

    /// Only valid in `Locked` (or after a failed confirm, which returns
    /// the session to `Locked`). Delegates to the lane backend; on failure
    /// the session stays confirmable so the user may retry or rescan.
    pub async fn confirm(&self) -> Result<Receipt, SessionError> {
        let plate = {
            let mut status = self.lock_status();
            if *status != SessionStatus::Locked {
                return Err(SessionError::InvalidTransition {
                    state: status_name(*status),
                    operation: "confirm",
                });
            }
            let Some(plate) = self.locked_plate() else {
                return Err(SessionError::InvalidTransition {
                    state: status_name(*status),
                    operation: "confirm without a locked plate",
                });
            };
            if self.lane_kind == LaneKind::Rent && self.parking_lot_id.is_none() {
                return Err(SessionError::MissingLot);
            }
            *status = SessionStatus::Confirming;
            plate
        };

        let result = match self.lane_kind {
            LaneKind::Rent => {
                let request = RentRequest {
                    license_plate: plate,
                    parking_lot_id: self.parking_lot_id.unwrap_or_default(),
                    start_time: OffsetDateTime::now_utc(),
                };
                self.backend.rent(&request).await.map(Receipt::Entry)
            }
            LaneKind::Settle => {
                let request = SettleRequest {
                    license_plate: plate,
                    end_time: OffsetDateTime::now_utc(),
                };
                self.backend.settle(&request).await.map(Receipt::Exit)
            }
        };

        match result {
            Ok(receipt) => {
                *self.lock_status() = SessionStatus::Confirmed;
                info!("session confirmed ({:?} lane)", self.lane_kind);
                Ok(receipt)
            }
            Err(err) => {
                warn!("business action failed, returning to Locked: {err}");
                *self.lock_status() = SessionStatus::Locked;
                Err(err.into())
            }
        }
    }

    /// Drop the locked plate, reset voting, and scan again.
    pub async fn rescan(&self) -> Result<ScanOutcome, SessionError> {
        {
            let status = self.lock_status();
            if *status != SessionStatus::Locked {
                return Err(SessionError::InvalidTransition {
                    state: status_name(*status),
                    operation: "rescan",
                });
            }
        }

        *self
            .locked_plate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        self.voter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .reset();

        self.camera.start()?;
        self.enter_scanning();
        info!("session rescanning");
        self.scan_loop().await
    }

    /// Valid from any non-terminal state. Stops the camera unconditionally;
    /// an in-flight cycle's outcome will be discarded when it completes.
    pub fn cancel(&self) {
        let mut status = self.lock_status();
        if status.is_terminal() {
            return;
        }
        self.active.store(false, Ordering::SeqCst);
        self.camera.stop();
        *status = SessionStatus::Cancelled;
        info!("session cancelled");
    }

    fn enter_scanning(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.voter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .begin_scan();
        *self.lock_status() = SessionStatus::Scanning;
    }

    async fn scan_loop(&self) -> Result<ScanOutcome, SessionError> {
        loop {
            if !self.active.load(Ordering::SeqCst) {
                return Ok(ScanOutcome::Cancelled);
            }

            match self.run_cycle().await {
                Ok(CycleResult::Locked(plate)) => {
                    if !self.apply_lock(&plate) {
                        return Ok(ScanOutcome::Cancelled);
                    }
                    self.camera.stop();
                    return Ok(ScanOutcome::Locked(plate));
                }
                Ok(CycleResult::Continue | CycleResult::Skipped) => {}
                Err(err) => {
                    // Fatal: release the device on this exit path too.
                    self.active.store(false, Ordering::SeqCst);
                    self.camera.stop();
                    let mut status = self.lock_status();
                    if !status.is_terminal() {
                        *status = SessionStatus::Cancelled;
                    }
                    return Err(err.into());
                }
            }

            // Cadence runs from the end of one cycle to the start of the
            // next; a slow recognition call throttles the loop on its own.
            tokio::time::sleep(self.cycle_interval).await;
        }
    }

    async fn run_cycle(&self) -> Result<CycleResult, CameraError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("previous cycle still in flight, skipping");
            return Ok(CycleResult::Skipped);
        }
        let result = self.cycle_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn cycle_inner(&self) -> Result<CycleResult, CameraError> {
        let frame = self.camera.capture_frame().await?;
        let region = self.extractor.extract(&frame);
        let prepared = self.preprocessor.prepare(&frame, region.as_ref());

        let recognition = self
            .recognizer
            .recognize(&prepared, &self.charset, RecognitionMode::SingleLine)
            .await;

        // Cancellation is checked at the point a result would be applied.
        if !self.active.load(Ordering::SeqCst) {
            debug!("discarding recognition result from cancelled session");
            return Ok(CycleResult::Skipped);
        }

        let validated = match recognition {
            Ok(result) => self.validator.validate(&result),
            Err(err) => {
                // Recovered locally: no detection this cycle.
                warn!("recognition unavailable this cycle: {err}");
                None
            }
        };

        let outcome = self
            .voter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(validated.as_ref());

        match outcome {
            VoteOutcome::Locked(plate) => Ok(CycleResult::Locked(plate)),
            VoteOutcome::Pending => Ok(CycleResult::Continue),
        }
    }

    /// Move Scanning → Locked unless the session was cancelled in the
    /// meantime. The locked plate is set exactly once per lock episode.
    fn apply_lock(&self, plate: &str) -> bool {
        let mut status = self.lock_status();
        if !self.active.load(Ordering::SeqCst) || *status != SessionStatus::Scanning {
            return false;
        }
        *status = SessionStatus::Locked;
        *self
            .locked_plate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(plate.to_string());
        info!("session locked on plate {plate:?}");
        true
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, SessionStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn status_name(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "Idle",
        SessionStatus::Scanning => "Scanning",
        SessionStatus::Locked => "Locked",
        SessionStatus::Confirming => "Confirming",
        SessionStatus::Confirmed => "Confirmed",
        SessionStatus::Cancelled => "Cancelled",
    }
}
