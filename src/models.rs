use image::{ColorType, DynamicImage, GrayImage};
use time::OffsetDateTime;

/// One captured video frame. Owned by the cycle that captured it and
/// dropped when the cycle completes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    pub captured_at: OffsetDateTime,
}

impl Frame {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            captured_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_format(&self) -> ColorType {
        self.image.color()
    }
}

/// A rectangle within a frame that looks like a plate.
/// `None` at the call sites means "use the full frame".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Crop this region out of a frame, clamped to the frame bounds.
    pub fn crop(&self, frame: &Frame) -> DynamicImage {
        let x = self.x.min(frame.width().saturating_sub(1));
        let y = self.y.min(frame.height().saturating_sub(1));
        let width = self.width.min(frame.width() - x);
        let height = self.height.min(frame.height() - y);
        frame.image.crop_imm(x, y, width, height)
    }
}

/// Processed pixel buffer ready for the recognition engine.
/// Owned solely by the current cycle, never shared across cycles.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub image: GrayImage,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// What the recognition engine returned for one cycle.
/// Consumed immediately by the format validator.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub raw_text: String,
    /// Engine confidence in 0.0..=100.0.
    pub confidence: f32,
}

/// A recognition result that passed the plate grammar and the
/// confidence threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPlate {
    pub normalized_text: String,
}

/// Voting state carried across cycles by the stability voter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteState {
    pub candidate: Option<String>,
    pub streak_count: u32,
}

/// Which business action a lane session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneKind {
    /// Lane entry: starts a rental against a parking lot.
    Rent,
    /// Lane exit: settles the vehicle's rental by plate.
    Settle,
}

/// Session lifecycle. Transitions are forward-only; `Cancelled` is
/// reachable from `Scanning` and `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Scanning,
    Locked,
    Confirming,
    Confirmed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Confirmed | SessionStatus::Cancelled)
    }
}
