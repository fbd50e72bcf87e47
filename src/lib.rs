pub mod camera;
pub mod config;
pub mod detection;
pub mod error;
pub mod lane;
pub mod models;
pub mod recognition;
pub mod session;
pub mod validator;
pub mod voter;

pub use camera::{DeviceClaim, FileSource, FileSourceConfig, FrameSource};
pub use config::PipelineConfig;
pub use detection::{ImagePreprocessor, PlateCandidate, RegionExtractor};
pub use error::{BusinessActionError, CameraError, RecognitionError, SessionError};
pub use lane::{
    DryRunBackend, HttpLaneBackend, HttpLaneBackendConfig, LaneBackend, Receipt, RentReceipt,
    RentRequest, SettleReceipt, SettleRequest,
};
pub use models::{
    Frame, LaneKind, PreparedImage, RecognitionResult, Region, SessionStatus, ValidatedPlate,
    VoteState,
};
pub use recognition::{
    Charset, HttpClient, HttpClientConfig, OcrsClient, RecognitionClient, RecognitionMode,
};
pub use session::{ScanOutcome, SessionController};
pub use validator::FormatValidator;
pub use voter::{StabilityVoter, VoteOutcome, VoterPhase};
