use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use lanescan::lane::{DryRunBackend, HttpLaneBackend, HttpLaneBackendConfig, LaneBackend};
use lanescan::recognition::{HttpClient, HttpClientConfig, OcrsClient};
use lanescan::{
    BusinessActionError, Charset, FileSource, FileSourceConfig, LaneKind, PipelineConfig, Receipt,
    RecognitionClient, RecognitionError, RecognitionMode, RentReceipt, RentRequest, ScanOutcome,
    SessionController, SettleReceipt, SettleRequest,
};
use lanescan::models::PreparedImage;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Lane {
    /// Lane entry: rent a spot in a parking lot.
    Rent,
    /// Lane exit: settle by plate.
    Settle,
}

#[derive(Parser)]
#[command(name = "lanescan")]
#[command(about = "Scan license plates from a directory of frames and confirm a lane action")]
struct Cli {
    /// Which lane this session drives
    #[arg(value_enum)]
    lane: Lane,

    /// Directory of image files replayed as camera frames, in name order
    #[arg(value_name = "FRAMES_DIR")]
    frames_dir: PathBuf,

    /// Parking lot id (required for rent lanes)
    #[arg(long)]
    lot: Option<i64>,

    /// Pipeline config JSON; defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Remote recognition endpoint; the local OCR stack is used when omitted
    #[arg(long, value_name = "URL")]
    engine_url: Option<String>,

    /// Parking API base for rent/settle; dry-run when omitted
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Bearer token forwarded to the parking API
    #[arg(long)]
    token: Option<String>,

    /// Confirm the locked plate instead of stopping after the lock
    #[arg(long)]
    confirm: bool,
}

enum Engine {
    Local(OcrsClient),
    Remote(HttpClient),
}

impl RecognitionClient for Engine {
    async fn recognize(
        &self,
        image: &PreparedImage,
        charset: &Charset,
        mode: RecognitionMode,
    ) -> Result<lanescan::RecognitionResult, RecognitionError> {
        match self {
            Engine::Local(client) => client.recognize(image, charset, mode).await,
            Engine::Remote(client) => client.recognize(image, charset, mode).await,
        }
    }
}

enum Backend {
    DryRun(DryRunBackend),
    Http(HttpLaneBackend),
}

impl LaneBackend for Backend {
    async fn rent(&self, request: &RentRequest) -> Result<RentReceipt, BusinessActionError> {
        match self {
            Backend::DryRun(backend) => backend.rent(request).await,
            Backend::Http(backend) => backend.rent(request).await,
        }
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleReceipt, BusinessActionError> {
        match self {
            Backend::DryRun(backend) => backend.settle(request).await,
            Backend::Http(backend) => backend.settle(request).await,
        }
    }
}

fn frame_files(dir: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    frames.sort();
    if frames.is_empty() {
        anyhow::bail!("no frame files in {}", dir.display());
    }
    Ok(frames)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let camera = FileSource::new(FileSourceConfig {
        device_id: format!("file:{}", args.frames_dir.display()),
        frames: frame_files(&args.frames_dir)?,
    });

    let engine = match &args.engine_url {
        Some(endpoint) => Engine::Remote(HttpClient::new(HttpClientConfig {
            endpoint: endpoint.clone(),
            ..HttpClientConfig::default()
        })),
        None => Engine::Local(OcrsClient::from_cache_dir()?),
    };

    let backend = match &args.api_url {
        Some(base_url) => Backend::Http(HttpLaneBackend::new(HttpLaneBackendConfig {
            base_url: base_url.clone(),
            timeout: Duration::from_secs(10),
            bearer_token: args.token.clone(),
        })),
        None => Backend::DryRun(DryRunBackend),
    };

    let lane_kind = match args.lane {
        Lane::Rent => LaneKind::Rent,
        Lane::Settle => LaneKind::Settle,
    };

    let mut controller = SessionController::new(lane_kind, camera, engine, backend, &config)?;
    if let Some(lot) = args.lot {
        controller = controller.with_parking_lot(lot);
    }

    match controller.start().await? {
        ScanOutcome::Cancelled => {
            println!("session cancelled before a plate locked");
            return Ok(());
        }
        ScanOutcome::Locked(plate) => {
            println!("locked plate: {plate}");
        }
    }

    if args.confirm {
        match controller.confirm().await? {
            Receipt::Entry(receipt) => println!("rented (reference {})", receipt.reference),
            Receipt::Exit(receipt) => println!("settled (total cost {})", receipt.total_cost),
        }
    }

    Ok(())
}
