use super::{Charset, RecognitionClient, RecognitionMode};
use crate::error::RecognitionError;
use crate::models::{PreparedImage, RecognitionResult};
use image::DynamicImage;
use log::debug;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;
use std::sync::Mutex;

/// `ocrs` reports no per-line confidence through `get_text`, so results
/// carry this fixed score and rely on the grammar check and stability
/// voting downstream.
const LOCAL_ENGINE_CONFIDENCE: f32 = 90.0;

/// Local recognition backend on the `ocrs`/`rten` OCR stack.
pub struct OcrsClient {
    engine: Mutex<OcrEngine>,
}

impl OcrsClient {
    /// Load models from the standard cache location (`~/.cache/ocrs`).
    pub fn from_cache_dir() -> anyhow::Result<Self> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;

        let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
        let detection_model_path = cache_dir.join("text-detection.rten");
        let recognition_model_path = cache_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl RecognitionClient for OcrsClient {
    async fn recognize(
        &self,
        image: &PreparedImage,
        charset: &Charset,
        mode: RecognitionMode,
    ) -> Result<RecognitionResult, RecognitionError> {
        debug_assert_eq!(mode, RecognitionMode::SingleLine);

        // ocrs expects RGB input.
        let rgb = DynamicImage::ImageLuma8(image.image.clone()).to_rgb8();

        let engine = self
            .engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| RecognitionError::MalformedImage(e.to_string()))?;
        let ocr_input = engine
            .prepare_input(source)
            .map_err(|e| RecognitionError::MalformedImage(e.to_string()))?;

        let text = engine
            .get_text(&ocr_input)
            .map_err(|e| RecognitionError::Rejected(e.to_string()))?;

        let raw_text = charset.filter(text.trim());
        debug!("local engine read {raw_text:?}");

        Ok(RecognitionResult {
            raw_text,
            confidence: LOCAL_ENGINE_CONFIDENCE,
        })
    }
}
