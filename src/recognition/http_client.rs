use super::{Charset, RecognitionClient, RecognitionMode};
use crate::error::RecognitionError;
use crate::models::{PreparedImage, RecognitionResult};
use image::{DynamicImage, ImageFormat};
use log::debug;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

/// Configuration for a remote recognition engine.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Recognition endpoint, e.g. `http://127.0.0.1:5000/recognize`.
    pub endpoint: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Optional bearer token forwarded on every call.
    pub bearer_token: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/recognize".to_string(),
            timeout: Duration::from_secs(5),
            bearer_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResult {
    plate: String,
    confidence: Option<f32>,
}

/// Remote recognition backend. POSTs the prepared image as a PNG body and
/// expects `{ "plate": string, "confidence": number? }` back. Non-2xx
/// responses and transport failures surface as `RecognitionError`, which
/// the session treats as a miss, never as a fatal pipeline error.
pub struct HttpClient {
    config: HttpClientConfig,
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .build();
        Self { config, agent }
    }
}

impl RecognitionClient for HttpClient {
    async fn recognize(
        &self,
        image: &PreparedImage,
        charset: &Charset,
        mode: RecognitionMode,
    ) -> Result<RecognitionResult, RecognitionError> {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image.image.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| RecognitionError::MalformedImage(e.to_string()))?;

        let agent = self.agent.clone();
        let endpoint = self.config.endpoint.clone();
        let token = self.config.bearer_token.clone();
        let mode_name = match mode {
            RecognitionMode::SingleLine => "single_line",
        };
        let separator = charset.separator().to_string();

        // ureq is a blocking client; keep it off the async cycle loop.
        let wire: WireResult = tokio::task::spawn_blocking(move || {
            let mut request = agent
                .post(&endpoint)
                .set("Content-Type", "image/png")
                .query("mode", mode_name)
                .query("separator", &separator);
            if let Some(token) = &token {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }
            match request.send_bytes(&png) {
                Ok(response) => response
                    .into_json::<WireResult>()
                    .map_err(|e| RecognitionError::Rejected(e.to_string())),
                Err(ureq::Error::Status(code, _)) => Err(RecognitionError::Rejected(format!(
                    "engine returned status {code}"
                ))),
                Err(ureq::Error::Transport(transport)) => {
                    if transport.kind() == ureq::ErrorKind::Io {
                        Err(RecognitionError::Timeout)
                    } else {
                        Err(RecognitionError::EngineUnavailable(transport.to_string()))
                    }
                }
            }
        })
        .await
        .map_err(|e| RecognitionError::EngineUnavailable(format!("recognition task: {e}")))??;

        let raw_text = charset.filter(wire.plate.trim());
        // An unscored response is trusted and left to the grammar check
        // and stability voting.
        let confidence = wire.confidence.unwrap_or(100.0).clamp(0.0, 100.0);
        debug!("remote engine read {raw_text:?} (confidence {confidence:.1})");

        Ok(RecognitionResult {
            raw_text,
            confidence,
        })
    }
}
