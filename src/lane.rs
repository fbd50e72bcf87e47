//! Business-action boundary.
//!
//! Once a plate is locked and the user confirms it, the session delegates
//! the actual lane-entry (rent) or lane-exit (settle) call to an injected
//! `LaneBackend`. The pipeline never hard-wires a transport.

use crate::error::BusinessActionError;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;

/// Lane-entry submission.
#[derive(Debug, Clone, Serialize)]
pub struct RentRequest {
    pub license_plate: String,
    pub parking_lot_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
}

/// Lane-exit submission. Settle identifies the vehicle by plate only.
#[derive(Debug, Clone, Serialize)]
pub struct SettleRequest {
    pub license_plate: String,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
}

/// Opaque confirmation returned by the rent endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RentReceipt {
    pub reference: String,
}

/// Settlement returned by the settle endpoint, for display.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SettleReceipt {
    pub total_cost: f64,
}

/// What a confirmed session hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Entry(RentReceipt),
    Exit(SettleReceipt),
}

/// External rent/settle capability.
pub trait LaneBackend {
    fn rent(
        &self,
        request: &RentRequest,
    ) -> impl Future<Output = Result<RentReceipt, BusinessActionError>> + Send;

    fn settle(
        &self,
        request: &SettleRequest,
    ) -> impl Future<Output = Result<SettleReceipt, BusinessActionError>> + Send;
}

impl<T> LaneBackend for std::sync::Arc<T>
where
    T: LaneBackend + Send + Sync,
{
    fn rent(
        &self,
        request: &RentRequest,
    ) -> impl Future<Output = Result<RentReceipt, BusinessActionError>> + Send {
        (**self).rent(request)
    }

    fn settle(
        &self,
        request: &SettleRequest,
    ) -> impl Future<Output = Result<SettleReceipt, BusinessActionError>> + Send {
        (**self).settle(request)
    }
}

/// Configuration for the JSON-over-HTTP lane backend.
#[derive(Clone, Debug)]
pub struct HttpLaneBackendConfig {
    /// API base, e.g. `http://127.0.0.1:8080/api/v1`.
    pub base_url: String,
    pub timeout: Duration,
    /// Auth context supplied by the caller per session.
    pub bearer_token: Option<String>,
}

/// Talks to the parking service's `/rent` and `/settle` endpoints.
/// Failures carry the human-readable reason the server returned.
pub struct HttpLaneBackend {
    config: HttpLaneBackendConfig,
    agent: ureq::Agent,
}

impl HttpLaneBackend {
    pub fn new(config: HttpLaneBackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .build();
        Self { config, agent }
    }

    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, BusinessActionError>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de> + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));
        let token = self.config.bearer_token.clone();
        let body = serde_json::to_value(request)
            .map_err(|e| BusinessActionError::new(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let mut call = agent.post(&url).set("Content-Type", "application/json");
            if let Some(token) = &token {
                call = call.set("Authorization", &format!("Bearer {token}"));
            }
            match call.send_json(body) {
                Ok(response) => response
                    .into_json::<Resp>()
                    .map_err(|e| BusinessActionError::new(format!("malformed response: {e}"))),
                Err(ureq::Error::Status(code, response)) => {
                    let reason = response
                        .into_string()
                        .unwrap_or_else(|_| format!("status {code}"));
                    Err(BusinessActionError::new(reason))
                }
                Err(err) => Err(BusinessActionError::new(err.to_string())),
            }
        })
        .await
        .map_err(|e| BusinessActionError::new(format!("request task: {e}")))?
    }
}

impl LaneBackend for HttpLaneBackend {
    async fn rent(&self, request: &RentRequest) -> Result<RentReceipt, BusinessActionError> {
        self.post("rent", request).await
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleReceipt, BusinessActionError> {
        self.post("settle", request).await
    }
}

/// Logs the would-be business action instead of calling a server. Used by
/// the demo binary when no API base is configured.
pub struct DryRunBackend;

impl LaneBackend for DryRunBackend {
    async fn rent(&self, request: &RentRequest) -> Result<RentReceipt, BusinessActionError> {
        info!(
            "dry-run rent: plate {} at lot {}",
            request.license_plate, request.parking_lot_id
        );
        Ok(RentReceipt {
            reference: "dry-run".to_string(),
        })
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleReceipt, BusinessActionError> {
        info!("dry-run settle: plate {}", request.license_plate);
        Ok(SettleReceipt { total_cost: 0.0 })
    }
}
