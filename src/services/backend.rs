use crate::error::{AppError, Result};
use crate::models::{Detection, RawDetection};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// What the collector found at a detection's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOutcome {
    Collect,
    NotFound,
}

impl DetectionOutcome {
    /// Last path segment of the backend endpoint
    pub fn path_segment(&self) -> &'static str {
        match self {
            DetectionOutcome::Collect => "collect",
            DetectionOutcome::NotFound => "not_found",
        }
    }
}

/// Backend response passed through to the caller as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Detections/collector backend. Storage and collection bookkeeping live
/// there; this service only reads and forwards.
#[async_trait]
pub trait DetectionsBackend: Send + Sync {
    /// Detections with the given status, normalized. Invalid records are dropped.
    async fn detections_by_status(&self, status: &str) -> Result<Vec<Detection>>;

    /// A collector's activity history, normalized.
    async fn collector_activity(&self, collector_id: &str) -> Result<Vec<Detection>>;

    /// Records a collection outcome. Any HTTP status is returned as a
    /// reply; only transport failures are errors.
    async fn mark_detection(
        &self,
        detection_id: &str,
        outcome: DetectionOutcome,
        collector_user_id: &str,
    ) -> Result<BackendReply>;
}

#[derive(Clone)]
pub struct HttpDetectionsBackend {
    client: Client,
    base_url: String,
}

impl HttpDetectionsBackend {
    pub fn new(base_url: String) -> Self {
        HttpDetectionsBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_detections(&self, url: &str) -> Result<Vec<Detection>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %url, "Backend HTTP error {} for {}", status, url);
            return Err(AppError::Backend(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let records: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to parse response: {}", e)))?;

        Ok(parse_detections(records))
    }
}

/// Normalizes a batch record by record so that one malformed entry does
/// not discard the others.
pub fn parse_detections(records: Vec<serde_json::Value>) -> Vec<Detection> {
    let total = records.len();
    let detections: Vec<Detection> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawDetection>(record) {
            Ok(raw) => raw.into_detection(),
            Err(e) => {
                tracing::warn!("Dropping malformed detection record: {}", e);
                None
            }
        })
        .collect();

    if detections.len() < total {
        tracing::info!(
            kept = detections.len(),
            total,
            "Kept {} of {} detection records",
            detections.len(),
            total
        );
    }
    detections
}

#[async_trait]
impl DetectionsBackend for HttpDetectionsBackend {
    async fn detections_by_status(&self, status: &str) -> Result<Vec<Detection>> {
        let url = format!(
            "{}/detections/map/status/{}",
            self.base_url,
            urlencoding::encode(status)
        );
        self.fetch_detections(&url).await
    }

    async fn collector_activity(&self, collector_id: &str) -> Result<Vec<Detection>> {
        let url = format!(
            "{}/collector/activity/{}",
            self.base_url,
            urlencoding::encode(collector_id)
        );
        self.fetch_detections(&url).await
    }

    async fn mark_detection(
        &self,
        detection_id: &str,
        outcome: DetectionOutcome,
        collector_user_id: &str,
    ) -> Result<BackendReply> {
        let url = format!(
            "{}/detections/{}/{}",
            self.base_url,
            urlencoding::encode(detection_id),
            outcome.path_segment()
        );

        tracing::info!(
            detection_id = %detection_id,
            outcome = outcome.path_segment(),
            "Marking detection {} as {}",
            detection_id, outcome.path_segment()
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({ "collector_user_id": collector_user_id }))
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to read response: {}", e)))?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        if !(200..300).contains(&status) {
            tracing::warn!(status, detection_id = %detection_id, "Backend rejected detection update");
        }

        Ok(BackendReply { status, body })
    }
}
