//! GestureClient: HTTP client for the gesture recognition service

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::core::Frame;
use crate::types::EngineError;

/// Classifies one frame into a raw gesture report
///
/// The report is returned undecoded; `GestureNormalizer` owns its interpretation.
#[allow(async_fn_in_trait)]
pub trait Recognizer {
    async fn classify(&self, frame: &Frame) -> Result<Value, EngineError>;
}

/// Recognizer backed by `POST {base}/process-gesture/`
#[derive(Debug, Clone)]
pub struct GestureClient {
    client: Client,
    base_url: String,
}

impl GestureClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/process-gesture/", self.base_url)
    }
}

impl Recognizer for GestureClient {
    async fn classify(&self, frame: &Frame) -> Result<Value, EngineError> {
        let body = json!({ "image_data": frame.to_data_url() });
        debug!(sequence = frame.sequence, bytes = frame.data.len(), "classifying frame");

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Recognition(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(EngineError::Recognition(format!("{}: {}", status, error)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::Recognition(format!("undecodable report: {}", e)))
    }
}
