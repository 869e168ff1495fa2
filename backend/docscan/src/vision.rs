//! Cloud Vision text recognition client.
//!
//! One REST call per image: `images:annotate` with `TEXT_DETECTION`, API-key
//! auth. Images are sent from memory and never touch disk.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::extract::{extract_guest, ScanOutcome};

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Vision API error: {0}")]
    Api(String),

    #[error("no text found in image")]
    NoText,

    #[error("OCR transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct VisionOcr {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl VisionOcr {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different endpoint (for tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Run text detection and return the full recognized text.
    pub async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let body = json!({
            "requests": [{
                "image": { "content": BASE64.encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        debug!(bytes = image.len(), "Submitting image for text detection");
        let resp = self
            .http
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&body)
            .send()
            .await?;
        let payload: Value = resp.json().await?;

        let response = payload
            .get("responses")
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or(Value::Null);

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(OcrError::Api(message));
        }

        let text = response
            .get("textAnnotations")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .and_then(|first| first.get("description"))
            .and_then(Value::as_str)
            .ok_or(OcrError::NoText)?;

        info!(chars = text.len(), "OCR recognized text");
        Ok(text.to_string())
    }

    /// Recognize text and extract a guest profile in one step.
    pub async fn scan(&self, image: &[u8]) -> Result<ScanOutcome, OcrError> {
        let text = self.recognize(image).await?;
        Ok(extract_guest(&text))
    }
}
