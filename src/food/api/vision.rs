use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;

use crate::food::api::credentials::{TokenSource, VisionCredentials};
use crate::food::api::traits::{LabelCandidate, LabelRecognizer, RecognitionError};
use crate::food::config::FoodConfig;

pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

enum Auth {
    ApiKey(String),
    Bearer(TokenSource),
}

/// Google Cloud Vision label detection over the REST API.
pub struct GoogleVisionClient {
    client: reqwest::Client,
    base_url: String,
    auth: Option<Auth>,
    max_results: u32,
}

impl GoogleVisionClient {
    pub fn new(config: &FoodConfig, client: reqwest::Client, max_results: u32) -> Self {
        let auth = match config.vision_credentials.clone() {
            Some(VisionCredentials::ApiKey(key)) => Some(Auth::ApiKey(key)),
            Some(VisionCredentials::ServiceAccount(key)) => {
                Some(Auth::Bearer(TokenSource::new(key, client.clone())))
            }
            None => {
                tracing::warn!("No vision credentials configured, image analysis will fail until they are provided");
                None
            }
        };

        Self {
            client,
            base_url: config.vision_api_url.trim_end_matches('/').to_string(),
            auth,
            max_results,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.auth.is_some()
    }

    fn request_body(&self, image: &[u8]) -> serde_json::Value {
        json!({
            "requests": [{
                "image": { "content": general_purpose::STANDARD.encode(image) },
                "features": [{ "type": "LABEL_DETECTION", "maxResults": self.max_results }]
            }]
        })
    }
}

#[async_trait]
impl LabelRecognizer for GoogleVisionClient {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<LabelCandidate>, RecognitionError> {
        let auth = self.auth.as_ref().ok_or(RecognitionError::NotConfigured)?;
        let url = format!("{}/images:annotate", self.base_url);

        let request = self.client.post(&url).json(&self.request_body(image));
        let request = match auth {
            Auth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Auth::Bearer(tokens) => request.bearer_auth(tokens.access_token().await?),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Status { status, body });
        }

        let body = response.text().await?;
        parse_labels(&body)
    }
}

fn parse_labels(body: &str) -> Result<Vec<LabelCandidate>, RecognitionError> {
    let parsed: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| RecognitionError::Malformed(e.to_string()))?;

    let first = parsed
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| RecognitionError::Malformed("empty responses array".to_string()))?;

    if let Some(error) = first.error {
        return Err(RecognitionError::Rejected(format!("{} (code {})", error.message, error.code)));
    }

    // No labelAnnotations means nothing was recognized.
    Ok(first
        .label_annotations
        .into_iter()
        .map(|label| LabelCandidate {
            description: label.description,
            score: label.score,
        })
        .collect())
}
