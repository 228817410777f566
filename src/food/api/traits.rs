use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::food::analysis::selector::FoodIdentity;
use crate::food::api::credentials::CredentialsError;
use crate::food::api::usda::FoodItem;

/// A label returned by the recognizer. Rank is implied by position in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCandidate {
    pub description: String,
    #[serde(default)]
    pub score: Option<f32>,
}

impl LabelCandidate {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            score: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Label recognizer is not configured")]
    NotConfigured,
    #[error("Authentication failed: {0}")]
    Auth(#[from] CredentialsError),
    #[error("Failed to reach label recognizer: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Label recognizer returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("Label recognizer rejected the image: {0}")]
    Rejected(String),
    #[error("Malformed label recognizer response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to reach nutrition database: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Nutrition database returned {0}")]
    Status(reqwest::StatusCode),
}

/// External image-classification service.
///
/// Receives the raw upload bytes. Implementations return labels in the
/// service's own relevance order and never retry; retry and timeout policy
/// belongs to the caller.
#[async_trait]
pub trait LabelRecognizer: Send + Sync {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<LabelCandidate>, RecognitionError>;
}

/// External nutrition database keyed by free-text food name.
///
/// `Ok(None)` means "no match" (or the lookup is disabled), never a failure.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn lookup(&self, food: &FoodIdentity) -> Result<Option<FoodItem>, LookupError>;
}
