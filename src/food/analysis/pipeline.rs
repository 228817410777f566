use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;

use crate::food::analysis::nutrition::{normalize, NutritionRecord};
use crate::food::analysis::selector::{select_food_identity, FoodIdentity};
use crate::food::api::traits::{LabelCandidate, LabelRecognizer, NutritionLookup, RecognitionError};
use crate::food::intake::{ImageHandle, ImageStore, IntakeError};

pub const DEFAULT_RECOGNITION_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("Label detection failed: {0}")]
    Recognition(#[from] RecognitionError),
    #[error("Label detection timed out after {0:?}")]
    RecognitionTimeout(Duration),
}

impl AnalysisError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::Intake(e) if e.is_client_error())
    }

    /// Message safe to show to callers; upstream detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Intake(e) if e.is_client_error() => e.to_string(),
            _ => "Error analyzing image".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub detected_food: String,
    pub labels: Vec<String>,
    pub nutrition: Option<NutritionRecord>,
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub recognition_timeout: Duration,
    pub lookup_timeout: Duration,
    /// Total tries for label detection; 1 means no retry.
    pub recognition_attempts: u32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            recognition_timeout: DEFAULT_RECOGNITION_TIMEOUT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            recognition_attempts: 1,
        }
    }
}

/// Releases the stored upload exactly once.
///
/// If the analysis future is dropped before `release` runs, the release is
/// handed to the runtime instead.
struct ReleaseGuard {
    store: Arc<dyn ImageStore>,
    handle: Option<ImageHandle>,
}

impl ReleaseGuard {
    fn new(store: Arc<dyn ImageStore>, handle: ImageHandle) -> Self {
        Self {
            store,
            handle: Some(handle),
        }
    }

    fn image(&self) -> &ImageHandle {
        // Only `release` takes the handle, and it consumes the guard.
        self.handle.as_ref().expect("image handle is present until release")
    }

    async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            self.store.release(handle).await;
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::debug!("Analysis cancelled, releasing upload {}", handle.id());
                let store = self.store.clone();
                runtime.spawn(async move { store.release(handle).await });
            }
            Err(_) => tracing::warn!("No runtime to release upload {}", handle.path().display()),
        }
    }
}

/// Runs one upload through intake, label detection, identity selection and
/// nutrition lookup.
///
/// Label detection gates the result. Nutrition is best effort and degrades
/// to `None` on any failure.
pub struct FoodAnalyzer {
    store: Arc<dyn ImageStore>,
    recognizer: Arc<dyn LabelRecognizer>,
    lookup: Arc<dyn NutritionLookup>,
    settings: AnalyzerSettings,
}

impl FoodAnalyzer {
    pub fn new(
        store: Arc<dyn ImageStore>,
        recognizer: Arc<dyn LabelRecognizer>,
        lookup: Arc<dyn NutritionLookup>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            store,
            recognizer,
            lookup,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub async fn analyze(&self, upload: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let handle = self.store.accept(upload).await?;
        let guard = ReleaseGuard::new(self.store.clone(), handle);

        let outcome = self.analyze_stored(guard.image()).await;

        guard.release().await;
        outcome
    }

    async fn analyze_stored(&self, image: &ImageHandle) -> Result<AnalysisResult, AnalysisError> {
        let bytes = self.store.read(image).await?;
        let labels = self.detect_labels(image, &bytes).await?;
        let identity = select_food_identity(&labels);
        tracing::info!("Detected '{}' from {} labels", identity, labels.len());

        // Looking up the sentinel would only match something arbitrary.
        let nutrition = if identity.is_unknown() {
            None
        } else {
            self.lookup_nutrition(&identity).await
        };

        Ok(AnalysisResult {
            detected_food: identity.into_string(),
            labels: labels.into_iter().map(|label| label.description).collect(),
            nutrition,
        })
    }

    async fn detect_labels(&self, image: &ImageHandle, bytes: &[u8]) -> Result<Vec<LabelCandidate>, AnalysisError> {
        let attempts = self.settings.recognition_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match timeout(self.settings.recognition_timeout, self.recognizer.detect_labels(bytes)).await {
                Ok(Ok(labels)) => return Ok(labels),
                Ok(Err(e)) => AnalysisError::Recognition(e),
                Err(_) => AnalysisError::RecognitionTimeout(self.settings.recognition_timeout),
            };

            let retryable = !matches!(error, AnalysisError::Recognition(RecognitionError::NotConfigured));
            if attempt >= attempts || !retryable {
                tracing::error!("Label detection failed for upload {}: {}", image.id(), error);
                return Err(error);
            }

            tracing::warn!("Label detection attempt {}/{} failed: {}", attempt, attempts, error);
            attempt += 1;
        }
    }

    /// Looks up and normalizes nutrition for a food name. Never fails.
    pub async fn lookup_nutrition(&self, food: &FoodIdentity) -> Option<NutritionRecord> {
        match timeout(self.settings.lookup_timeout, self.lookup.lookup(food)).await {
            Ok(Ok(Some(item))) => Some(normalize(&item)),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Nutrition lookup for '{}' failed: {}", food, e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Nutrition lookup for '{}' timed out after {:?}",
                    food,
                    self.settings.lookup_timeout
                );
                None
            }
        }
    }
}
