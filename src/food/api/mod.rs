pub mod credentials;
pub mod traits;
pub mod usda;
pub mod vision;

// Re-export common types
pub use traits::{LabelCandidate, LabelRecognizer, LookupError, NutritionLookup, RecognitionError};
pub use usda::UsdaClient;
pub use vision::GoogleVisionClient;
