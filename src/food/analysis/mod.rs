pub mod nutrition;
pub mod pipeline;
pub mod selector;

pub use nutrition::{normalize, NutrientValue, Nutrients, NutritionRecord};
pub use pipeline::{AnalysisError, AnalysisResult, AnalyzerSettings, FoodAnalyzer};
pub use selector::{select_food_identity, FoodIdentity, UNKNOWN_FOOD};
