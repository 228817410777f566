pub mod api;
pub mod commands;
pub mod config;
pub mod food;

// Re-export commonly used items
pub use config::AppConfig;
pub use food::analysis::{AnalysisError, AnalysisResult, FoodAnalyzer};
pub use food::build_analyzer;
