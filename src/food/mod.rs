pub mod analysis;
pub mod api;
pub mod config;
pub mod intake;

use std::sync::Arc;

use crate::config::AppConfig;
use analysis::FoodAnalyzer;
use api::{GoogleVisionClient, UsdaClient};
use intake::DiskImageStore;

/// Wires the production store and upstream clients into an analyzer.
pub fn build_analyzer(config: &AppConfig) -> Result<FoodAnalyzer, reqwest::Error> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store = DiskImageStore::new(config.upload_dir.clone());
    let recognizer = GoogleVisionClient::new(&config.food, client.clone(), config.vision_max_results);
    let lookup = UsdaClient::new(&config.food, client);

    Ok(FoodAnalyzer::new(
        Arc::new(store),
        Arc::new(recognizer),
        Arc::new(lookup),
        config.analyzer_settings(),
    ))
}
