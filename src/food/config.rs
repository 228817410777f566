use std::env;
use std::path::PathBuf;

use crate::food::api::credentials::{CredentialsError, VisionCredentials};

pub const DEFAULT_USDA_API_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const DEFAULT_USDA_DATA_TYPE: &str = "Survey (FNDDS)";
pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com/v1";

/// Upstream settings for the two external food services.
///
/// Credentials are optional on purpose: an absent USDA key or absent vision
/// credentials degrade the matching feature instead of stopping startup.
#[derive(Debug, Clone)]
pub struct FoodConfig {
    pub usda_api_key: Option<String>,
    pub usda_api_url: String,
    pub usda_data_type: String,
    pub vision_api_url: String,
    pub vision_credentials: Option<VisionCredentials>,
}

impl FoodConfig {
    pub fn from_env() -> Self {
        let usda_api_key = env::var("USDA_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let vision_credentials = match vision_credentials_from_env() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::error!("Failed to load vision credentials: {}", e);
                None
            }
        };

        Self {
            usda_api_key,
            usda_api_url: env::var("USDA_API_URL")
                .unwrap_or_else(|_| DEFAULT_USDA_API_URL.to_string()),
            usda_data_type: env::var("USDA_DATA_TYPE")
                .unwrap_or_else(|_| DEFAULT_USDA_DATA_TYPE.to_string()),
            vision_api_url: env::var("VISION_API_URL")
                .unwrap_or_else(|_| DEFAULT_VISION_API_URL.to_string()),
            vision_credentials,
        }
    }
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            usda_api_key: None,
            usda_api_url: DEFAULT_USDA_API_URL.to_string(),
            usda_data_type: DEFAULT_USDA_DATA_TYPE.to_string(),
            vision_api_url: DEFAULT_VISION_API_URL.to_string(),
            vision_credentials: None,
        }
    }
}

// Inline JSON first (hosted deployments), then a key file (local dev), then a plain API key.
fn vision_credentials_from_env() -> Result<Option<VisionCredentials>, CredentialsError> {
    if let Ok(inline) = env::var("GOOGLE_VISION_KEY") {
        let credentials = VisionCredentials::from_json(&inline)?;
        tracing::info!("Vision client initialized from GOOGLE_VISION_KEY");
        return Ok(Some(credentials));
    }

    if let Ok(path) = env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        let credentials = VisionCredentials::from_file(PathBuf::from(path))?;
        tracing::info!("Vision client initialized from GOOGLE_APPLICATION_CREDENTIALS");
        return Ok(Some(credentials));
    }

    if let Ok(api_key) = env::var("GOOGLE_VISION_API_KEY") {
        if !api_key.trim().is_empty() {
            tracing::info!("Vision client initialized from GOOGLE_VISION_API_KEY");
            return Ok(Some(VisionCredentials::ApiKey(api_key.trim().to_string())));
        }
    }

    Ok(None)
}
