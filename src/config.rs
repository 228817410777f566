use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use validator::Validate;

use crate::food::analysis::AnalyzerSettings;
use crate::food::api::vision::DEFAULT_MAX_RESULTS;
use crate::food::config::FoodConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: String, value: String },
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    #[validate(range(min = 1024))]
    pub max_upload_bytes: u32,
    #[validate(range(min = 1, max = 4096))]
    pub max_concurrent_analyses: u32,
    #[validate(range(min = 1, max = 600))]
    pub vision_timeout_secs: u32,
    #[validate(range(min = 1, max = 600))]
    pub usda_timeout_secs: u32,
    #[validate(range(min = 1, max = 50))]
    pub vision_max_results: u32,
    #[validate(range(min = 1, max = 5))]
    pub recognition_attempts: u32,
    pub food: FoodConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            max_upload_bytes: 10 * 1024 * 1024,
            max_concurrent_analyses: 32,
            vision_timeout_secs: 20,
            usda_timeout_secs: 10,
            vision_max_results: DEFAULT_MAX_RESULTS,
            recognition_attempts: 1,
            food: FoodConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            upload_dir: env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            public_dir: env::var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_concurrent_analyses: parse_var("MAX_CONCURRENT_ANALYSES", defaults.max_concurrent_analyses)?,
            vision_timeout_secs: parse_var("VISION_TIMEOUT_SECS", defaults.vision_timeout_secs)?,
            usda_timeout_secs: parse_var("USDA_TIMEOUT_SECS", defaults.usda_timeout_secs)?,
            vision_max_results: parse_var("VISION_MAX_RESULTS", defaults.vision_max_results)?,
            recognition_attempts: parse_var("RECOGNITION_ATTEMPTS", defaults.recognition_attempts)?,
            food: FoodConfig::from_env(),
        };

        config.check()?;
        Ok(config)
    }

    /// Range checks plus upstream URL parsing.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        url::Url::parse(&self.food.usda_api_url)
            .map_err(|source| ConfigError::InvalidUrl { name: "USDA_API_URL", source })?;
        url::Url::parse(&self.food.vision_api_url)
            .map_err(|source| ConfigError::InvalidUrl { name: "VISION_API_URL", source })?;
        Ok(())
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            recognition_timeout: Duration::from_secs(u64::from(self.vision_timeout_secs)),
            lookup_timeout: Duration::from_secs(u64::from(self.usda_timeout_secs)),
            recognition_attempts: self.recognition_attempts,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
