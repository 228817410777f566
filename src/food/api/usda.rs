use async_trait::async_trait;
use serde::Deserialize;

use crate::food::analysis::selector::FoodIdentity;
use crate::food::api::traits::{LookupError, NutritionLookup};
use crate::food::config::FoodConfig;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Option<Vec<FoodItem>>,
}

/// One food record as published by FoodData Central.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    #[serde(default)]
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    #[serde(default)]
    pub nutrient_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UsdaClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    data_type: String,
}

impl UsdaClient {
    pub fn new(config: &FoodConfig, client: reqwest::Client) -> Self {
        if config.usda_api_key.is_none() {
            // Reported once here; lookups then quietly return nothing.
            tracing::warn!("USDA_API_KEY is not set, nutrition lookups are disabled");
        }

        Self {
            client,
            api_key: config.usda_api_key.clone(),
            base_url: config.usda_api_url.trim_end_matches('/').to_string(),
            data_type: config.usda_data_type.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_single_food(&self, api_key: &str, query: &str) -> Result<Option<FoodItem>, LookupError> {
        let url = format!("{}/foods/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("query", query),
                ("pageSize", "1"),
                ("dataType", self.data_type.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let data: SearchResponse = response.json().await?;

        Ok(data.foods.and_then(|foods| foods.into_iter().next()))
    }
}

#[async_trait]
impl NutritionLookup for UsdaClient {
    async fn lookup(&self, food: &FoodIdentity) -> Result<Option<FoodItem>, LookupError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let result = self.search_single_food(api_key, food.as_str()).await?;
        match &result {
            Some(item) => tracing::debug!("USDA match for '{}': {}", food, item.description),
            None => tracing::debug!("No USDA match for '{}'", food),
        }
        Ok(result)
    }
}
