use serde::{Deserialize, Serialize};

use crate::food::api::usda::FoodItem;

// Nutrient names exactly as FoodData Central publishes them.
const ENERGY: &str = "Energy";
const PROTEIN: &str = "Protein";
const TOTAL_FAT: &str = "Total lipid (fat)";
const CARBOHYDRATE: &str = "Carbohydrate, by difference";
const FIBER: &str = "Fiber, total dietary";
const SODIUM: &str = "Sodium, Na";

/// Amount and unit for one nutrient slot. Both are null when unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientValue {
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

impl NutrientValue {
    pub fn new(amount: f64, unit: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            unit: Some(unit.into()),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.amount.is_none() && self.unit.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: NutrientValue,
    pub protein: NutrientValue,
    pub fat: NutrientValue,
    pub carbs: NutrientValue,
    pub fiber: NutrientValue,
    pub sodium: NutrientValue,
}

impl Nutrients {
    fn slot_mut(&mut self, nutrient_name: &str) -> Option<&mut NutrientValue> {
        match nutrient_name {
            ENERGY => Some(&mut self.calories),
            PROTEIN => Some(&mut self.protein),
            TOTAL_FAT => Some(&mut self.fat),
            CARBOHYDRATE => Some(&mut self.carbs),
            FIBER => Some(&mut self.fiber),
            SODIUM => Some(&mut self.sodium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub description: String,
    pub brand: Option<String>,
    pub nutrients: Nutrients,
}

/// Maps a FoodData Central record onto the fixed nutrient set.
///
/// Unknown nutrient names are dropped and absent ones stay null, so this
/// never fails. If a name repeats, the last entry wins.
pub fn normalize(food: &FoodItem) -> NutritionRecord {
    let mut nutrients = Nutrients::default();

    for nutrient in &food.food_nutrients {
        let Some(name) = nutrient.nutrient_name.as_deref() else {
            continue;
        };
        if let Some(slot) = nutrients.slot_mut(name) {
            *slot = NutrientValue {
                amount: nutrient.value,
                unit: nutrient.unit_name.clone(),
            };
        }
    }

    NutritionRecord {
        description: food.description.clone(),
        brand: food
            .brand_name
            .as_ref()
            .map(|brand| brand.trim().to_string())
            .filter(|brand| !brand.is_empty()),
        nutrients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn food(value: serde_json::Value) -> FoodItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_banana_energy_only() {
        let record = normalize(&food(json!({
            "description": "Banana, raw",
            "foodNutrients": [{"nutrientName": "Energy", "value": 89, "unitName": "KCAL"}]
        })));

        assert_eq!(record.description, "Banana, raw");
        assert_eq!(record.brand, None);
        assert_eq!(record.nutrients.calories, NutrientValue::new(89.0, "KCAL"));
        assert!(record.nutrients.protein.is_missing());
        assert!(record.nutrients.fat.is_missing());
        assert!(record.nutrients.carbs.is_missing());
        assert!(record.nutrients.fiber.is_missing());
    }

    #[test]
    fn test_missing_fiber_serializes_as_explicit_nulls() {
        let record = normalize(&food(json!({
            "description": "Rice, white",
            "foodNutrients": [{"nutrientName": "Protein", "value": 2.7, "unitName": "G"}]
        })));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["nutrients"]["fiber"], json!({"amount": null, "unit": null}));
        assert_eq!(value["brand"], serde_json::Value::Null);
        assert_eq!(value["nutrients"]["protein"], json!({"amount": 2.7, "unit": "G"}));
    }

    #[test]
    fn test_full_mapping_and_unknown_names_dropped() {
        let record = normalize(&food(json!({
            "description": "Pizza, cheese",
            "brandName": "Acme",
            "foodNutrients": [
                {"nutrientName": "Energy", "value": 266, "unitName": "KCAL"},
                {"nutrientName": "Protein", "value": 11.4, "unitName": "G"},
                {"nutrientName": "Total lipid (fat)", "value": 9.7, "unitName": "G"},
                {"nutrientName": "Carbohydrate, by difference", "value": 33.3, "unitName": "G"},
                {"nutrientName": "Fiber, total dietary", "value": 2.3, "unitName": "G"},
                {"nutrientName": "Sodium, Na", "value": 598, "unitName": "MG"},
                {"nutrientName": "Vitamin C, total ascorbic acid", "value": 0.5, "unitName": "MG"}
            ]
        })));

        assert_eq!(record.brand.as_deref(), Some("Acme"));
        assert_eq!(record.nutrients.fat, NutrientValue::new(9.7, "G"));
        assert_eq!(record.nutrients.carbs, NutrientValue::new(33.3, "G"));
        assert_eq!(record.nutrients.fiber, NutrientValue::new(2.3, "G"));
        assert_eq!(record.nutrients.sodium, NutrientValue::new(598.0, "MG"));

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<_> = value["nutrients"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn test_name_match_is_exact() {
        let record = normalize(&food(json!({
            "description": "Apple",
            "foodNutrients": [{"nutrientName": "energy", "value": 52, "unitName": "KCAL"}]
        })));
        assert!(record.nutrients.calories.is_missing());
    }

    #[test]
    fn test_blank_brand_is_null() {
        let record = normalize(&food(json!({"description": "Bread", "brandName": "  "})));
        assert_eq!(record.brand, None);
    }
}
