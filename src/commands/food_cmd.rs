use colored::Colorize;

use crate::food::analysis::{FoodAnalyzer, FoodIdentity, NutrientValue, NutritionRecord};

pub async fn handle_command(input: &str, analyzer: &FoodAnalyzer) -> Result<(), String> {
    let input = input.trim();

    match input.split_whitespace().next() {
        Some("analyze") => {
            let path = input.trim_start_matches("analyze").trim();
            if path.is_empty() {
                println!("Please specify an image file to analyze.");
                return Ok(());
            }
            println!("Analyzing image: {}\n", path);

            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| format!("Failed to read {}: {}", path, e))?;
            let result = analyzer.analyze(&bytes).await.map_err(|e| e.to_string())?;

            println!("🍽️  Detected food: {}", result.detected_food.green().bold());
            if !result.labels.is_empty() {
                println!("🏷️  Labels: {}", result.labels.join(", "));
            }
            println!("{}", render_nutrition(result.nutrition.as_ref()));
            Ok(())
        }
        Some("nutrition") => {
            let food_item = input.trim_start_matches("nutrition").trim();
            if food_item.is_empty() {
                println!("Please specify a food item to analyze.");
                return Ok(());
            }
            println!("Analyzing nutrition for: {}\n", food_item);

            let nutrition = analyzer.lookup_nutrition(&FoodIdentity::new(food_item)).await;
            println!("{}", render_nutrition(nutrition.as_ref()));
            Ok(())
        }
        _ => {
            println!("Available commands:\n- analyze <image path> (Identify food and get nutrition facts)\n- nutrition <food_item> (Get nutrition facts)");
            Ok(())
        }
    }
}

pub fn render_nutrition(nutrition: Option<&NutritionRecord>) -> String {
    let Some(record) = nutrition else {
        return "Nutrition data unavailable for this item.".to_string();
    };

    let mut out = format!("Food: {}\n", record.description);
    if let Some(brand) = &record.brand {
        out.push_str(&format!("Brand: {}\n", brand));
    }

    let n = &record.nutrients;
    for (label, value) in [
        ("Calories", &n.calories),
        ("Protein", &n.protein),
        ("Fat", &n.fat),
        ("Carbs", &n.carbs),
        ("Fiber", &n.fiber),
        ("Sodium", &n.sodium),
    ] {
        out.push_str(&format!("- {}: {}\n", label, render_value(value)));
    }
    out
}

fn render_value(value: &NutrientValue) -> String {
    match (value.amount, value.unit.as_deref()) {
        (Some(amount), Some(unit)) => format!("{:.1} {}", amount, unit),
        (Some(amount), None) => format!("{:.1}", amount),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::analysis::Nutrients;

    #[test]
    fn test_render_missing_nutrition() {
        assert_eq!(render_nutrition(None), "Nutrition data unavailable for this item.");
    }

    #[test]
    fn test_render_partial_record() {
        let record = NutritionRecord {
            description: "Banana, raw".to_string(),
            brand: None,
            nutrients: Nutrients {
                calories: NutrientValue::new(89.0, "KCAL"),
                ..Nutrients::default()
            },
        };

        let text = render_nutrition(Some(&record));
        assert!(text.contains("Food: Banana, raw"));
        assert!(text.contains("- Calories: 89.0 KCAL"));
        assert!(text.contains("- Fiber: n/a"));
        assert!(!text.contains("Brand"));
    }
}
