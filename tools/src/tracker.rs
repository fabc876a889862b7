//! Free-text calorie tracking backed by the nutrition database.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::context::ToolContext;
use crate::usda;

/// One parsed ingredient segment. `quantity`/`unit` are `None` when the
/// segment carried no leading amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub food: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// Foods whose nutrition differs wildly between cooked and raw; without a
/// qualifier they need clarification rather than a guess.
const AMBIGUOUS_FOODS: &[&str] = &["rice", "pasta", "oats", "oatmeal", "chicken", "potato", "beans"];

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",|\band\b|\+").expect("valid separator pattern"))
}

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+\.?\d*)\s*(g|kg|ml|l|oz|cup|piece|pieces|tbsp|tsp)?\s*(.+)$")
            .expect("valid quantity pattern")
    })
}

/// Parse a meal description into ingredients.
///
/// `"100g oats, 300ml milk and 5 eggs"` becomes three entries; kg and l are
/// normalized to g and ml.
pub fn parse_ingredients(description: &str) -> Vec<Ingredient> {
    let mut ingredients = Vec::new();

    for part in separator_re().split(&description.to_lowercase()) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(caps) = quantity_re().captures(part) {
            let mut quantity: f64 = caps[1].parse().unwrap_or(0.0);
            let mut unit = caps.get(2).map(|m| m.as_str().to_string());
            let food = caps[3].trim().to_string();

            match unit.as_deref() {
                Some("kg") => {
                    quantity *= 1000.0;
                    unit = Some("g".to_string());
                }
                Some("l") => {
                    quantity *= 1000.0;
                    unit = Some("ml".to_string());
                }
                None => unit = Some("g".to_string()),
                _ => {}
            }

            ingredients.push(Ingredient {
                food,
                quantity: Some(quantity),
                unit,
            });
        } else {
            // No leading quantity, just a food name
            ingredients.push(Ingredient {
                food: part.to_string(),
                quantity: None,
                unit: None,
            });
        }
    }

    ingredients
}

/// Flag ingredients missing a quantity or a cooked/raw qualifier.
pub fn check_missing_details(ingredients: &[Ingredient]) -> Vec<String> {
    let mut missing = Vec::new();

    for ing in ingredients {
        if ing.quantity.is_none() {
            missing.push(format!(
                "'{}' - needs quantity (e.g., '100g {}' or '2 {}')",
                ing.food, ing.food, ing.food
            ));
            continue;
        }

        for ambiguous in AMBIGUOUS_FOODS {
            if ing.food.contains(ambiguous)
                && !ing.food.contains("cooked")
                && !ing.food.contains("raw")
                && !ing.food.contains("grilled")
            {
                missing.push(format!(
                    "'{}' - is it cooked or raw? (e.g., 'cooked {}' or 'raw {}')",
                    ing.food, ing.food, ing.food
                ));
                break;
            }
        }
    }

    missing
}

/// Scale per-100g nutrition to the stated quantity.
///
/// The piece conversion is a single global 50 g approximation; right for
/// eggs, rough for larger items.
pub fn quantity_multiplier(quantity: f64, unit: &str) -> f64 {
    match unit {
        "g" | "ml" => quantity / 100.0,
        "piece" | "pieces" => quantity * 50.0 / 100.0,
        "cup" => quantity * 2.4,
        "tbsp" => quantity * 0.15,
        "tsp" => quantity * 0.05,
        _ => quantity / 100.0,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Track calories and macros from a meal description.
///
/// Returns `need_clarification` for unparseable or ambiguous input, partial
/// results when some foods are unmatched, and an explicit error record when
/// the nutrition API key is absent.
pub async fn track_calories(ctx: &ToolContext, meal_description: &str) -> Value {
    debug!(meal = meal_description, "track_calories");

    let api_key = match ctx.config.usda_api_key.as_deref() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            warn!("USDA_API_KEY is not configured");
            return json!({
                "meal": meal_description,
                "calories": 0,
                "protein_grams": 0,
                "carbs_grams": 0,
                "fats_grams": 0,
                "error": "USDA_API_KEY not found. Get a free key at: https://fdc.nal.usda.gov/api-key-signup.html",
                "status": "error"
            });
        }
    };

    let ingredients = parse_ingredients(meal_description);

    if ingredients.is_empty() {
        return json!({
            "meal": meal_description,
            "status": "need_clarification",
            "message": "I need more details about the meal. Please specify:",
            "questions": [
                "What foods did you eat? (e.g., 'chicken', 'rice', 'eggs')",
                "How much of each? (e.g., '100g', '2 pieces', '1 cup')",
                "If applicable: cooked or raw? (e.g., 'rice cooked', 'chicken raw')"
            ],
            "example": "Try: '100g oats, 300ml milk, 5 eggs' or 'grilled chicken breast 150g, cooked rice 200g'"
        });
    }

    let missing = check_missing_details(&ingredients);
    if !missing.is_empty() {
        return json!({
            "meal": meal_description,
            "status": "need_clarification",
            "message": "I found these foods but need more details:",
            "missing_details": missing,
            "example": "For rice, please specify: 'cooked rice 200g' or 'raw rice 50g'"
        });
    }

    let mut total_calories = 0.0;
    let mut total_protein = 0.0;
    let mut total_carbs = 0.0;
    let mut total_fats = 0.0;
    let mut breakdown = Vec::new();

    for ing in &ingredients {
        let quantity = ing.quantity.unwrap_or(100.0);
        let unit = ing.unit.as_deref().unwrap_or("g");

        match usda::search_food(&ctx.http, &api_key, &ing.food).await {
            Some(nutrition) => {
                let multiplier = quantity_multiplier(quantity, unit);
                let cal = nutrition.calories * multiplier;
                let prot = nutrition.protein * multiplier;
                let carb = nutrition.carbs * multiplier;
                let fat = nutrition.fats * multiplier;

                total_calories += cal;
                total_protein += prot;
                total_carbs += carb;
                total_fats += fat;

                breakdown.push(json!({
                    "food": nutrition.name,
                    "quantity": format!("{}{}", quantity, unit),
                    "calories": cal.round() as i64,
                    "protein": round1(prot),
                    "carbs": round1(carb),
                    "fats": round1(fat)
                }));
            }
            None => {
                breakdown.push(json!({
                    "food": ing.food,
                    "quantity": format!("{}{}", quantity, unit),
                    "error": "Not found in nutrition database",
                    "suggestion": format!(
                        "Try being more specific: '{} cooked' or '{} raw'",
                        ing.food, ing.food
                    )
                }));
            }
        }
    }

    json!({
        "meal": meal_description,
        "total_calories": total_calories.round() as i64,
        "total_protein_grams": round1(total_protein),
        "total_carbs_grams": round1(total_carbs),
        "total_fats_grams": round1(total_fats),
        "foods_breakdown": breakdown,
        "status": if total_calories > 0.0 { "success" } else { "partial" },
        "source": "USDA FoodData Central"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fitcoach_core::client::CompletionBackend;
    use fitcoach_core::config::CoachConfig;
    use fitcoach_core::errors::{CoreError, CoreResult};
    use fitcoach_core::types::{AssistantReply, ChatRequest};
    use std::sync::Arc;

    struct UnreachableBackend;

    #[async_trait]
    impl CompletionBackend for UnreachableBackend {
        async fn complete(&self, _request: ChatRequest) -> CoreResult<AssistantReply> {
            Err(CoreError::RequestError("backend should not be called".to_string()))
        }
    }

    fn ctx_with_usda_key() -> ToolContext {
        let mut config = CoachConfig::default();
        config.usda_api_key = Some("test-key".to_string());
        ToolContext::new(Arc::new(UnreachableBackend), Arc::new(config))
    }

    fn ing(food: &str, quantity: Option<f64>, unit: Option<&str>) -> Ingredient {
        Ingredient {
            food: food.to_string(),
            quantity,
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn parses_quantity_unit_food_triples() {
        let parsed = parse_ingredients("100g oats, 300ml milk, 5 eggs");
        assert_eq!(
            parsed,
            vec![
                ing("oats", Some(100.0), Some("g")),
                ing("milk", Some(300.0), Some("ml")),
                ing("eggs", Some(5.0), Some("g")),
            ]
        );
    }

    #[test]
    fn splits_on_and_and_plus() {
        let parsed = parse_ingredients("2 eggs and 50g cheese + 1 cup coffee");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1].food, "cheese");
        assert_eq!(parsed[2].unit.as_deref(), Some("cup"));
    }

    #[test]
    fn normalizes_kg_and_l() {
        let parsed = parse_ingredients("1kg cooked potato, 1l water");
        assert_eq!(parsed[0].quantity, Some(1000.0));
        assert_eq!(parsed[0].unit.as_deref(), Some("g"));
        assert_eq!(parsed[1].quantity, Some(1000.0));
        assert_eq!(parsed[1].unit.as_deref(), Some("ml"));
    }

    #[test]
    fn bare_food_name_has_no_quantity() {
        let parsed = parse_ingredients("rice");
        assert_eq!(parsed, vec![ing("rice", None, None)]);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(parse_ingredients("").is_empty());
        assert!(parse_ingredients("   ").is_empty());
        assert!(parse_ingredients(", ,").is_empty());
    }

    #[test]
    fn missing_quantity_is_flagged() {
        let missing = check_missing_details(&[ing("oats", None, None)]);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].contains("needs quantity"));
    }

    #[test]
    fn ambiguous_foods_need_preparation_detail() {
        let missing = check_missing_details(&[ing("rice", Some(100.0), Some("g"))]);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].contains("cooked or raw"));
    }

    #[test]
    fn qualified_ambiguous_foods_pass() {
        for food in ["cooked rice", "raw chicken breast", "grilled chicken"] {
            let missing = check_missing_details(&[ing(food, Some(100.0), Some("g"))]);
            assert!(missing.is_empty(), "{} should not be flagged", food);
        }
    }

    #[test]
    fn unambiguous_food_with_quantity_passes() {
        let missing = check_missing_details(&[ing("milk", Some(300.0), Some("ml"))]);
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn ambiguous_meal_asks_for_clarification() {
        // "rice" has no quantity and no cooked/raw qualifier; the tool must
        // ask rather than guess, before any network lookup happens
        let result = track_calories(&ctx_with_usda_key(), "rice").await;
        assert_eq!(result["status"], "need_clarification");
        assert!(!result["missing_details"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_meal_asks_for_clarification_with_guidance() {
        for meal in ["", "   "] {
            let result = track_calories(&ctx_with_usda_key(), meal).await;
            assert_eq!(result["status"], "need_clarification", "meal {:?}", meal);
            assert!(result["example"].as_str().unwrap().contains("100g oats"));
        }
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(quantity_multiplier(100.0, "g"), 1.0);
        assert_eq!(quantity_multiplier(250.0, "ml"), 2.5);
        assert_eq!(quantity_multiplier(5.0, "piece"), 2.5); // 5 x 50g
        assert_eq!(quantity_multiplier(1.0, "cup"), 2.4);
        assert_eq!(quantity_multiplier(2.0, "tbsp"), 0.3);
        assert_eq!(quantity_multiplier(1.0, "tsp"), 0.05);
        assert_eq!(quantity_multiplier(30.0, "oz"), 0.3); // unknown unit falls back to /100
    }
}
