//! USDA FoodData Central lookup: per-100g nutrition by free-text food name.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const SEARCH_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<FoodHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodHit {
    #[serde(default)]
    pub description: String,
    #[serde(rename = "foodNutrients", default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodNutrient {
    #[serde(rename = "nutrientName", default)]
    pub nutrient_name: String,
    #[serde(default)]
    pub value: f64,
}

/// Nutrition per 100 g reference serving
#[derive(Debug, Clone, PartialEq)]
pub struct Nutrition {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Rewrite vague food names into queries that rank better in the database.
pub fn improve_query(food_name: &str) -> String {
    let lower = food_name.to_lowercase();
    if lower.contains("egg") && !lower.contains("white") {
        "egg whole raw".to_string()
    } else if lower.contains("chicken") {
        format!("{} raw", food_name)
    } else if lower.contains("rice") {
        format!("{} cooked", food_name)
    } else {
        food_name.to_string()
    }
}

/// Pick the best candidate from the ranked results.
///
/// Egg searches skip white/yolk variants and prefer "whole"; everything
/// else takes the first hit.
pub fn select_best_match<'a>(foods: &'a [FoodHit], food_name: &str) -> Option<&'a FoodHit> {
    if foods.is_empty() {
        return None;
    }

    let searching_egg = food_name.to_lowercase().contains("egg");
    let mut best: Option<&FoodHit> = None;

    for food in foods {
        let desc = food.description.to_lowercase();
        if searching_egg {
            if desc.contains("white") || desc.contains("yolk") {
                continue;
            }
            if desc.contains("whole") {
                return Some(food);
            }
        }
        if best.is_none() {
            best = Some(food);
        }
    }

    best.or_else(|| foods.first())
}

/// Pull energy/protein/carbohydrate/fat out of the nutrient list.
pub fn extract_nutrition(hit: &FoodHit) -> Nutrition {
    let mut nutrition = Nutrition {
        name: hit.description.clone(),
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fats: 0.0,
    };

    for nutrient in &hit.food_nutrients {
        let name = nutrient.nutrient_name.to_lowercase();
        if name.contains("energy") && name.contains("kcal") {
            nutrition.calories = nutrient.value;
        } else if name.contains("protein") && !name.contains("total lipid") {
            nutrition.protein = nutrient.value;
        } else if name.contains("carbohydrate") && name.contains("by difference") {
            nutrition.carbs = nutrient.value;
        } else if name.contains("total lipid") || name.contains("fat, total") {
            nutrition.fats = nutrient.value;
        }
    }

    nutrition
}

/// Search the nutrition database for one food. Network or parse failures
/// come back as `None` so the caller can mark the ingredient unmatched.
pub async fn search_food(client: &Client, api_key: &str, food_name: &str) -> Option<Nutrition> {
    let query = improve_query(food_name);
    debug!(food_name, query = %query, "searching nutrition database");

    let request = client.get(SEARCH_URL).query(&[
        ("api_key", api_key),
        ("query", query.as_str()),
        ("pageSize", "5"),
        ("dataType", "Foundation,SR Legacy"),
    ]);

    let response = match request.send().await.and_then(|r| r.error_for_status()) {
        Ok(r) => r,
        Err(e) => {
            warn!(food_name, error = %e, "nutrition lookup request failed");
            return None;
        }
    };

    let body: SearchResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            warn!(food_name, error = %e, "nutrition lookup returned unparseable body");
            return None;
        }
    };

    debug!(food_name, results = body.foods.len(), "nutrition database results");
    let best = select_best_match(&body.foods, food_name)?;
    Some(extract_nutrition(best))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(description: &str, nutrients: &[(&str, f64)]) -> FoodHit {
        FoodHit {
            description: description.to_string(),
            food_nutrients: nutrients
                .iter()
                .map(|(name, value)| FoodNutrient {
                    nutrient_name: name.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn query_rewriting_rules() {
        assert_eq!(improve_query("eggs"), "egg whole raw");
        assert_eq!(improve_query("egg white"), "egg white");
        assert_eq!(improve_query("chicken breast"), "chicken breast raw");
        assert_eq!(improve_query("rice"), "rice cooked");
        assert_eq!(improve_query("oats"), "oats");
    }

    #[test]
    fn egg_search_skips_whites_and_yolks() {
        let foods = vec![
            hit("Egg, white, raw", &[]),
            hit("Egg, yolk, raw", &[]),
            hit("Egg, whole, raw, fresh", &[]),
        ];
        let best = select_best_match(&foods, "eggs").unwrap();
        assert_eq!(best.description, "Egg, whole, raw, fresh");
    }

    #[test]
    fn egg_search_falls_back_to_first_when_all_are_variants() {
        let foods = vec![hit("Egg, white, raw", &[]), hit("Egg, yolk, raw", &[])];
        let best = select_best_match(&foods, "eggs").unwrap();
        assert_eq!(best.description, "Egg, white, raw");
    }

    #[test]
    fn non_egg_search_takes_first_hit() {
        let foods = vec![hit("Oats, raw", &[]), hit("Oats, cooked", &[])];
        let best = select_best_match(&foods, "oats").unwrap();
        assert_eq!(best.description, "Oats, raw");
    }

    #[test]
    fn nutrient_extraction_matches_names() {
        let food = hit(
            "Egg, whole, raw, fresh",
            &[
                ("Energy (kcal)", 143.0),
                ("Energy (kJ)", 599.0),
                ("Protein", 12.6),
                ("Carbohydrate, by difference", 0.7),
                ("Total lipid (fat)", 9.5),
            ],
        );
        let nutrition = extract_nutrition(&food);
        assert_eq!(nutrition.calories, 143.0);
        assert_eq!(nutrition.protein, 12.6);
        assert_eq!(nutrition.carbs, 0.7);
        assert_eq!(nutrition.fats, 9.5);
        assert_eq!(nutrition.name, "Egg, whole, raw, fresh");
    }

    #[test]
    fn missing_nutrients_default_to_zero() {
        let nutrition = extract_nutrition(&hit("Water", &[]));
        assert_eq!(nutrition.calories, 0.0);
        assert_eq!(nutrition.fats, 0.0);
    }
}
