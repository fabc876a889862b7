//! Nutrition math: TDEE via Mifflin-St Jeor and template meal plans.

use serde_json::{json, Value};
use tracing::debug;

/// Activity level multipliers applied to BMR
const ACTIVITY_MULTIPLIERS: &[(&str, f64)] = &[
    ("sedentary", 1.2),   // Little/no exercise
    ("light", 1.375),     // Light exercise 1-3 days/week
    ("moderate", 1.55),   // Moderate exercise 3-5 days/week
    ("active", 1.725),    // Hard exercise 6-7 days/week
    ("very_active", 1.9), // Physical job + exercise
];

const DEFAULT_MULTIPLIER: f64 = 1.55;

fn activity_multiplier(level: &str) -> f64 {
    let level = level.to_lowercase();
    ACTIVITY_MULTIPLIERS
        .iter()
        .find(|(name, _)| *name == level)
        .map(|&(_, m)| m)
        // Unrecognized levels fall back to moderate rather than erroring
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// Calculate Total Daily Energy Expenditure.
///
/// BMR via Mifflin-St Jeor: `10*weight + 6.25*height - 5*age + s`
/// (s = 5 for male, -161 for female). The TDEE is derived from the rounded
/// BMR so the reported numbers stay mutually consistent.
pub fn calculate_tdee(
    weight_kg: f64,
    height_cm: f64,
    age: i64,
    gender: &str,
    activity_level: &str,
) -> Value {
    debug!(weight_kg, height_cm, age, gender, activity_level, "calculate_tdee");

    let gender_offset = if matches!(gender.to_lowercase().as_str(), "male" | "m") {
        5.0
    } else {
        -161.0
    };
    let bmr = (10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + gender_offset).round();

    let multiplier = activity_multiplier(activity_level);
    let tdee = bmr * multiplier;

    let maintenance = tdee.round() as i64;
    let weight_loss = (tdee - 500.0).round() as i64; // 500 cal deficit for ~0.5kg/week loss
    let weight_gain = (tdee + 300.0).round() as i64; // 300 cal surplus for lean gain

    json!({
        "bmr": bmr as i64,
        "tdee": maintenance,
        "maintenance_calories": maintenance,
        "weight_loss_calories": weight_loss,
        "weight_gain_calories": weight_gain,
        "activity_multiplier": multiplier
    })
}

/// Macro ratio per diet preference: (protein, carbs, fats)
const MACRO_RATIOS: &[(&str, (f64, f64, f64))] = &[
    ("balanced", (0.30, 0.40, 0.30)),
    ("keto", (0.25, 0.05, 0.70)),
    ("vegan", (0.20, 0.50, 0.30)),
    ("vegetarian", (0.25, 0.45, 0.30)),
    ("paleo", (0.35, 0.30, 0.35)),
];

fn macro_ratios(diet: &str) -> (f64, f64, f64) {
    let diet = diet.to_lowercase();
    MACRO_RATIOS
        .iter()
        .find(|(name, _)| *name == diet)
        .map(|&(_, r)| r)
        .unwrap_or(MACRO_RATIOS[0].1)
}

/// Generate a personalized meal plan from a calorie target.
///
/// `restrictions` are recorded in the output but not filtered against the
/// canned meal templates.
pub fn generate_meal_plan(calories: i64, diet_preference: &str, restrictions: Vec<String>) -> Value {
    debug!(calories, diet_preference, ?restrictions, "generate_meal_plan");

    let (protein, carbs, fats) = macro_ratios(diet_preference);

    // protein and carbs at 4 kcal/g, fats at 9 kcal/g
    let calories_f = calories as f64;
    let protein_grams = (calories_f * protein / 4.0).round() as i64;
    let carbs_grams = (calories_f * carbs / 4.0).round() as i64;
    let fats_grams = (calories_f * fats / 9.0).round() as i64;

    json!({
        "target_calories": calories,
        "diet_preference": diet_preference,
        "macros": {
            "protein_grams": protein_grams,
            "carbs_grams": carbs_grams,
            "fats_grams": fats_grams,
            "protein_percentage": (protein * 100.0).round() as i64,
            "carbs_percentage": (carbs * 100.0).round() as i64,
            "fats_percentage": (fats * 100.0).round() as i64
        },
        "restrictions": restrictions,
        "meals": sample_meals(calories, diet_preference)
    })
}

/// Fixed four-slot meal template: 25/35/30/10 percent of the calorie target.
fn sample_meals(calories: i64, diet: &str) -> Value {
    let calories = calories as f64;
    let breakfast = (calories * 0.25).round() as i64;
    let lunch = (calories * 0.35).round() as i64;
    let dinner = (calories * 0.30).round() as i64;
    let snacks = (calories * 0.10).round() as i64;

    let descriptions: [&str; 4] = match diet.to_lowercase().as_str() {
        "keto" => [
            "Scrambled eggs with bacon and avocado",
            "Caesar salad with chicken and parmesan",
            "Grilled salmon with broccoli and butter",
            "Nuts and cheese",
        ],
        "vegan" => [
            "Oats with banana and peanut butter",
            "Quinoa bowl with chickpeas and vegetables",
            "Tofu stir-fry with brown rice",
            "Fruit and seeds",
        ],
        _ => [
            "Eggs + oats with fruit",
            "Chicken breast + rice + vegetables",
            "Fish + sweet potatoes + salad",
            "Greek yogurt with fruit",
        ],
    };

    json!([
        {"meal": "Breakfast", "calories": breakfast, "description": descriptions[0]},
        {"meal": "Lunch", "calories": lunch, "description": descriptions[1]},
        {"meal": "Dinner", "calories": dinner, "description": descriptions[2]},
        {"meal": "Snacks", "calories": snacks, "description": descriptions[3]}
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tdee_reference_case() {
        // 10*70 + 6.25*175 - 5*25 + 5 = 1673.75, rounds to 1674
        let result = calculate_tdee(70.0, 175.0, 25, "male", "active");
        assert_eq!(result["bmr"], 1674);
        // 1674 * 1.725 = 2887.65 -> 2888
        assert_eq!(result["tdee"], 2888);
        assert_eq!(result["maintenance_calories"], 2888);
        assert_eq!(result["weight_loss_calories"], 2388);
        assert_eq!(result["weight_gain_calories"], 3188);
        assert_eq!(result["activity_multiplier"].as_f64().unwrap(), 1.725);
    }

    #[test]
    fn gender_matching_is_case_insensitive() {
        let male = calculate_tdee(70.0, 175.0, 25, "M", "sedentary");
        let female = calculate_tdee(70.0, 175.0, 25, "Female", "sedentary");
        assert_eq!(male["bmr"], 1674);
        assert_eq!(female["bmr"], 1508); // 1673.75 - 166 = 1507.75
    }

    #[test]
    fn unknown_activity_level_defaults_to_moderate() {
        let result = calculate_tdee(70.0, 175.0, 25, "male", "unknown_value");
        assert_eq!(result["activity_multiplier"].as_f64().unwrap(), 1.55);
    }

    #[test]
    fn multiplier_table_is_complete() {
        for (level, expected) in [
            ("sedentary", 1.2),
            ("light", 1.375),
            ("moderate", 1.55),
            ("ACTIVE", 1.725),
            ("very_active", 1.9),
        ] {
            assert_eq!(activity_multiplier(level), expected, "{}", level);
        }
    }

    #[test]
    fn keto_macros_reference_case() {
        let plan = generate_meal_plan(2000, "keto", vec![]);
        let macros = &plan["macros"];
        assert_eq!(macros["protein_grams"], 125);
        assert_eq!(macros["carbs_grams"], 25);
        assert_eq!(macros["fats_grams"], 156);
        assert_eq!(macros["fats_percentage"], 70);
    }

    #[test]
    fn unknown_diet_falls_back_to_balanced() {
        let plan = generate_meal_plan(2000, "carnivore", vec![]);
        let macros = &plan["macros"];
        assert_eq!(macros["protein_grams"], 150);
        assert_eq!(macros["carbs_grams"], 200);
        assert_eq!(macros["fats_grams"], 67);
    }

    #[test]
    fn restrictions_are_recorded_but_not_filtered() {
        let plan = generate_meal_plan(1800, "balanced", vec!["dairy".to_string()]);
        assert_eq!(plan["restrictions"][0], "dairy");
        // Templates are unchanged by restrictions
        assert_eq!(plan["meals"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn meal_slots_split_the_calorie_target() {
        let plan = generate_meal_plan(2000, "balanced", vec![]);
        let meals = plan["meals"].as_array().unwrap();
        let split: Vec<i64> = meals.iter().map(|m| m["calories"].as_i64().unwrap()).collect();
        assert_eq!(split, vec![500, 700, 600, 200]);
    }
}
