//! Vision-backed analysis: fridge photos, body composition, transformations.
//!
//! Every function here keeps the same contract: never raise, always return
//! a structured success/failure record, even when the model's "pure JSON"
//! reply is anything but.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::context::ToolContext;
use crate::repair::{recover_json, Recovered};
use fitcoach_core::types::{ChatMessage, ChatRequest, ContentPart};

fn mime_type_for(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn encode_image(path: &str) -> Result<ContentPart, String> {
    if !Path::new(path).exists() {
        return Err(format!("File does not exist: {}", path));
    }
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    Ok(ContentPart::image_data(mime_type_for(path), &BASE64.encode(bytes)))
}

/// One vision round-trip: prompt + images in a single user turn, tools off.
async fn vision_request(
    ctx: &ToolContext,
    prompt: String,
    images: Vec<ContentPart>,
    temperature: f32,
    max_tokens: u32,
) -> Result<String, String> {
    let mut parts = vec![ContentPart::text(prompt)];
    parts.extend(images);

    let request = ChatRequest {
        model: ctx.config.vision_model().to_string(),
        messages: vec![ChatMessage::user_parts(parts)],
        tools: None,
        tool_choice: None,
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
    };

    let reply = ctx
        .backend
        .complete(request)
        .await
        .map_err(|e| e.to_string())?;
    reply
        .content
        .ok_or_else(|| "Vision model returned no text content".to_string())
}

const FRIDGE_PROMPT: &str = r#"Analyze this refrigerator photo and identify all visible food items.

CRITICAL INSTRUCTIONS:
- Return ONLY raw JSON, no markdown formatting
- Do NOT use ``` code blocks
- Do NOT add any text before or after the JSON
- Output must be pure, valid JSON only

For each food item, provide:
1. Food name
2. Estimated quantity (e.g., "3 eggs", "500ml milk", "1 pack chicken breast")
3. Estimated calories per serving (numeric value only)
4. Food category (protein/carbs/fats/vegetables/dairy/fruits/other)
5. Freshness estimate (fresh/consume_soon/check_expiry)

Also provide:
- Overall inventory assessment
- Any missing staples

Return your response as pure JSON with this EXACT structure:
{
    "foods": [
        {
            "name": "Eggs",
            "quantity": "6 eggs",
            "calories_per_serving": 70,
            "category": "protein",
            "freshness": "fresh"
        }
    ],
    "inventory_summary": {
        "total_items": 0,
        "proteins": 0,
        "carbs": 0,
        "vegetables": 0,
        "dairy": 0
    },
    "meal_potential": [],
    "missing_staples": [],
    "notes": ""
}

REMEMBER: Output must be pure JSON only, no markdown, no code blocks, no formatting."#;

/// Analyze fridge contents from a photo.
pub async fn analyze_fridge(ctx: &ToolContext, image_path: &str, remaining_calories: Option<i64>) -> Value {
    info!(image_path, "analyzing fridge photo");

    let image = match encode_image(image_path) {
        Ok(part) => part,
        Err(message) => {
            warn!(image_path, %message, "fridge photo unavailable");
            return json!({
                "success": false,
                "error": "Image file not found",
                "foods": [],
                "notes": message
            });
        }
    };

    let mut prompt = FRIDGE_PROMPT.to_string();
    if let Some(calories) = remaining_calories {
        prompt.push_str(&format!(
            "\n\nIMPORTANT: The user has {} calories remaining for today. Keep this in mind for meal suggestions.",
            calories
        ));
    }

    let reply = match vision_request(ctx, prompt, vec![image], 0.3, 2000).await {
        Ok(text) => text,
        Err(message) => {
            return json!({
                "success": false,
                "error": message,
                "foods": [],
                "notes": "Analysis failed"
            });
        }
    };

    match recover_json(&reply) {
        Recovered::Object(analysis) => {
            debug!(
                foods = analysis["foods"].as_array().map_or(0, |f| f.len()),
                "fridge analysis parsed"
            );
            json!({
                "success": true,
                "foods": analysis.get("foods").cloned().unwrap_or_else(|| json!([])),
                "inventory_summary": analysis.get("inventory_summary").cloned().unwrap_or_else(|| json!({})),
                "meal_potential": analysis.get("meal_potential").cloned().unwrap_or_else(|| json!([])),
                "missing_staples": analysis.get("missing_staples").cloned().unwrap_or_else(|| json!([])),
                "notes": analysis.get("notes").cloned().unwrap_or_else(|| json!("")),
                "remaining_calories": remaining_calories,
                "timestamp": Utc::now().to_rfc3339()
            })
        }
        Recovered::FoodsOnly(foods) => json!({
            "success": true,
            "foods": foods,
            "inventory_summary": {},
            "meal_potential": [],
            "missing_staples": [],
            "notes": "Partial data recovered from incomplete response",
            "remaining_calories": remaining_calories,
            "timestamp": Utc::now().to_rfc3339()
        }),
        Recovered::Failed { raw, error } => json!({
            "success": false,
            "raw_analysis": raw,
            "foods": [],
            "notes": format!("JSON parsing failed: {}. Please try again or use a clearer photo.", error),
            "remaining_calories": remaining_calories,
            "timestamp": Utc::now().to_rfc3339()
        }),
    }
}

const BODY_FAT_PROMPT: &str = r#"Estimate the body fat percentage of the person in this photo.

Return ONLY raw JSON, no markdown, no code blocks, with this EXACT structure:
{
    "body_fat_percentage": 0,
    "confidence": 0,
    "assessment": "",
    "notes": ""
}

body_fat_percentage is a number, confidence is 0-100. Output must be pure JSON only."#;

/// Estimate body fat percentage from a body photo.
pub async fn estimate_body_fat(ctx: &ToolContext, image_path: &str) -> Value {
    info!(image_path, "estimating body fat from photo");

    let image = match encode_image(image_path) {
        Ok(part) => part,
        Err(message) => {
            return json!({
                "body_fat_percentage": null,
                "confidence": 0,
                "success": false,
                "notes": message
            });
        }
    };

    let reply = match vision_request(ctx, BODY_FAT_PROMPT.to_string(), vec![image], 0.3, 500).await {
        Ok(text) => text,
        Err(message) => {
            return json!({
                "body_fat_percentage": null,
                "confidence": 0,
                "success": false,
                "notes": format!("Analysis failed: {}", message)
            });
        }
    };

    match recover_json(&reply) {
        Recovered::Object(analysis) => json!({
            "body_fat_percentage": analysis.get("body_fat_percentage").cloned().unwrap_or(Value::Null),
            "confidence": analysis.get("confidence").cloned().unwrap_or(json!(0)),
            "assessment": analysis.get("assessment").cloned().unwrap_or(json!("")),
            "notes": analysis.get("notes").cloned().unwrap_or(json!("")),
            "success": true
        }),
        Recovered::FoodsOnly(_) | Recovered::Failed { .. } => json!({
            "body_fat_percentage": null,
            "confidence": 0,
            "success": false,
            "raw_analysis": reply,
            "notes": "Could not parse the analysis response"
        }),
    }
}

const TRANSFORMATION_PROMPT: &str = r#"Compare these two photos (before, then after) of the same person's fitness transformation.

Return ONLY raw JSON, no markdown, no code blocks, with this EXACT structure:
{
    "visual_changes": [],
    "estimated_fat_loss": "",
    "estimated_muscle_gain": "",
    "summary": ""
}

visual_changes is a list of short strings. Output must be pure JSON only."#;

/// Compare before/after photos of a transformation.
pub async fn visualize_transformation(ctx: &ToolContext, before_photo: &str, after_photo: &str) -> Value {
    info!(before_photo, after_photo, "comparing transformation photos");

    let images = match (encode_image(before_photo), encode_image(after_photo)) {
        (Ok(before), Ok(after)) => vec![before, after],
        (Err(message), _) | (_, Err(message)) => {
            return json!({
                "comparison_created": false,
                "visual_changes": [],
                "notes": message
            });
        }
    };

    let reply = match vision_request(ctx, TRANSFORMATION_PROMPT.to_string(), images, 0.3, 800).await {
        Ok(text) => text,
        Err(message) => {
            return json!({
                "comparison_created": false,
                "visual_changes": [],
                "notes": format!("Analysis failed: {}", message)
            });
        }
    };

    match recover_json(&reply) {
        Recovered::Object(analysis) => json!({
            "comparison_created": true,
            "visual_changes": analysis.get("visual_changes").cloned().unwrap_or_else(|| json!([])),
            "estimated_fat_loss": analysis.get("estimated_fat_loss").cloned().unwrap_or(json!("")),
            "estimated_muscle_gain": analysis.get("estimated_muscle_gain").cloned().unwrap_or(json!("")),
            "summary": analysis.get("summary").cloned().unwrap_or(json!("")),
        }),
        Recovered::FoodsOnly(_) | Recovered::Failed { .. } => json!({
            "comparison_created": false,
            "visual_changes": [],
            "raw_analysis": reply,
            "notes": "Could not parse the comparison response"
        }),
    }
}

/// Suggest a meal from analyzed fridge contents within a calorie budget.
pub async fn suggest_meal_from_fridge(
    ctx: &ToolContext,
    fridge_contents: &Value,
    remaining_calories: i64,
    dietary_restrictions: Vec<String>,
    meal_type: Option<String>,
) -> Value {
    info!(remaining_calories, "suggesting a meal from the fridge");

    let foods = match fridge_contents.get("foods").and_then(|f| f.as_array()) {
        Some(foods) if !foods.is_empty() => foods.clone(),
        _ => {
            return json!({
                "success": false,
                "error": "No foods available in fridge",
                "suggestion": "Please analyze your fridge first or go shopping!"
            });
        }
    };

    let food_list = foods
        .iter()
        .map(|food| {
            format!(
                "- {}: {} ({})",
                food["name"].as_str().unwrap_or("unknown"),
                food["quantity"].as_str().unwrap_or("?"),
                food["category"].as_str().unwrap_or("other")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut constraints = vec![format!("Maximum {} calories", remaining_calories)];
    if !dietary_restrictions.is_empty() {
        constraints.push(format!(
            "Dietary restrictions: {}",
            dietary_restrictions.join(", ")
        ));
    }
    if let Some(meal_type) = &meal_type {
        constraints.push(format!("Meal type: {}", meal_type));
    }

    let prompt = format!(
        r#"Create a meal suggestion using ONLY these available ingredients:

{}

Constraints:
{}

Provide:
1. Meal name
2. Ingredients with exact quantities to use
3. Step-by-step cooking instructions
4. Total calories
5. Macros breakdown (protein, carbs, fats in grams)
6. Estimated prep time

Format as JSON:
{{
    "meal_name": "<creative name>",
    "ingredients": [
        {{"item": "<name>", "amount": "<quantity>", "calories": <number>}}
    ],
    "instructions": ["<step 1>", "<step 2>"],
    "total_calories": <number>,
    "macros": {{
        "protein_g": <number>,
        "carbs_g": <number>,
        "fats_g": <number>
    }},
    "prep_time_minutes": <number>,
    "tips": "<cooking tips>"
}}

REMEMBER: Output must be pure JSON only, no markdown, no code blocks, no formatting."#,
        food_list,
        constraints.join("\n")
    );

    let request = ChatRequest {
        model: ctx.config.model().to_string(),
        messages: vec![
            ChatMessage::system(
                "You are a creative nutrition chef who creates delicious, healthy meals from \
                 available ingredients while respecting calorie budgets and dietary restrictions.",
            ),
            ChatMessage::user(prompt),
        ],
        tools: None,
        tool_choice: None,
        temperature: Some(0.8),
        max_tokens: Some(800),
    };

    let reply = match ctx.backend.complete(request).await {
        Ok(reply) => reply.content.unwrap_or_default(),
        Err(e) => {
            return json!({
                "success": false,
                "error": e.to_string()
            });
        }
    };

    match recover_json(&reply) {
        Recovered::Object(meal) => {
            let total = meal["total_calories"].as_i64().unwrap_or(0);
            json!({
                "success": true,
                "meal": meal,
                "calories_remaining_after": remaining_calories - total,
                "fits_budget": total <= remaining_calories,
                "timestamp": Utc::now().to_rfc3339()
            })
        }
        _ => json!({
            "success": true,
            "raw_suggestion": reply,
            "notes": "Meal suggestion provided (JSON parsing failed)"
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for("/tmp/fridge.png"), "image/png");
        assert_eq!(mime_type_for("/tmp/fridge.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("/tmp/fridge.webp"), "image/webp");
        assert_eq!(mime_type_for("/tmp/fridge"), "image/jpeg");
    }

    #[test]
    fn missing_image_is_an_error_not_a_panic() {
        let err = encode_image("/nonexistent/path/fridge.jpg").unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
