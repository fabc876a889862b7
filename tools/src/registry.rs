//! Tool registry: static catalog of declarations plus name-based dispatch.
//!
//! Lookup goes through an enumerated tag, not reflection; the table is
//! fixed at startup. `dispatch` never fails outright: unknown names and
//! broken arguments come back as structured error records so the
//! orchestration loop can relay them to the model.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::context::ToolContext;
use crate::{body, export, integrations, nutrition, routes, tracker, vision, workout};
use fitcoach_core::types::ToolDeclaration;

/// Enumerated tag for every tool in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    CalculateBmi,
    EstimateBodyFat,
    TrackMeasurements,
    VisualizeTransformation,
    CalculateTdee,
    GenerateMealPlan,
    TrackCalories,
    AnalyzeFridge,
    SuggestMealFromFridge,
    GenerateWorkoutPlan,
    AnalyzeWorkoutProgress,
    GenerateRunningRoutes,
    FindNearbyGyms,
    ImportStravaData,
    ImportHevyWorkout,
    ExportMealPlanPdf,
    ExportWorkoutPlanPdf,
    ExportProgressReportExcel,
}

impl ToolName {
    /// Resolve a wire name. `None` for unknown tools; never panics.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "calculate_bmi" => Self::CalculateBmi,
            "estimate_body_fat" => Self::EstimateBodyFat,
            "track_measurements" => Self::TrackMeasurements,
            "visualize_transformation" => Self::VisualizeTransformation,
            "calculate_tdee" => Self::CalculateTdee,
            "generate_meal_plan" => Self::GenerateMealPlan,
            "track_calories" => Self::TrackCalories,
            "analyze_fridge" => Self::AnalyzeFridge,
            "suggest_meal_from_fridge" => Self::SuggestMealFromFridge,
            "generate_workout_plan" => Self::GenerateWorkoutPlan,
            "analyze_workout_progress" => Self::AnalyzeWorkoutProgress,
            "generate_running_routes" => Self::GenerateRunningRoutes,
            "find_nearby_gyms" => Self::FindNearbyGyms,
            "import_strava_data" => Self::ImportStravaData,
            "import_hevy_workout" => Self::ImportHevyWorkout,
            "export_meal_plan_pdf" => Self::ExportMealPlanPdf,
            "export_workout_plan_pdf" => Self::ExportWorkoutPlanPdf,
            "export_progress_report_excel" => Self::ExportProgressReportExcel,
            _ => return None,
        })
    }
}

/// The full declaration catalog, advertised on every first-round request.
pub fn declarations() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration::function(
            "calculate_bmi",
            "Calculate Body Mass Index and provide health classification",
            json!({
                "type": "object",
                "properties": {
                    "weight": {"type": "number", "description": "Weight in kilograms"},
                    "height": {"type": "number", "description": "Height in centimeters"}
                },
                "required": ["weight", "height"]
            }),
        ),
        ToolDeclaration::function(
            "estimate_body_fat",
            "Estimate body fat percentage from a body photo using AI vision analysis",
            json!({
                "type": "object",
                "properties": {
                    "image_path": {"type": "string", "description": "Path to the body image file"}
                },
                "required": ["image_path"]
            }),
        ),
        ToolDeclaration::function(
            "track_measurements",
            "Track body measurements (chest, waist, arms, legs) over time",
            json!({
                "type": "object",
                "properties": {
                    "measurements": {"type": "object", "description": "Body measurements in centimeters"}
                },
                "required": ["measurements"]
            }),
        ),
        ToolDeclaration::function(
            "visualize_transformation",
            "Compare before/after photos and describe the visible transformation",
            json!({
                "type": "object",
                "properties": {
                    "before_photo": {"type": "string", "description": "Path to the before photo"},
                    "after_photo": {"type": "string", "description": "Path to the after photo"}
                },
                "required": ["before_photo", "after_photo"]
            }),
        ),
        ToolDeclaration::function(
            "calculate_tdee",
            "Calculate Total Daily Energy Expenditure based on user's physical characteristics and activity level",
            json!({
                "type": "object",
                "properties": {
                    "weight": {"type": "number", "description": "Weight in kilograms"},
                    "height": {"type": "number", "description": "Height in centimeters"},
                    "age": {"type": "integer", "description": "Age in years"},
                    "gender": {"type": "string", "enum": ["male", "female"]},
                    "activity_level": {
                        "type": "string",
                        "enum": ["sedentary", "light", "moderate", "active", "very_active"],
                        "description": "Activity level: sedentary (little/no exercise), light (1-3 days/week), moderate (3-5 days/week), active (6-7 days/week), very_active (physical job + exercise)"
                    }
                },
                "required": ["weight", "height", "age", "gender", "activity_level"]
            }),
        ),
        ToolDeclaration::function(
            "generate_meal_plan",
            "Generate a personalized meal plan based on calorie target and dietary preferences",
            json!({
                "type": "object",
                "properties": {
                    "calories": {"type": "integer", "description": "Target daily calories"},
                    "diet_preference": {
                        "type": "string",
                        "enum": ["balanced", "keto", "vegan", "vegetarian", "paleo"],
                        "description": "Dietary preference"
                    },
                    "restrictions": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of food restrictions (e.g., dairy, nuts, gluten)"
                    }
                },
                "required": ["calories"]
            }),
        ),
        ToolDeclaration::function(
            "track_calories",
            "Track calories and macros from a meal description",
            json!({
                "type": "object",
                "properties": {
                    "meal_description": {
                        "type": "string",
                        "description": "Description of the meal or food items"
                    }
                },
                "required": ["meal_description"]
            }),
        ),
        ToolDeclaration::function(
            "analyze_fridge",
            "Analyze refrigerator contents from a photo. Identifies all visible food items, estimates quantities, calories, and freshness. Perfect for meal planning based on available ingredients.",
            json!({
                "type": "object",
                "properties": {
                    "image_path": {
                        "type": "string",
                        "description": "Absolute path to the refrigerator photo"
                    },
                    "remaining_calories": {
                        "type": "integer",
                        "description": "Optional - how many calories the user has left for the day. Helps with meal suggestions."
                    }
                },
                "required": ["image_path"]
            }),
        ),
        ToolDeclaration::function(
            "suggest_meal_from_fridge",
            "Suggest a meal recipe based on available fridge contents and remaining calorie budget. Creates practical recipes using only available ingredients.",
            json!({
                "type": "object",
                "properties": {
                    "fridge_contents": {
                        "type": "object",
                        "description": "The result from analyze_fridge() containing food inventory"
                    },
                    "remaining_calories": {
                        "type": "integer",
                        "description": "How many calories the user has left for this meal/day"
                    },
                    "dietary_restrictions": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional list of dietary restrictions (e.g., ['no dairy', 'vegetarian', 'gluten-free'])"
                    },
                    "meal_type": {
                        "type": "string",
                        "enum": ["breakfast", "lunch", "dinner", "snack"],
                        "description": "Optional - type of meal to suggest"
                    }
                },
                "required": ["fridge_contents", "remaining_calories"]
            }),
        ),
        ToolDeclaration::function(
            "generate_workout_plan",
            "Generate a personalized workout plan based on goals, experience level, and available equipment",
            json!({
                "type": "object",
                "properties": {
                    "goal": {
                        "type": "string",
                        "enum": ["strength", "hypertrophy", "endurance", "weight_loss", "general_fitness"],
                        "description": "Primary training goal"
                    },
                    "experience": {
                        "type": "string",
                        "enum": ["beginner", "intermediate", "advanced"],
                        "description": "Training experience level"
                    },
                    "days_per_week": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 7,
                        "description": "Number of training days per week"
                    },
                    "equipment": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Available equipment (e.g., barbell, dumbbells, machines, bodyweight)"
                    }
                },
                "required": ["goal", "experience", "days_per_week"]
            }),
        ),
        ToolDeclaration::function(
            "analyze_workout_progress",
            "Analyze workout progress and provide insights on strength gains and volume trends",
            json!({
                "type": "object",
                "properties": {
                    "workout_history": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "List of workout sessions with exercises, sets, reps, and weights"
                    }
                },
                "required": ["workout_history"]
            }),
        ),
        ToolDeclaration::function(
            "generate_running_routes",
            "Generate running route options based on location, distance, and terrain preferences",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Starting location (address, landmark, or city)"
                    },
                    "distance": {
                        "type": "number",
                        "description": "Desired distance in kilometers"
                    },
                    "terrain_preference": {
                        "type": "string",
                        "enum": ["park", "street", "trail", "track"],
                        "description": "Preferred terrain type"
                    }
                },
                "required": ["location", "distance"]
            }),
        ),
        ToolDeclaration::function(
            "find_nearby_gyms",
            "Find gyms and fitness centers near a location",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Search location (address, landmark, or city)"
                    },
                    "radius": {
                        "type": "number",
                        "description": "Search radius in kilometers (default: 5km)"
                    }
                },
                "required": ["location"]
            }),
        ),
        ToolDeclaration::function(
            "import_strava_data",
            "Import running and cycling activities from Strava",
            json!({
                "type": "object",
                "properties": {
                    "auth_token": {
                        "type": "string",
                        "description": "Strava API authentication token"
                    }
                },
                "required": ["auth_token"]
            }),
        ),
        ToolDeclaration::function(
            "import_hevy_workout",
            "Import workout history from Hevy app CSV export",
            json!({
                "type": "object",
                "properties": {
                    "csv_file": {
                        "type": "string",
                        "description": "Path to Hevy CSV export file"
                    }
                },
                "required": ["csv_file"]
            }),
        ),
        ToolDeclaration::function(
            "export_meal_plan_pdf",
            "Export a meal plan to a formatted PDF document",
            json!({
                "type": "object",
                "properties": {
                    "meal_plan_data": {"type": "object", "description": "Meal plan data to export"},
                    "filename": {"type": "string", "description": "Optional custom filename for the PDF"}
                },
                "required": ["meal_plan_data"]
            }),
        ),
        ToolDeclaration::function(
            "export_workout_plan_pdf",
            "Export a workout plan to a formatted PDF document",
            json!({
                "type": "object",
                "properties": {
                    "workout_data": {"type": "object", "description": "Workout plan data to export"},
                    "filename": {"type": "string", "description": "Optional custom filename for the PDF"}
                },
                "required": ["workout_data"]
            }),
        ),
        ToolDeclaration::function(
            "export_progress_report_excel",
            "Export a comprehensive progress report to Excel with charts and statistics",
            json!({
                "type": "object",
                "properties": {
                    "user_data": {"type": "object", "description": "User's progress data"},
                    "date_range": {"type": "object", "description": "Start and end dates for the report"},
                    "filename": {"type": "string", "description": "Optional custom filename for the Excel file"}
                },
                "required": ["user_data", "date_range"]
            }),
        ),
    ]
}

// Argument shapes decoded from the model's JSON blobs

#[derive(Deserialize)]
struct BmiArgs {
    weight: f64,
    height: f64,
}

#[derive(Deserialize)]
struct TdeeArgs {
    weight: f64,
    height: f64,
    age: i64,
    gender: String,
    activity_level: String,
}

#[derive(Deserialize)]
struct MealPlanArgs {
    calories: i64,
    #[serde(default = "default_diet")]
    diet_preference: String,
    #[serde(default)]
    restrictions: Vec<String>,
}

fn default_diet() -> String {
    "balanced".to_string()
}

#[derive(Deserialize)]
struct TrackCaloriesArgs {
    meal_description: String,
}

#[derive(Deserialize)]
struct ImagePathArgs {
    image_path: String,
}

#[derive(Deserialize)]
struct FridgeArgs {
    image_path: String,
    #[serde(default)]
    remaining_calories: Option<i64>,
}

#[derive(Deserialize)]
struct SuggestMealArgs {
    fridge_contents: Value,
    remaining_calories: i64,
    #[serde(default)]
    dietary_restrictions: Vec<String>,
    #[serde(default)]
    meal_type: Option<String>,
}

#[derive(Deserialize)]
struct MeasurementsArgs {
    measurements: Value,
}

#[derive(Deserialize)]
struct TransformationArgs {
    before_photo: String,
    after_photo: String,
}

#[derive(Deserialize)]
struct WorkoutPlanArgs {
    goal: String,
    experience: String,
    days_per_week: i64,
    #[serde(default)]
    equipment: Vec<String>,
}

#[derive(Deserialize)]
struct WorkoutProgressArgs {
    workout_history: Value,
}

#[derive(Deserialize)]
struct RoutesArgs {
    location: String,
    distance: f64,
    #[serde(default)]
    terrain_preference: Option<String>,
}

#[derive(Deserialize)]
struct GymsArgs {
    location: String,
    #[serde(default = "default_radius")]
    radius: f64,
}

fn default_radius() -> f64 {
    5.0
}

#[derive(Deserialize)]
struct StravaArgs {
    auth_token: String,
}

#[derive(Deserialize)]
struct HevyArgs {
    csv_file: String,
}

#[derive(Deserialize)]
struct ExportMealPlanArgs {
    meal_plan_data: Value,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Deserialize)]
struct ExportWorkoutArgs {
    workout_data: Value,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Deserialize)]
struct ExportProgressArgs {
    user_data: Value,
    date_range: Value,
    #[serde(default)]
    filename: Option<String>,
}

/// Registry tying tool names to their implementations
#[derive(Clone)]
pub struct ToolRegistry {
    ctx: ToolContext,
}

impl ToolRegistry {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Invoke a tool by wire name with a decoded argument object.
    ///
    /// Always returns a result record: unknown names and argument/
    /// implementation failures are structured errors, never panics or Errs.
    pub async fn dispatch(&self, name: &str, args: Value) -> Value {
        let Some(tool) = ToolName::from_name(name) else {
            warn!(tool = name, "model requested an unregistered tool");
            return json!({
                "status": "error",
                "message": format!("Tool {} not found", name)
            });
        };

        debug!(tool = name, "dispatching tool call");
        match self.invoke(tool, args).await {
            Ok(result) => result,
            Err(message) => {
                warn!(tool = name, %message, "tool execution failed");
                json!({
                    "status": "error",
                    "message": format!("Error executing {}: {}", name, message)
                })
            }
        }
    }

    async fn invoke(&self, tool: ToolName, args: Value) -> Result<Value, String> {
        let ctx = &self.ctx;
        let decode_err = |e: serde_json::Error| e.to_string();

        Ok(match tool {
            ToolName::CalculateBmi => {
                let args: BmiArgs = serde_json::from_value(args).map_err(decode_err)?;
                body::calculate_bmi(args.weight, args.height)
            }
            ToolName::EstimateBodyFat => {
                let args: ImagePathArgs = serde_json::from_value(args).map_err(decode_err)?;
                vision::estimate_body_fat(ctx, &args.image_path).await
            }
            ToolName::TrackMeasurements => {
                let args: MeasurementsArgs = serde_json::from_value(args).map_err(decode_err)?;
                body::track_measurements(args.measurements)
            }
            ToolName::VisualizeTransformation => {
                let args: TransformationArgs = serde_json::from_value(args).map_err(decode_err)?;
                vision::visualize_transformation(ctx, &args.before_photo, &args.after_photo).await
            }
            ToolName::CalculateTdee => {
                let args: TdeeArgs = serde_json::from_value(args).map_err(decode_err)?;
                nutrition::calculate_tdee(
                    args.weight,
                    args.height,
                    args.age,
                    &args.gender,
                    &args.activity_level,
                )
            }
            ToolName::GenerateMealPlan => {
                let args: MealPlanArgs = serde_json::from_value(args).map_err(decode_err)?;
                nutrition::generate_meal_plan(args.calories, &args.diet_preference, args.restrictions)
            }
            ToolName::TrackCalories => {
                let args: TrackCaloriesArgs = serde_json::from_value(args).map_err(decode_err)?;
                tracker::track_calories(ctx, &args.meal_description).await
            }
            ToolName::AnalyzeFridge => {
                let args: FridgeArgs = serde_json::from_value(args).map_err(decode_err)?;
                vision::analyze_fridge(ctx, &args.image_path, args.remaining_calories).await
            }
            ToolName::SuggestMealFromFridge => {
                let args: SuggestMealArgs = serde_json::from_value(args).map_err(decode_err)?;
                vision::suggest_meal_from_fridge(
                    ctx,
                    &args.fridge_contents,
                    args.remaining_calories,
                    args.dietary_restrictions,
                    args.meal_type,
                )
                .await
            }
            ToolName::GenerateWorkoutPlan => {
                let args: WorkoutPlanArgs = serde_json::from_value(args).map_err(decode_err)?;
                workout::generate_workout_plan(
                    &args.goal,
                    &args.experience,
                    args.days_per_week,
                    args.equipment,
                )
            }
            ToolName::AnalyzeWorkoutProgress => {
                let args: WorkoutProgressArgs = serde_json::from_value(args).map_err(decode_err)?;
                workout::analyze_workout_progress(args.workout_history)
            }
            ToolName::GenerateRunningRoutes => {
                let args: RoutesArgs = serde_json::from_value(args).map_err(decode_err)?;
                routes::generate_running_routes(&args.location, args.distance, args.terrain_preference)
            }
            ToolName::FindNearbyGyms => {
                let args: GymsArgs = serde_json::from_value(args).map_err(decode_err)?;
                routes::find_nearby_gyms(&args.location, args.radius)
            }
            ToolName::ImportStravaData => {
                let args: StravaArgs = serde_json::from_value(args).map_err(decode_err)?;
                integrations::import_strava_data(&args.auth_token)
            }
            ToolName::ImportHevyWorkout => {
                let args: HevyArgs = serde_json::from_value(args).map_err(decode_err)?;
                integrations::import_hevy_workout(&args.csv_file)
            }
            ToolName::ExportMealPlanPdf => {
                let args: ExportMealPlanArgs = serde_json::from_value(args).map_err(decode_err)?;
                json!({"file_path": export::export_meal_plan_pdf(args.meal_plan_data, args.filename)})
            }
            ToolName::ExportWorkoutPlanPdf => {
                let args: ExportWorkoutArgs = serde_json::from_value(args).map_err(decode_err)?;
                json!({"file_path": export::export_workout_plan_pdf(args.workout_data, args.filename)})
            }
            ToolName::ExportProgressReportExcel => {
                let args: ExportProgressArgs = serde_json::from_value(args).map_err(decode_err)?;
                json!({"file_path": export::export_progress_report_excel(args.user_data, args.date_range, args.filename)})
            }
        })
    }
}
