//! External service imports (Strava, Hevy). Placeholder payloads until the
//! real API integrations land.

use serde_json::{json, Value};

pub fn import_strava_data(_auth_token: &str) -> Value {
    json!({
        "activities": [],
        "total_activities": 0,
        "status": "not_implemented"
    })
}

pub fn import_hevy_workout(_csv_file: &str) -> Value {
    json!({
        "workouts": [],
        "exercises": [],
        "date_range": {},
        "status": "not_implemented"
    })
}
