//! Workout planning and progress analysis.
//!
//! Plan generation and progress analytics are external collaborators; these
//! return the agreed placeholder payloads.

use serde_json::{json, Value};

pub fn generate_workout_plan(
    goal: &str,
    experience: &str,
    days_per_week: i64,
    _equipment: Vec<String>,
) -> Value {
    json!({
        "goal": goal,
        "experience": experience,
        "days_per_week": days_per_week,
        "weekly_plan": []
    })
}

pub fn analyze_workout_progress(_workout_history: Value) -> Value {
    json!({
        "total_workouts": 0,
        "volume_trend": "increasing",
        "strength_gains": {},
        "recommendations": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workout_plan_echoes_inputs() {
        let plan = generate_workout_plan("strength", "beginner", 3, vec![]);
        assert_eq!(plan["goal"], "strength");
        assert_eq!(plan["days_per_week"], 3);
        assert!(plan["weekly_plan"].as_array().unwrap().is_empty());
    }
}
