//! Body composition metrics: BMI and measurement tracking.

use serde_json::{json, Value};
use tracing::debug;

/// WHO BMI classification bands. Lower bounds are inclusive.
const BMI_BANDS: &[(f64, &str, &str)] = &[
    (16.0, "Severe Thinness", "High"),
    (17.0, "Moderate Thinness", "Moderate"),
    (18.5, "Mild Thinness", "Low"),
    (25.0, "Normal weight", "Minimal"),
    (30.0, "Overweight", "Moderate"),
    (35.0, "Obese Class I", "High"),
    (40.0, "Obese Class II", "Very High"),
    (f64::INFINITY, "Obese Class III", "Extremely High"),
];

fn classify_bmi(bmi: f64) -> (&'static str, &'static str) {
    for &(upper, classification, risk) in BMI_BANDS {
        if bmi < upper {
            return (classification, risk);
        }
    }
    // bmi >= 40.0 lands in the open-ended last band
    let last = BMI_BANDS[BMI_BANDS.len() - 1];
    (last.1, last.2)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Calculate Body Mass Index with WHO classification and health risk.
///
/// Returns a structured error record (never panics) when weight or height
/// is not positive.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Value {
    debug!(weight_kg, height_cm, "calculate_bmi");

    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return json!({
            "status": "error",
            "bmi": null,
            "message": "Weight and height must both be positive values"
        });
    }

    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    let (classification, health_risk) = classify_bmi(bmi);

    json!({
        "bmi": round1(bmi),
        "classification": classification,
        "health_risk": health_risk,
        "healthy_range": "18.5 - 24.9",
        "healthy_weight_range_kg": {
            "min": round1(18.5 * height_m * height_m),
            "max": round1(24.9 * height_m * height_m)
        }
    })
}

/// Track body measurements over time.
///
/// Measurement history lives in an external database; this returns the
/// placeholder shape until that integration lands.
pub fn track_measurements(measurements: Value) -> Value {
    json!({
        "current_measurements": measurements,
        "trends": {},
        "changes": {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bmi_of(value: &Value) -> f64 {
        value["bmi"].as_f64().unwrap()
    }

    #[test]
    fn bmi_formula_matches_reference() {
        let result = calculate_bmi(70.0, 175.0);
        assert_eq!(bmi_of(&result), 22.9);
        assert_eq!(result["classification"], "Normal weight");
        assert_eq!(result["health_risk"], "Minimal");
        assert_eq!(result["healthy_range"], "18.5 - 24.9");
    }

    #[test]
    fn classification_boundaries_are_exact() {
        // Each boundary value belongs to the band above it (inclusive lower bound)
        let cases = [
            (15.9, "Severe Thinness", "High"),
            (16.0, "Moderate Thinness", "Moderate"),
            (17.0, "Mild Thinness", "Low"),
            (18.49999, "Mild Thinness", "Low"),
            (18.5, "Normal weight", "Minimal"),
            (25.0, "Overweight", "Moderate"),
            (30.0, "Obese Class I", "High"),
            (35.0, "Obese Class II", "Very High"),
            (40.0, "Obese Class III", "Extremely High"),
        ];
        for (bmi, classification, risk) in cases {
            let (c, r) = classify_bmi(bmi);
            assert_eq!(c, classification, "bmi {}", bmi);
            assert_eq!(r, risk, "bmi {}", bmi);
        }
    }

    #[test]
    fn bmi_is_monotonic_in_weight_and_height() {
        let lighter = bmi_of(&calculate_bmi(60.0, 175.0));
        let heavier = bmi_of(&calculate_bmi(90.0, 175.0));
        assert!(heavier > lighter);

        let shorter = bmi_of(&calculate_bmi(70.0, 160.0));
        let taller = bmi_of(&calculate_bmi(70.0, 190.0));
        assert!(shorter > taller);
    }

    #[test]
    fn non_positive_inputs_return_error_record() {
        for (w, h) in [(0.0, 170.0), (70.0, 0.0), (-5.0, 170.0)] {
            let result = calculate_bmi(w, h);
            assert_eq!(result["status"], "error");
            assert!(result["bmi"].is_null());
        }
    }

    #[test]
    fn healthy_weight_range_follows_height() {
        let result = calculate_bmi(70.0, 180.0);
        let range = &result["healthy_weight_range_kg"];
        assert_eq!(range["min"].as_f64().unwrap(), 59.9);
        assert_eq!(range["max"].as_f64().unwrap(), 80.7);
    }
}
