//! Report export stubs. PDF/Excel rendering is an external collaborator;
//! these return the destination paths the real exporters will use.

use chrono::Local;
use serde_json::Value;

fn dated_name(prefix: &str, extension: &str) -> String {
    format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d"), extension)
}

pub fn export_meal_plan_pdf(_meal_plan_data: Value, filename: Option<String>) -> String {
    let filename = filename.unwrap_or_else(|| dated_name("meal_plan", "pdf"));
    format!("data/exports/{}", filename)
}

pub fn export_workout_plan_pdf(_workout_data: Value, filename: Option<String>) -> String {
    let filename = filename.unwrap_or_else(|| dated_name("workout_plan", "pdf"));
    format!("data/exports/{}", filename)
}

pub fn export_progress_report_excel(
    _user_data: Value,
    _date_range: Value,
    filename: Option<String>,
) -> String {
    let filename = filename.unwrap_or_else(|| dated_name("progress_report", "xlsx"));
    format!("data/exports/{}", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_filename_is_respected() {
        let path = export_meal_plan_pdf(json!({}), Some("my_plan.pdf".to_string()));
        assert_eq!(path, "data/exports/my_plan.pdf");
    }

    #[test]
    fn default_filenames_carry_the_date() {
        let path = export_progress_report_excel(json!({}), json!({}), None);
        assert!(path.starts_with("data/exports/progress_report_"));
        assert!(path.ends_with(".xlsx"));
    }
}
