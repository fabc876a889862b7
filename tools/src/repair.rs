//! Best-effort JSON recovery from free-text model replies.
//!
//! Vision replies are requested as pure JSON but arrive as untrusted text.
//! Recovery is a bounded sequence of named strategies, each independently
//! testable: fence-strip, truncate to the last closing brace, delimiter
//! balancing, and foods-array substring extraction.

use serde_json::Value;
use tracing::debug;

/// Strip a markdown code fence (``` or ```json) wrapping the payload.
pub fn strip_code_fences(text: &str) -> String {
    if let Some(start) = text.find("```json") {
        let body_start = start + 7;
        let body_end = text[body_start..]
            .find("```")
            .map(|i| body_start + i)
            .unwrap_or(text.len());
        return text[body_start..body_end].trim().to_string();
    }
    if let Some(start) = text.find("```") {
        let body_start = start + 3;
        let body_end = text[body_start..]
            .find("```")
            .map(|i| body_start + i)
            .unwrap_or(text.len());
        return text[body_start..body_end].trim().to_string();
    }
    text.trim().to_string()
}

/// Drop trailing garbage after the last complete closing brace.
pub fn truncate_to_last_brace(text: &str) -> &str {
    match text.rfind('}') {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

/// Append the closing brackets/braces the text is short of.
pub fn balance_delimiters(text: &str) -> String {
    let open_braces = text.matches('{').count();
    let close_braces = text.matches('}').count();
    let open_brackets = text.matches('[').count();
    let close_brackets = text.matches(']').count();

    let mut fixed = text.to_string();
    if open_brackets > close_brackets {
        fixed.push_str(&"]".repeat(open_brackets - close_brackets));
    }
    if open_braces > close_braces {
        fixed.push_str(&"}".repeat(open_braces - close_braces));
    }
    fixed
}

/// Extract the array value of `key` by bracket matching, last resort for
/// salvaging a `"foods": [...]` list out of otherwise broken JSON.
pub fn extract_array(text: &str, key: &str) -> Option<Value> {
    let marker = format!("\"{}\"", key);
    let key_pos = text.find(&marker)?;
    let bracket_start = text[key_pos..].find('[').map(|i| key_pos + i)?;

    let mut depth = 0usize;
    for (offset, c) in text[bracket_start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let slice = &text[bracket_start..bracket_start + offset + 1];
                    return serde_json::from_str(slice).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Outcome of the recovery pipeline
#[derive(Debug)]
pub enum Recovered {
    /// Full object parsed, possibly after repair
    Object(Value),
    /// Only the `foods` array could be salvaged
    FoodsOnly(Value),
    /// Nothing parseable; carry the raw text forward
    Failed { raw: String, error: String },
}

/// Run the full recovery pipeline over a model reply.
pub fn recover_json(raw: &str) -> Recovered {
    let stripped = strip_code_fences(raw);
    let truncated = truncate_to_last_brace(&stripped);

    match serde_json::from_str::<Value>(truncated) {
        Ok(value) => return Recovered::Object(value),
        Err(e) => debug!(error = %e, "strict JSON parse failed, attempting repair"),
    }

    let balanced = balance_delimiters(&stripped);
    match serde_json::from_str::<Value>(&balanced) {
        Ok(value) => {
            debug!("recovered JSON by balancing delimiters");
            return Recovered::Object(value);
        }
        Err(e) => debug!(error = %e, "delimiter balancing did not yield valid JSON"),
    }

    if let Some(foods) = extract_array(&stripped, "foods") {
        debug!("recovered foods array from partial JSON");
        return Recovered::FoodsOnly(foods);
    }

    let error = serde_json::from_str::<Value>(truncated)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unparseable response".to_string());
    Recovered::Failed {
        raw: stripped,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy!";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fences_without_closer() {
        let text = "```\n{\"a\": 1}";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn truncates_trailing_garbage() {
        assert_eq!(
            truncate_to_last_brace("{\"a\": 1} and some trailing prose"),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn balances_missing_closers() {
        let broken = "{\"foods\": [{\"name\": \"Eggs\"FOO";
        // Not directly parseable even balanced; use a clean case
        let clean = "{\"foods\": [{\"name\": \"Eggs\"}";
        let fixed = balance_delimiters(clean);
        assert_eq!(fixed, "{\"foods\": [{\"name\": \"Eggs\"}]}");
        assert!(serde_json::from_str::<Value>(&fixed).is_ok());
        assert!(serde_json::from_str::<Value>(&balance_delimiters(broken)).is_err());
    }

    #[test]
    fn recovers_object_missing_n_braces() {
        // Two closing braces and one bracket missing
        let raw = "{\"inventory_summary\": {\"total_items\": 3, \"notes\": \"ok\"";
        match recover_json(raw) {
            Recovered::Object(v) => {
                assert_eq!(v["inventory_summary"]["total_items"], 3);
            }
            other => panic!("expected recovery, got {:?}", other),
        }
    }

    #[test]
    fn extracts_foods_array_when_object_is_hopeless() {
        let raw = r#"{"foods": [{"name": "Milk", "quantity": "1l"}], "inventory_summary": {{{"#;
        match recover_json(raw) {
            Recovered::FoodsOnly(foods) => {
                assert_eq!(foods[0]["name"], "Milk");
            }
            other => panic!("expected foods-only recovery, got {:?}", other),
        }
    }

    #[test]
    fn hopeless_text_falls_back_to_raw() {
        match recover_json("the fridge looks well stocked!") {
            Recovered::Failed { raw, .. } => {
                assert_eq!(raw, "the fridge looks well stocked!");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn fenced_and_truncated_reply_parses_strictly() {
        let raw = "```json\n{\"foods\": []}\n```\nLet me know if you need more";
        match recover_json(raw) {
            Recovered::Object(v) => assert!(v["foods"].as_array().unwrap().is_empty()),
            other => panic!("expected object, got {:?}", other),
        }
    }
}
