use std::fs;
use std::path::Path;

use instabids_core::domain::bid_card::BidCard;
use instabids_core::validation::validate_bid_card;
use serde_json::Value;

use crate::commands::CommandResult;

/// Runs the validator over a bid card JSON document.
///
/// Exit codes: 0 valid, 1 invalid, 2 unreadable input. Documents may omit
/// `id`, `created_at` and `updated_at`; placeholders are filled in before
/// validation.
pub fn run(path: &Path) -> CommandResult {
    let candidate = match read_candidate(path) {
        Ok(candidate) => candidate,
        Err(message) => return CommandResult::failure("validate", "input", message, 2),
    };

    let result = validate_bid_card(&candidate);
    let exit_code = if result.valid { 0 } else { 1 };
    let output = serde_json::to_string(&result).unwrap_or_else(|error| {
        format!("{{\"valid\":false,\"errors\":[\"serialization failed: {error}\"]}}")
    });
    CommandResult { exit_code, output }
}

fn read_candidate(path: &Path) -> Result<BidCard, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read `{}`: {error}", path.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .map_err(|error| format!("`{}` is not valid JSON: {error}", path.display()))?;
    let Value::Object(fields) = document else {
        return Err(format!("`{}` must contain a JSON object", path.display()));
    };

    let mut merged = match serde_json::to_value(BidCard::blank()) {
        Ok(Value::Object(blank)) => blank,
        _ => return Err("could not build a placeholder bid card".to_string()),
    };
    merged.extend(fields);

    serde_json::from_value(Value::Object(merged))
        .map_err(|error| format!("`{}` is not a bid card: {error}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::run;

    fn write(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("bid_card.json");
        fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn valid_document_exits_zero() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(
            &dir,
            &json!({
                "project_type": "kitchen renovation",
                "project_scope": "replace cabinets",
                "timeline": {"duration_weeks": 4},
                "location": {"city": "Seattle", "state": "WA"}
            })
            .to_string(),
        );

        let result = run(&path);

        assert_eq!(result.exit_code, 0);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload, json!({"valid": true, "errors": []}));
    }

    #[test]
    fn off_shape_timeline_object_is_still_a_mapping() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(
            &dir,
            &json!({
                "project_type": "kitchen renovation",
                "project_scope": "replace cabinets",
                "timeline": {"duration_weeks": 2.5, "notes": null},
                "location": {"city": "Seattle", "state": "WA"}
            })
            .to_string(),
        );

        let result = run(&path);

        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
    }

    #[test]
    fn invalid_document_lists_every_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(
            &dir,
            &json!({
                "project_scope": "replace cabinets",
                "timeline": "next month",
                "location": {"city": "Seattle"}
            })
            .to_string(),
        );

        let result = run(&path);

        assert_eq!(result.exit_code, 1);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(
            payload["errors"],
            json!([
                "Missing required field: project_type",
                "Timeline must be a dictionary",
                "Location missing required field: state"
            ])
        );
    }

    #[test]
    fn unreadable_input_exits_two() {
        let dir = TempDir::new().expect("tempdir");

        let missing = run(&dir.path().join("absent.json"));
        assert_eq!(missing.exit_code, 2);

        let path = write(&dir, "[1, 2, 3]");
        let not_object = run(&path);
        assert_eq!(not_object.exit_code, 2);
        let payload: Value = serde_json::from_str(&not_object.output).expect("json");
        assert_eq!(payload["command"], json!("validate"));
        assert_eq!(payload["error_class"], json!("input"));
    }
}
