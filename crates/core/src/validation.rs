use serde::{Deserialize, Serialize};

use serde_json::{Map, Value};

use crate::domain::attributes::Structured;
use crate::domain::bid_card::BidCard;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self { valid: true, errors: Vec::new() }
    }
}

impl ValidationResult {
    fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.valid = false;
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.valid {
            return Ok(());
        }
        Err(DomainError::ValidationFailed(self.errors))
    }
}

/// Checks a candidate bid card against the required-field rules.
///
/// Errors are collected in a fixed order: required fields (project_type,
/// project_scope, timeline, location), then timeline structure, then location
/// structure.
pub fn validate_bid_card(candidate: &BidCard) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !has_text(candidate.project_type.as_deref()) {
        result.push("Missing required field: project_type");
    }
    if !has_text(candidate.project_scope.as_deref()) {
        result.push("Missing required field: project_scope");
    }
    if candidate.timeline.is_none() {
        result.push("Missing required field: timeline");
    }
    if candidate.location.is_none() {
        result.push("Missing required field: location");
    }

    match &candidate.timeline {
        Some(Structured::Other(_)) => result.push("Timeline must be a dictionary"),
        Some(Structured::Mapping(timeline)) => {
            // A duration alone is enough; without one the start date is mandatory.
            if timeline.duration_weeks.is_none() && !has_text(timeline.start_date.as_deref()) {
                result.push("Timeline missing required field: start_date");
            }
        }
        Some(Structured::Untyped(timeline)) => {
            if !has_key(timeline, "duration_weeks") && !has_entry(timeline, "start_date") {
                result.push("Timeline missing required field: start_date");
            }
        }
        None => {}
    }

    match &candidate.location {
        Some(Structured::Other(_)) => result.push("Location must be a dictionary"),
        Some(Structured::Mapping(location)) => {
            if !has_text(location.city.as_deref()) {
                result.push("Location missing required field: city");
            }
            if !has_text(location.state.as_deref()) {
                result.push("Location missing required field: state");
            }
        }
        Some(Structured::Untyped(location)) => {
            if !has_entry(location, "city") {
                result.push("Location missing required field: city");
            }
            if !has_entry(location, "state") {
                result.push("Location missing required field: state");
            }
        }
        None => {}
    }

    result
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

fn has_key(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|value| !value.is_null())
}

/// Present, non-null, and not a blank string.
fn has_entry(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::String(text)) => has_text(Some(text)),
        Some(value) => !value.is_null(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::validate_bid_card;
    use crate::domain::attributes::Structured;
    use crate::domain::bid_card::{BidCard, Location, Timeline};

    fn complete_card() -> BidCard {
        let mut card = BidCard::blank();
        card.project_type = Some("bathroom remodel".to_string());
        card.project_scope = Some("full gut renovation".to_string());
        card.timeline = Some(Structured::Mapping(Timeline::starting("2025-06-01")));
        card.location = Some(Structured::Mapping(Location::new("Seattle", "WA")));
        card
    }

    #[test]
    fn complete_card_is_valid() {
        let result = validate_bid_card(&complete_card());
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn reports_every_missing_required_field_in_check_order() {
        let result = validate_bid_card(&BidCard::blank());

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Missing required field: project_type",
                "Missing required field: project_scope",
                "Missing required field: timeline",
                "Missing required field: location",
            ]
        );
    }

    #[test]
    fn reports_subset_of_missing_fields_without_extras() {
        let mut card = complete_card();
        card.project_scope = None;
        card.location = None;

        let result = validate_bid_card(&card);
        assert_eq!(
            result.errors,
            vec!["Missing required field: project_scope", "Missing required field: location"]
        );
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let mut card = complete_card();
        card.project_type = Some("   ".to_string());

        let result = validate_bid_card(&card);
        assert_eq!(result.errors, vec!["Missing required field: project_type"]);
    }

    #[test]
    fn duration_alone_satisfies_timeline() {
        let mut card = complete_card();
        card.timeline = Some(Structured::Mapping(Timeline::lasting(3)));

        assert!(validate_bid_card(&card).valid);
    }

    #[test]
    fn empty_timeline_requires_start_date() {
        let mut card = complete_card();
        card.timeline = Some(Structured::Mapping(Timeline::default()));

        let result = validate_bid_card(&card);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Timeline missing required field: start_date"]);
    }

    #[test]
    fn location_requires_city_and_state() {
        let mut card = complete_card();
        card.location = Some(Structured::Mapping(Location {
            city: Some("Seattle".to_string()),
            ..Location::default()
        }));

        let result = validate_bid_card(&card);
        assert_eq!(result.errors, vec!["Location missing required field: state"]);

        card.location = Some(Structured::Mapping(Location::new("Seattle", "WA")));
        assert!(validate_bid_card(&card).valid);
    }

    #[test]
    fn empty_location_reports_both_fields() {
        let mut card = complete_card();
        card.location = Some(Structured::Mapping(Location::default()));

        let result = validate_bid_card(&card);
        assert_eq!(
            result.errors,
            vec!["Location missing required field: city", "Location missing required field: state"]
        );
    }

    #[test]
    fn non_mapping_structures_skip_nested_checks() {
        let mut card = complete_card();
        card.timeline = Some(Structured::Other(json!("sometime next spring")));
        card.location = Some(Structured::Other(json!("Seattle, WA")));

        let result = validate_bid_card(&card);
        assert_eq!(
            result.errors,
            vec!["Timeline must be a dictionary", "Location must be a dictionary"]
        );
    }

    #[test]
    fn untyped_mappings_are_checked_by_key() {
        let mut card = complete_card();
        card.timeline = Some(Structured::from_value(json!({"duration_weeks": 2.5})));
        card.location = Some(Structured::from_value(json!({"city": "Seattle", "state": 53})));
        assert!(validate_bid_card(&card).valid);

        card.timeline = Some(Structured::from_value(json!({"start_date": 20250601, "notes": [1]})));
        assert!(validate_bid_card(&card).valid);

        card.timeline = Some(Structured::from_value(json!({"start_date": null, "flexible": 1.5})));
        card.location = Some(Structured::from_value(json!({"city": "  ", "zip": 98101})));
        let result = validate_bid_card(&card);
        assert_eq!(
            result.errors,
            vec![
                "Timeline missing required field: start_date",
                "Location missing required field: city",
                "Location missing required field: state",
            ]
        );
    }

    #[test]
    fn validation_result_converts_into_domain_error() {
        let result = validate_bid_card(&BidCard::blank());
        let error = result.into_result().expect_err("blank card is invalid");
        assert!(error.to_string().contains("Missing required field: timeline"));
    }
}
