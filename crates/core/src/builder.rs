use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::attributes::{Attributes, Structured};
use crate::domain::bid_card::{BidCard, BudgetRange, Location, Timeline};
use crate::errors::BidCardError;

/// Slot values gathered by the conversational agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidCardRequest {
    pub project_name: Option<String>,
    pub project_type: Option<String>,
    pub project_scope: Option<String>,
    pub timeline: Option<Structured<Timeline>>,
    pub location: Option<Structured<Location>>,
    pub budget_range: Option<BudgetRange>,
    pub materials_preferences: Option<Attributes>,
    pub special_requirements: Option<String>,
    pub accessibility_needs: Option<Attributes>,
    pub scheduling_constraints: Option<Attributes>,
    pub photo_urls: Option<Vec<String>>,
    pub image_analysis_results: Option<Attributes>,
}

impl BidCardRequest {
    pub fn new(
        project_type: impl Into<String>,
        project_scope: impl Into<String>,
        timeline: Timeline,
        location: Location,
    ) -> Self {
        Self {
            project_type: Some(project_type.into()),
            project_scope: Some(project_scope.into()),
            timeline: Some(timeline.into()),
            location: Some(location.into()),
            ..Self::default()
        }
    }
}

/// Fails on the first required slot that is absent or empty.
pub fn check_required_inputs(request: &BidCardRequest) -> Result<(), BidCardError> {
    if text(&request.project_type).is_none() {
        return Err(BidCardError::Input("Project type is required".to_string()));
    }
    if text(&request.project_scope).is_none() {
        return Err(BidCardError::Input("Project scope is required".to_string()));
    }
    if request.timeline.as_ref().map_or(true, |timeline| is_blank(timeline, Timeline::is_empty)) {
        return Err(BidCardError::Input("Timeline information is required".to_string()));
    }
    if request.location.as_ref().map_or(true, |location| is_blank(location, Location::is_empty)) {
        return Err(BidCardError::Input("Location information is required".to_string()));
    }
    Ok(())
}

/// Non-mapping values only count as blank when they carry nothing; the validator
/// reports their shape.
fn is_blank<T>(value: &Structured<T>, is_empty: impl Fn(&T) -> bool) -> bool {
    match value {
        Structured::Mapping(mapping) => is_empty(mapping),
        Structured::Untyped(map) => map.is_empty(),
        Structured::Other(Value::String(text)) => text.trim().is_empty(),
        Structured::Other(Value::Array(items)) => items.is_empty(),
        Structured::Other(other) => other.is_null(),
    }
}

/// Produces an unsaved draft for the homeowner to confirm.
///
/// The draft is not validated here; committing it goes through
/// [`crate::service::BidCardService::create`].
pub fn build_draft(request: BidCardRequest) -> Result<BidCard, BidCardError> {
    check_required_inputs(&request)?;
    Ok(assemble(request))
}

pub(crate) fn assemble(request: BidCardRequest) -> BidCard {
    let mut card = BidCard::blank();

    card.project_name = text(&request.project_name);
    card.project_type = request.project_type;
    card.project_scope = request.project_scope;
    card.timeline = request.timeline;
    card.location = request.location;

    card.budget_range =
        request.budget_range.filter(|budget| !budget.is_empty()).map(Structured::Mapping);
    card.materials_preferences = mapping(request.materials_preferences);
    card.special_requirements = text(&request.special_requirements);
    card.accessibility_needs = mapping(request.accessibility_needs);
    card.scheduling_constraints = mapping(request.scheduling_constraints);
    card.photo_urls = request.photo_urls.filter(|urls| !urls.is_empty());
    card.image_analysis_results = mapping(request.image_analysis_results);

    card
}

fn text(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|value| !value.trim().is_empty()).cloned()
}

fn mapping(value: Option<Attributes>) -> Option<Structured<Attributes>> {
    value.filter(|attributes| !attributes.is_empty()).map(Structured::Mapping)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_draft, BidCardRequest};
    use crate::domain::attributes::{AttributeValue, Attributes, Structured};
    use crate::domain::bid_card::{BidCardStatus, Location, Timeline};

    fn seattle_bathroom() -> BidCardRequest {
        BidCardRequest::new(
            "bathroom remodel",
            "full gut renovation",
            Timeline::starting("2025-06-01"),
            Location::new("Seattle", "WA"),
        )
    }

    #[test]
    fn builds_draft_with_generated_identity() {
        let card = build_draft(seattle_bathroom()).expect("draft builds");

        assert!(!card.id.0.is_empty());
        assert_eq!(card.status, BidCardStatus::Draft);
        assert_eq!(card.project_type.as_deref(), Some("bathroom remodel"));
        assert_eq!(card.project_scope.as_deref(), Some("full gut renovation"));
        assert_eq!(card.timeline, Some(Structured::Mapping(Timeline::starting("2025-06-01"))));
        assert_eq!(card.location, Some(Structured::Mapping(Location::new("Seattle", "WA"))));
        assert_eq!(card.created_at, card.updated_at);
    }

    #[test]
    fn omitted_optional_fields_are_absent_from_serialized_draft() {
        let card = build_draft(seattle_bathroom()).expect("draft builds");
        let value = serde_json::to_value(&card).expect("draft serializes");
        let object = value.as_object().expect("draft is an object");

        for field in [
            "budget_range",
            "materials_preferences",
            "special_requirements",
            "accessibility_needs",
            "scheduling_constraints",
            "photo_urls",
            "image_analysis_results",
        ] {
            assert!(!object.contains_key(field), "{field} should be absent");
        }
    }

    #[test]
    fn copies_supplied_optional_fields_and_drops_empty_ones() {
        let mut request = seattle_bathroom();
        request.special_requirements = Some("wheelchair access".to_string());
        request.photo_urls = Some(vec!["https://img.example/1.jpg".to_string()]);
        request.materials_preferences =
            Some(Attributes::from([("tile".to_string(), AttributeValue::from("porcelain"))]));
        request.accessibility_needs = Some(Attributes::new());
        request.scheduling_constraints = None;

        let card = build_draft(request).expect("draft builds");

        assert_eq!(card.special_requirements.as_deref(), Some("wheelchair access"));
        assert_eq!(card.photo_urls.as_ref().map(Vec::len), Some(1));
        assert!(card.materials_preferences.is_some());
        assert!(card.accessibility_needs.is_none());
    }

    #[test]
    fn checks_required_inputs_in_fixed_order() {
        let mut request = BidCardRequest::default();
        let message = |request: &BidCardRequest| {
            build_draft(request.clone()).expect_err("incomplete request").to_string()
        };

        assert_eq!(message(&request), "Project type is required");
        request.project_type = Some("deck building".to_string());
        assert_eq!(message(&request), "Project scope is required");
        request.project_scope = Some("400 sq ft composite deck".to_string());
        assert_eq!(message(&request), "Timeline information is required");
        request.timeline = Some(Timeline::lasting(2).into());
        assert_eq!(message(&request), "Location information is required");
        request.location = Some(Location::default().into());
        assert_eq!(message(&request), "Location information is required");
        request.location = Some(Structured::Other(json!("  ")));
        assert_eq!(message(&request), "Location information is required");
    }

    #[test]
    fn draft_is_not_validated_by_the_builder() {
        let mut request = seattle_bathroom();
        request.location =
            Some(serde_json::from_value(json!({"zip": "98101"})).expect("location decodes"));

        let card = build_draft(request).expect("builder does not run the validator");
        assert!(card.location.is_some());
    }

    #[test]
    fn request_decodes_from_tool_arguments() {
        let request: BidCardRequest = serde_json::from_value(json!({
            "project_type": "kitchen renovation",
            "project_scope": "new cabinets and counters",
            "timeline": {"start_date": "2025-06-01", "duration_weeks": 3},
            "budget_range": {"min": 5000, "max": 10000, "currency": "USD"},
            "location": {"city": "Seattle", "state": "WA", "zip": "98101"}
        }))
        .expect("tool arguments decode");

        let budget = request.budget_range.as_ref().expect("budget present");
        assert_eq!(budget.currency.as_deref(), Some("USD"));
        assert_eq!(budget.min, Some(rust_decimal::Decimal::new(5000, 0)));
        assert_eq!(
            request.timeline.as_ref().and_then(Structured::as_mapping).and_then(|t| t.duration_weeks),
            Some(3)
        );
    }

    #[test]
    fn non_mapping_structures_reach_the_draft_unchanged() {
        let request: BidCardRequest = serde_json::from_value(json!({
            "project_type": "roof repair",
            "project_scope": "patch two leaks",
            "timeline": "next spring",
            "location": {"city": "Boise", "state": "ID", "zip": 83702}
        }))
        .expect("loosely shaped arguments decode");

        let card = build_draft(request).expect("input checks pass");

        assert_eq!(card.timeline, Some(Structured::Other(json!("next spring"))));
        assert!(matches!(card.location, Some(Structured::Untyped(_))));
    }
}
