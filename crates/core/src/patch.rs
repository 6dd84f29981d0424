use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::attributes::{Attributes, Structured};
use crate::domain::bid_card::{BidCard, BidCardStatus, BudgetRange, Location, Timeline};
use crate::errors::BidCardError;

const READ_ONLY_FIELDS: [&str; 4] = ["id", "homeowner_id", "created_at", "updated_at"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("No updates supplied")]
    Empty,
    #[error("Field is read-only: {0}")]
    ReadOnly(String),
    #[error("Unknown bid card field: {0}")]
    UnknownField(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<PatchError> for BidCardError {
    fn from(value: PatchError) -> Self {
        Self::Input(value.to_string())
    }
}

/// One overwrite of one writable field. `None` clears the field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldChange {
    ProjectName(Option<String>),
    ProjectType(Option<String>),
    ProjectScope(Option<String>),
    Timeline(Option<Structured<Timeline>>),
    Location(Option<Structured<Location>>),
    Status(BidCardStatus),
    BudgetRange(Option<Structured<BudgetRange>>),
    MaterialsPreferences(Option<Structured<Attributes>>),
    SpecialRequirements(Option<String>),
    AccessibilityNeeds(Option<Structured<Attributes>>),
    SchedulingConstraints(Option<Structured<Attributes>>),
    PhotoUrls(Option<Vec<String>>),
    ImageAnalysisResults(Option<Structured<Attributes>>),
}

impl FieldChange {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::ProjectName(_) => "project_name",
            Self::ProjectType(_) => "project_type",
            Self::ProjectScope(_) => "project_scope",
            Self::Timeline(_) => "timeline",
            Self::Location(_) => "location",
            Self::Status(_) => "status",
            Self::BudgetRange(_) => "budget_range",
            Self::MaterialsPreferences(_) => "materials_preferences",
            Self::SpecialRequirements(_) => "special_requirements",
            Self::AccessibilityNeeds(_) => "accessibility_needs",
            Self::SchedulingConstraints(_) => "scheduling_constraints",
            Self::PhotoUrls(_) => "photo_urls",
            Self::ImageAnalysisResults(_) => "image_analysis_results",
        }
    }

    fn parse(field: &str, value: Value) -> Result<Self, PatchError> {
        let change = match field {
            "project_name" => Self::ProjectName(string(field, value)?),
            "project_type" => Self::ProjectType(string(field, value)?),
            "project_scope" => Self::ProjectScope(string(field, value)?),
            "timeline" => Self::Timeline(structured(value)),
            "location" => Self::Location(structured(value)),
            "status" => match value {
                Value::String(status) => Self::Status(status.parse().map_err(|_| {
                    PatchError::InvalidValue {
                        field: field.to_string(),
                        reason: format!("unknown status `{status}`"),
                    }
                })?),
                _ => return Err(invalid(field, "expected a status string")),
            },
            "budget_range" => Self::BudgetRange(structured(value)),
            "materials_preferences" => Self::MaterialsPreferences(structured(value)),
            "special_requirements" => Self::SpecialRequirements(string(field, value)?),
            "accessibility_needs" => Self::AccessibilityNeeds(structured(value)),
            "scheduling_constraints" => Self::SchedulingConstraints(structured(value)),
            "photo_urls" => Self::PhotoUrls(match value {
                Value::Null => None,
                other => Some(
                    serde_json::from_value(other)
                        .map_err(|_| invalid(field, "expected a list of strings"))?,
                ),
            }),
            "image_analysis_results" => Self::ImageAnalysisResults(structured(value)),
            other if READ_ONLY_FIELDS.contains(&other) => {
                return Err(PatchError::ReadOnly(other.to_string()))
            }
            other => return Err(PatchError::UnknownField(other.to_string())),
        };
        Ok(change)
    }

    fn apply(self, card: &mut BidCard) {
        match self {
            Self::ProjectName(value) => card.project_name = value,
            Self::ProjectType(value) => card.project_type = value,
            Self::ProjectScope(value) => card.project_scope = value,
            Self::Timeline(value) => card.timeline = value,
            Self::Location(value) => card.location = value,
            Self::Status(value) => card.status = value,
            Self::BudgetRange(value) => card.budget_range = value,
            Self::MaterialsPreferences(value) => card.materials_preferences = value,
            Self::SpecialRequirements(value) => card.special_requirements = value,
            Self::AccessibilityNeeds(value) => card.accessibility_needs = value,
            Self::SchedulingConstraints(value) => card.scheduling_constraints = value,
            Self::PhotoUrls(value) => card.photo_urls = value,
            Self::ImageAnalysisResults(value) => card.image_analysis_results = value,
        }
    }
}

/// A shallow merge over the writable fields of a bid card.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BidCardPatch {
    changes: Vec<FieldChange>,
}

impl BidCardPatch {
    pub fn new(changes: Vec<FieldChange>) -> Self {
        Self { changes }
    }

    pub fn from_json(updates: Map<String, Value>) -> Result<Self, PatchError> {
        if updates.is_empty() {
            return Err(PatchError::Empty);
        }
        let changes = updates
            .into_iter()
            .map(|(field, value)| FieldChange::parse(&field, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { changes })
    }

    pub fn from_value(updates: Value) -> Result<Self, PatchError> {
        match updates {
            Value::Object(map) => Self::from_json(map),
            _ => Err(invalid("updates", "expected an object of field values")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.changes.iter().map(|change| change.field_name().to_string()).collect()
    }

    /// Overwrites each named field; every other field is left as it was.
    pub fn apply_to(self, card: &mut BidCard) {
        for change in self.changes {
            change.apply(card);
        }
    }
}

fn invalid(field: &str, reason: &str) -> PatchError {
    PatchError::InvalidValue { field: field.to_string(), reason: reason.to_string() }
}

fn string(field: &str, value: Value) -> Result<Option<String>, PatchError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(invalid(field, "expected a string")),
    }
}

fn structured<T: DeserializeOwned>(value: Value) -> Option<Structured<T>> {
    if value.is_null() {
        return None;
    }
    Some(Structured::from_value(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BidCardPatch, PatchError};
    use crate::domain::attributes::Structured;
    use crate::domain::bid_card::{BidCard, BidCardStatus, Location, Timeline};

    fn stored_card() -> BidCard {
        let mut card = BidCard::blank();
        card.project_type = Some("bathroom remodel".to_string());
        card.project_scope = Some("full gut renovation".to_string());
        card.timeline = Some(Structured::Mapping(Timeline::starting("2025-06-01")));
        card.location = Some(Structured::Mapping(Location::new("Seattle", "WA")));
        card
    }

    #[test]
    fn overwrites_named_fields_and_leaves_the_rest() {
        let mut card = stored_card();
        let original = card.clone();
        let patch = BidCardPatch::from_value(json!({
            "special_requirements": "wheelchair access",
            "status": "published"
        }))
        .expect("patch parses");

        assert_eq!(patch.field_names(), vec!["special_requirements", "status"]);
        patch.apply_to(&mut card);

        assert_eq!(card.special_requirements.as_deref(), Some("wheelchair access"));
        assert_eq!(card.status, BidCardStatus::Published);
        assert_eq!(card.project_type, original.project_type);
        assert_eq!(card.timeline, original.timeline);
        assert_eq!(card.location, original.location);
        assert_eq!(card.id, original.id);
    }

    #[test]
    fn replaces_nested_structures_wholesale() {
        let mut card = stored_card();
        BidCardPatch::from_value(json!({"location": {"city": "Austin"}}))
            .expect("patch parses")
            .apply_to(&mut card);

        let location = card.location.as_ref().and_then(Structured::as_mapping).expect("mapping");
        assert_eq!(location.city.as_deref(), Some("Austin"));
        assert_eq!(location.state, None);
    }

    #[test]
    fn scalar_for_structured_field_is_kept_for_the_validator() {
        let mut card = stored_card();
        BidCardPatch::from_value(json!({"timeline": "next spring"}))
            .expect("patch parses")
            .apply_to(&mut card);

        assert_eq!(card.timeline, Some(Structured::Other(json!("next spring"))));
    }

    #[test]
    fn null_clears_a_field() {
        let mut card = stored_card();
        BidCardPatch::from_value(json!({"project_scope": null}))
            .expect("patch parses")
            .apply_to(&mut card);

        assert_eq!(card.project_scope, None);
    }

    #[test]
    fn rejects_identity_and_unknown_fields() {
        assert_eq!(
            BidCardPatch::from_value(json!({"id": "other"})),
            Err(PatchError::ReadOnly("id".to_string()))
        );
        assert_eq!(
            BidCardPatch::from_value(json!({"homeowner_id": "h2"})),
            Err(PatchError::ReadOnly("homeowner_id".to_string()))
        );
        assert_eq!(
            BidCardPatch::from_value(json!({"color": "blue"})),
            Err(PatchError::UnknownField("color".to_string()))
        );
        assert_eq!(BidCardPatch::from_value(json!({})), Err(PatchError::Empty));
    }

    #[test]
    fn rejects_mistyped_values() {
        let error = BidCardPatch::from_value(json!({"project_type": 7})).expect_err("bad type");
        assert!(matches!(error, PatchError::InvalidValue { ref field, .. } if field == "project_type"));

        let error = BidCardPatch::from_value(json!({"photo_urls": [1, 2]})).expect_err("bad urls");
        assert!(matches!(error, PatchError::InvalidValue { ref field, .. } if field == "photo_urls"));

        let error =
            BidCardPatch::from_value(json!({"status": "archived"})).expect_err("bad status");
        assert!(error.to_string().contains("unknown status `archived`"));
    }
}
