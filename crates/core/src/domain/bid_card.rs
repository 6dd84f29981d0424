use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::attributes::{Attributes, Structured};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidCardId(pub String);

impl BidCardId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for BidCardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HomeownerId(pub String);

impl fmt::Display for HomeownerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle states. This crate only ever assigns `Draft`; the rest are owned by
/// the downstream bidding workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidCardStatus {
    #[default]
    Draft,
    Published,
    Bidding,
    Awarded,
    Closed,
    Cancelled,
}

impl BidCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Bidding => "bidding",
            Self::Awarded => "awarded",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BidCardStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "bidding" => Ok(Self::Bidding),
            "awarded" => Ok(Self::Awarded),
            "closed" => Ok(Self::Closed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown bid card status `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl Timeline {
    pub fn starting(start_date: impl Into<String>) -> Self {
        Self { start_date: Some(start_date.into()), ..Self::default() }
    }

    pub fn lasting(duration_weeks: u32) -> Self {
        Self { duration_weeks: Some(duration_weeks), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.duration_weeks.is_none() && self.extra.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl Location {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self { city: Some(city.into()), state: Some(state.into()), ..Self::default() }
    }

    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.zip.is_none() && self.extra.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl BudgetRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.currency.is_none() && self.extra.is_empty()
    }
}

/// The structured project record contractors quote against.
///
/// Required attributes are optional at the type level so that candidates can be
/// inspected by the validator before they are committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BidCard {
    pub id: BidCardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeowner_id: Option<HomeownerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Structured<Timeline>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Structured<Location>>,
    #[serde(default)]
    pub status: BidCardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<Structured<BudgetRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_preferences: Option<Structured<Attributes>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_needs: Option<Structured<Attributes>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_constraints: Option<Structured<Attributes>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_analysis_results: Option<Structured<Attributes>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BidCard {
    /// A draft with a fresh identifier and no attributes set.
    pub fn blank() -> Self {
        let now = Utc::now();
        Self {
            id: BidCardId::generate(),
            homeowner_id: None,
            project_name: None,
            project_type: None,
            project_scope: None,
            timeline: None,
            location: None,
            status: BidCardStatus::Draft,
            budget_range: None,
            materials_preferences: None,
            special_requirements: None,
            accessibility_needs: None,
            scheduling_constraints: None,
            photo_urls: None,
            image_analysis_results: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves `updated_at` forward; never backwards and never to the same instant.
    pub fn touch(&mut self) {
        let floor = self.updated_at.max(self.created_at) + Duration::microseconds(1);
        self.updated_at = Utc::now().max(floor);
    }

    pub fn display_name(&self) -> String {
        match (&self.project_name, &self.project_type) {
            (Some(name), _) => name.clone(),
            (None, Some(project_type)) => format!("{project_type} Project"),
            (None, None) => "Untitled Project".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::{BidCard, BidCardStatus, Location, Timeline};
    use crate::domain::attributes::Structured;

    #[test]
    fn touch_strictly_advances_updated_at_even_with_future_stamp() {
        let mut card = BidCard::blank();
        card.updated_at += Duration::hours(1);
        let before = card.updated_at;

        card.touch();

        assert!(card.updated_at > before);
        assert!(card.updated_at > card.created_at);
    }

    #[test]
    fn absent_optional_fields_are_not_serialized() {
        let mut card = BidCard::blank();
        card.project_type = Some("deck building".to_string());
        card.location = Some(Structured::Mapping(Location::new("Austin", "TX")));

        let value = serde_json::to_value(&card).expect("card serializes");
        let object = value.as_object().expect("card is an object");

        assert_eq!(object["status"], json!("draft"));
        assert_eq!(object["location"], json!({"city": "Austin", "state": "TX"}));
        assert!(!object.contains_key("budget_range"));
        assert!(!object.contains_key("photo_urls"));
        assert!(!object.contains_key("homeowner_id"));
    }

    #[test]
    fn timeline_keeps_unrecognised_keys() {
        let timeline: Timeline = serde_json::from_value(json!({
            "duration_weeks": 3,
            "flexibility": "flexible"
        }))
        .expect("timeline decodes");

        assert_eq!(timeline.duration_weeks, Some(3));
        assert!(timeline.extra.contains_key("flexibility"));
        assert!(!timeline.is_empty());
    }

    #[test]
    fn status_parses_case_insensitively_and_rejects_unknown_values() {
        assert_eq!("Bidding".parse::<BidCardStatus>().expect("known status"), BidCardStatus::Bidding);
        assert!("archived".parse::<BidCardStatus>().is_err());
    }

    #[test]
    fn display_name_falls_back_to_project_type() {
        let mut card = BidCard::blank();
        card.project_type = Some("kitchen renovation".to_string());
        assert_eq!(card.display_name(), "kitchen renovation Project");

        card.project_name = Some("Smith kitchen".to_string());
        assert_eq!(card.display_name(), "Smith kitchen");
    }
}
