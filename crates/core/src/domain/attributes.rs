use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-less passthrough data collected by the conversation layer.
pub type Attributes = BTreeMap<String, AttributeValue>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<AttributeValue>),
    Map(Attributes),
    Null,
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// A structured sub-object that may not actually be structured.
///
/// `Untyped` is a JSON object whose values do not fit `T` (a fractional
/// `duration_weeks`, a numeric `city`); it is still a mapping and the validator
/// checks it by key. `Other` holds whatever arrived in place of a mapping: raw
/// text left behind by the lenient storage decoder, or a scalar supplied by a
/// caller. The validator reports `Other` values as structural errors instead of
/// failing to decode them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Structured<T> {
    Mapping(T),
    Untyped(Map<String, Value>),
    Other(Value),
}

impl<T> Structured<T> {
    pub fn as_mapping(&self) -> Option<&T> {
        match self {
            Self::Mapping(value) => Some(value),
            Self::Untyped(_) | Self::Other(_) => None,
        }
    }

    /// True for any JSON object, typed or not.
    pub fn is_mapping(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl<T: DeserializeOwned> Structured<T> {
    /// Objects decode into `T` when they fit and are kept as `Untyped` when they
    /// don't; anything else is kept verbatim as `Other`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => serde_json::from_value::<T>(Value::Object(map.clone()))
                .map_or(Self::Untyped(map), Self::Mapping),
            other => Self::Other(other),
        }
    }
}

impl<T> From<T> for Structured<T> {
    fn from(value: T) -> Self {
        Self::Mapping(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AttributeValue, Attributes, Structured};
    use crate::domain::bid_card::Timeline;

    #[test]
    fn attribute_union_accepts_nested_free_form_data() {
        let attributes: Attributes = serde_json::from_value(json!({
            "flooring": "heated tile",
            "budget_flexible": true,
            "fixtures": 3,
            "brands": ["Kohler", "Moen"],
            "vanity": {"width_in": 48, "finish": "walnut"}
        }))
        .expect("free-form attributes decode");

        assert_eq!(attributes["flooring"], AttributeValue::from("heated tile"));
        assert_eq!(attributes["budget_flexible"], AttributeValue::Bool(true));
        assert_eq!(attributes["fixtures"], AttributeValue::from(3));
        assert!(matches!(attributes["brands"], AttributeValue::List(ref items) if items.len() == 2));
        assert!(matches!(attributes["vanity"], AttributeValue::Map(ref map) if map.len() == 2));
    }

    #[test]
    fn non_object_values_are_kept_as_other() {
        let structured = Structured::<Attributes>::from_value(json!("next spring"));

        assert_eq!(structured, Structured::Other(json!("next spring")));
        assert!(!structured.is_mapping());
    }

    #[test]
    fn null_attribute_values_are_kept() {
        let attributes: Attributes =
            serde_json::from_value(json!({"notes": null})).expect("null decodes");
        assert_eq!(attributes["notes"], AttributeValue::Null);
        assert_eq!(serde_json::to_value(&attributes).expect("encodes"), json!({"notes": null}));
    }

    #[test]
    fn objects_that_do_not_fit_the_type_stay_mappings() {
        let structured = Structured::<Timeline>::from_value(json!({"duration_weeks": 2.5}));

        assert!(matches!(structured, Structured::Untyped(ref map) if map.contains_key("duration_weeks")));
        assert!(structured.is_mapping());
        assert!(structured.as_mapping().is_none());

        let decoded: Structured<Timeline> =
            serde_json::from_value(json!({"duration_weeks": 2.5})).expect("object decodes");
        assert_eq!(decoded, structured);
        assert_eq!(serde_json::to_value(&decoded).expect("encodes"), json!({"duration_weeks": 2.5}));
    }
}
