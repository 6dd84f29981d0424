//! Text encoding for the structured bid card columns.
//!
//! Structured values are stored as JSON text. Reads are lenient: a column that
//! does not parse is handed back as raw text inside [`Structured::Other`] so the
//! validator can report it, instead of failing the whole fetch. An object whose
//! values do not fit the typed shape is kept as [`Structured::Untyped`].

use chrono::{DateTime, SecondsFormat, Utc};
use instabids_core::domain::attributes::Structured;
use instabids_core::domain::bid_card::BidCardStatus;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::RepositoryError;

pub fn encode_structured<T: Serialize>(
    column: &str,
    value: Option<&Structured<T>>,
) -> Result<Option<String>, RepositoryError> {
    match value {
        None => Ok(None),
        Some(Structured::Other(Value::String(raw))) => Ok(Some(raw.clone())),
        Some(structured) => serde_json::to_string(structured).map(Some).map_err(|error| {
            RepositoryError::Encode(format!("could not encode `{column}`: {error}"))
        }),
    }
}

pub fn decode_structured<T: DeserializeOwned>(raw: Option<String>) -> Option<Structured<T>> {
    let raw = raw?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(Structured::from_value(value)),
        Err(_) => Some(Structured::Other(Value::String(raw))),
    }
}

pub fn encode_photo_urls(urls: Option<&Vec<String>>) -> Result<Option<String>, RepositoryError> {
    urls.map(serde_json::to_string)
        .transpose()
        .map_err(|error| RepositoryError::Encode(format!("could not encode `photo_urls`: {error}")))
}

pub fn decode_photo_urls(raw: Option<String>) -> Result<Option<Vec<String>>, RepositoryError> {
    raw.map(|raw| {
        serde_json::from_str::<Vec<String>>(&raw).map_err(|error| {
            RepositoryError::Decode(format!("invalid `photo_urls` array `{raw}` ({error})"))
        })
    })
    .transpose()
}

/// Fixed-width RFC 3339 so lexical order in SQLite matches chronological order.
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub fn parse_status(value: &str) -> Result<BidCardStatus, RepositoryError> {
    value
        .parse()
        .map_err(|_| RepositoryError::Decode(format!("unknown bid card status `{value}`")))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use instabids_core::domain::attributes::{Attributes, Structured};
    use instabids_core::domain::bid_card::{BidCard, Location, Timeline};
    use instabids_core::validation::validate_bid_card;
    use serde_json::{json, Value};

    use super::{
        decode_photo_urls, decode_structured, encode_structured, encode_timestamp,
        parse_timestamp,
    };

    #[test]
    fn unparseable_text_is_kept_raw() {
        let decoded = decode_structured::<Timeline>(Some("sometime next spring".to_string()));
        assert_eq!(decoded, Some(Structured::Other(Value::String("sometime next spring".into()))));

        let decoded = decode_structured::<Attributes>(Some("{broken".to_string()));
        assert_eq!(decoded, Some(Structured::Other(Value::String("{broken".into()))));
    }

    #[test]
    fn raw_text_is_written_back_unquoted() {
        let raw = Structured::<Timeline>::Other(json!("sometime next spring"));
        let encoded = encode_structured("timeline", Some(&raw)).expect("encodes");

        assert_eq!(encoded.as_deref(), Some("sometime next spring"));
        assert_eq!(decode_structured::<Timeline>(encoded), Some(raw));
    }

    #[test]
    fn mappings_survive_encoding() {
        let location = Structured::Mapping(Location::new("Seattle", "WA").with_zip("98101"));
        let encoded = encode_structured("location", Some(&location)).expect("encodes");

        assert_eq!(decode_structured::<Location>(encoded), Some(location));
        assert_eq!(decode_structured::<Location>(Some("null".to_string())), None);
        assert_eq!(decode_structured::<Location>(None), None);
    }

    #[test]
    fn objects_outside_the_typed_shape_still_validate_as_mappings() {
        let timeline = decode_structured::<Timeline>(Some(r#"{"duration_weeks":2.5}"#.to_string()));
        assert!(matches!(timeline, Some(Structured::Untyped(_))));

        let mut card = BidCard::blank();
        card.project_type = Some("fence repair".to_string());
        card.project_scope = Some("replace three panels".to_string());
        card.timeline = timeline;
        card.location =
            decode_structured::<Location>(Some(r#"{"city":"Reno","state":"NV","zip":89501}"#.to_string()));
        assert!(validate_bid_card(&card).valid);

        card.timeline = decode_structured::<Timeline>(Some(
            r#"{"start_date":"2025-06-01","notes":null}"#.to_string(),
        ));
        assert!(card.timeline.as_ref().and_then(Structured::as_mapping).is_some());
        assert!(validate_bid_card(&card).valid);

        let encoded = encode_structured(
            "timeline",
            decode_structured::<Timeline>(Some(r#"{"duration_weeks":2.5}"#.to_string())).as_ref(),
        )
        .expect("encodes");
        assert_eq!(encoded.as_deref(), Some(r#"{"duration_weeks":2.5}"#));
    }

    #[test]
    fn photo_urls_must_be_a_json_array() {
        let decoded = decode_photo_urls(Some(r#"["a.jpg","b.jpg"]"#.to_string())).expect("array");
        assert_eq!(decoded.map(|urls| urls.len()), Some(2));

        assert!(decode_photo_urls(Some("a.jpg".to_string())).is_err());
    }

    #[test]
    fn timestamps_round_trip_at_full_precision() {
        let now = Utc::now();
        let encoded = encode_timestamp(&now);

        assert!(encoded.ends_with('Z'));
        assert_eq!(parse_timestamp("created_at", encoded).expect("parses"), now);
        assert!(parse_timestamp("created_at", "yesterday".to_string()).is_err());
    }
}
