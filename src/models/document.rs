use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document as delivered by the store: an identifier and an untyped field bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON object. Anything else yields an empty field bag.
    pub fn from_value(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, fields)
    }

    /// Field value; explicit `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Numeric field. Numeric strings are accepted, non-finite values are not.
    pub fn number_field(&self, key: &str) -> Option<f64> {
        let number = match self.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    }

    pub fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(parse_timestamp)
    }
}

/// Parse a stored timestamp.
///
/// Accepted shapes: RFC 3339 strings, bare `YYYY-MM-DD` dates (midnight UTC),
/// `{ "seconds", "nanoseconds" }` objects (with or without a leading
/// underscore on the keys) and integer epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        }
        Value::Number(number) => Utc.timestamp_millis_opt(number.as_i64()?).single(),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_parse_from_every_supported_shape() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-01-01T00:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-01-01T05:00:00+05:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-01-01")), Some(expected));
        assert_eq!(parse_timestamp(&json!(1_704_067_200_000_i64)), Some(expected));
        assert_eq!(
            parse_timestamp(&json!({ "seconds": 1_704_067_200_i64, "nanoseconds": 0 })),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(&json!({ "_seconds": 1_704_067_200_i64 })),
            Some(expected)
        );
    }

    #[test]
    fn garbage_timestamps_are_rejected() {
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&json!({ "nanoseconds": 5 })), None);
    }

    #[test]
    fn null_fields_count_as_missing() {
        let doc = Document::from_value("a", json!({ "firstName": null, "totalAmount": "1500" }));
        assert!(doc.get("firstName").is_none());
        assert_eq!(doc.number_field("totalAmount"), Some(1500.0));
    }

    #[test]
    fn documents_deserialize_with_flattened_fields() {
        let doc: Document =
            serde_json::from_value(json!({ "id": "c1", "lastName": "Ким" })).unwrap();
        assert_eq!(doc.id, "c1");
        assert_eq!(doc.str_field("lastName"), Some("Ким"));
        assert!(doc.get("id").is_none());
    }
}
