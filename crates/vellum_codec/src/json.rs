//! Conversion between [`Value`] and `serde_json` values.
//!
//! Dates travel through JSON as `{"$date": <millis>}`.

use crate::value::Value;
use serde_json::{Map, Number};

const DATE_KEY: &str = "$date";

impl Value {
    /// Converts a JSON value into a document value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => number_to_value(n),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => {
                if fields.len() == 1 {
                    if let Some(millis) = fields.get(DATE_KEY).and_then(serde_json::Value::as_i64) {
                        return Value::Date(millis);
                    }
                }
                Value::Map(
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// Converts this value into JSON.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::Number(Number::from(*n)),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(millis) => {
                let mut fields = Map::new();
                fields.insert(DATE_KEY.to_string(), serde_json::Value::from(*millis));
                serde_json::Value::Object(fields)
            }
            Value::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Integer(i)
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_from_json() {
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!(7)), Value::Integer(7));
        assert_eq!(Value::from_json(&json!(7.5)), Value::Float(7.5));
        assert_eq!(Value::from_json(&json!("x")), Value::from("x"));
    }

    #[test]
    fn date_marker() {
        let value = Value::from_json(&json!({"$date": 1_000}));
        assert_eq!(value, Value::Date(1_000));
        assert_eq!(value.to_json(), json!({"$date": 1_000}));
    }

    #[test]
    fn nested_document_keeps_fields() {
        let json = json!({"name": "Thomas", "tags": ["a", "b"], "address": {"city": "Graz"}});
        let value = Value::from_json(&json);
        assert_eq!(
            value.get("address").and_then(|a| a.get("city")),
            Some(&Value::from("Graz"))
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn nan_becomes_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), json!(null));
    }
}
