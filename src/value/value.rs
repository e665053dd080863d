use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::{unsupported_value, FirestoreResult};
use crate::model::GeoPoint;

/// Largest magnitude an `f64` represents exactly as an integer (2^53).
/// `From<f64>` only classifies values at or below this bound as integers;
/// larger whole numbers stay doubles so no precision is invented.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single field value, covering every tag of the wire representation.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    Reference(String),
    GeoPoint(GeoPoint),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn null() -> Self {
        Self { kind: ValueKind::Null }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    /// Classifies a number the way the wire protocol does: a finite value
    /// with no fractional part becomes an integer, everything else a double.
    pub fn from_number(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
            Self::from_integer(value as i64)
        } else {
            Self::from_double(value)
        }
    }

    pub fn from_timestamp(value: DateTime<Utc>) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_bytes(value: Vec<u8>) -> Self {
        Self {
            kind: ValueKind::Bytes(value),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_geo_point(value: GeoPoint) -> Self {
        Self {
            kind: ValueKind::GeoPoint(value),
        }
    }

    pub fn from_array(values: Vec<Value>) -> Self {
        Self {
            kind: ValueKind::Array(values),
        }
    }

    pub fn from_map(fields: BTreeMap<String, Value>) -> Self {
        Self {
            kind: ValueKind::Map(fields),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Converts caller-supplied dynamic JSON, recursing through arrays and
    /// objects. Numbers outside the representable domain fail with an
    /// `unsupported-value` error naming the offending field path.
    pub fn from_json(value: &JsonValue) -> FirestoreResult<Self> {
        convert_json(value, "")
    }
}

fn convert_json(value: &JsonValue, path: &str) -> FirestoreResult<Value> {
    match value {
        JsonValue::Null => Ok(Value::null()),
        JsonValue::Bool(boolean) => Ok(Value::from_bool(*boolean)),
        JsonValue::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(Value::from_integer(integer))
            } else if number.as_u64().is_some() {
                // u64 beyond i64::MAX: as_f64 would silently approximate it.
                Err(unsupported_value(format!(
                    "Number {number} at '{path}' is outside the representable range"
                )))
            } else if let Some(double) = number.as_f64() {
                Ok(Value::from_number(double))
            } else {
                Err(unsupported_value(format!(
                    "Number {number} at '{path}' is outside the representable range"
                )))
            }
        }
        JsonValue::String(string) => Ok(Value::from_string(string)),
        JsonValue::Array(entries) => {
            let mut values = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                values.push(convert_json(entry, &child_path(path, &index.to_string()))?);
            }
            Ok(Value::from_array(values))
        }
        JsonValue::Object(entries) => {
            let mut fields = BTreeMap::new();
            for (key, entry) in entries {
                fields.insert(key.clone(), convert_json(entry, &child_path(path, key))?);
            }
            Ok(Value::from_map(fields))
        }
    }
}

fn child_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

impl TryFrom<&JsonValue> for Value {
    type Error = crate::error::FirestoreError;

    fn try_from(value: &JsonValue) -> FirestoreResult<Self> {
        Value::from_json(value)
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = crate::error::FirestoreError;

    fn try_from(value: JsonValue) -> FirestoreResult<Self> {
        Value::from_json(&value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::from_bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::from_integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::from_integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::from_integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::from_number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::from_string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::from_string(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::from_timestamp(value)
    }
}

impl From<GeoPoint> for Value {
    fn from(value: GeoPoint) -> Self {
        Value::from_geo_point(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::from_array(values)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::from_map(fields)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_classification() {
        assert_eq!(Value::from(5.0).kind(), &ValueKind::Integer(5));
        assert_eq!(Value::from(5.5).kind(), &ValueKind::Double(5.5));
        assert_eq!(Value::from(-3.0).kind(), &ValueKind::Integer(-3));
    }

    #[test]
    fn oversized_whole_number_stays_double() {
        let value = Value::from_number(1.0e20);
        assert_eq!(value.kind(), &ValueKind::Double(1.0e20));
    }

    #[test]
    fn converts_dynamic_json() {
        let value = Value::from_json(&json!({
            "name": "foo",
            "count": 1,
            "rate": 0.5,
            "tags": ["a", "b"],
            "gone": null
        }))
        .unwrap();
        match value.kind() {
            ValueKind::Map(fields) => {
                assert_eq!(fields.get("count").unwrap().kind(), &ValueKind::Integer(1));
                assert_eq!(fields.get("rate").unwrap().kind(), &ValueKind::Double(0.5));
                assert_eq!(fields.get("gone").unwrap().kind(), &ValueKind::Null);
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unrepresentable_number() {
        let err = Value::from_json(&json!({ "big": u64::MAX })).unwrap_err();
        assert_eq!(err.code_str(), "firestore/unsupported-value");
        assert!(err.message().contains("big"));
    }

    #[test]
    fn unrepresentable_number_path_includes_index() {
        let err = Value::from_json(&json!({ "items": [0, u64::MAX] })).unwrap_err();
        assert!(err.message().contains("items.1"));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>).kind(), &ValueKind::Null);
        assert_eq!(Value::from(Some(2i64)).kind(), &ValueKind::Integer(2));
    }
}
