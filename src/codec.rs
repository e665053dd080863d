//! Bidirectional codec between [`Value`] and the REST wire representation.
//!
//! The wire format tags every value with exactly one `*Value` key. Integers
//! travel as decimal strings (distinguishing them from doubles), timestamps
//! as RFC 3339 with millisecond precision in UTC.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value as JsonValue};

use crate::error::{malformed_value, not_implemented, FirestoreResult};
use crate::model::GeoPoint;
use crate::value::{Value, ValueKind};

pub fn encode_value(value: &Value) -> JsonValue {
    match value.kind() {
        ValueKind::Null => json!({ "nullValue": JsonValue::Null }),
        ValueKind::Boolean(boolean) => json!({ "booleanValue": boolean }),
        ValueKind::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        ValueKind::Double(double) => json!({ "doubleValue": double }),
        ValueKind::Timestamp(timestamp) => json!({ "timestampValue": encode_timestamp(timestamp) }),
        ValueKind::String(string) => json!({ "stringValue": string }),
        ValueKind::Bytes(bytes) => json!({ "bytesValue": BASE64_STANDARD.encode(bytes) }),
        ValueKind::Reference(reference) => json!({ "referenceValue": reference }),
        ValueKind::GeoPoint(point) => json!({
            "geoPointValue": {
                "latitude": point.latitude(),
                "longitude": point.longitude(),
            }
        }),
        ValueKind::Array(values) => {
            let values = values.iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        ValueKind::Map(fields) => json!({
            "mapValue": {
                "fields": encode_fields_map(fields)
            }
        }),
    }
}

/// Encodes a document body: `{"fields": {...}}`.
pub fn encode_document_fields(fields: &BTreeMap<String, Value>) -> JsonValue {
    json!({ "fields": encode_fields_map(fields) })
}

pub(crate) fn encode_fields_map(fields: &BTreeMap<String, Value>) -> JsonValue {
    let mut encoded = serde_json::Map::new();
    for (key, value) in fields {
        encoded.insert(key.clone(), encode_value(value));
    }
    JsonValue::Object(encoded)
}

/// Decodes one tagged wire value.
///
/// Tags are probed in a fixed order and the first recognized one wins,
/// matching lenient servers that may attach extra keys. An object carrying
/// no recognized tag fails with `malformed-value`; `referenceValue` and
/// `bytesValue` fail with `not-implemented` so data is never silently
/// dropped.
pub fn decode_value(value: &JsonValue) -> FirestoreResult<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| malformed_value("Expected a tagged value object"))?;

    if object.contains_key("nullValue") {
        return Ok(Value::null());
    }
    if let Some(boolean) = object.get("booleanValue") {
        let parsed = boolean
            .as_bool()
            .ok_or_else(|| malformed_value("booleanValue must be a boolean"))?;
        return Ok(Value::from_bool(parsed));
    }
    if let Some(integer) = object.get("integerValue") {
        return decode_integer(integer);
    }
    if let Some(double) = object.get("doubleValue") {
        return decode_double(double);
    }
    if let Some(timestamp) = object.get("timestampValue") {
        let raw = timestamp
            .as_str()
            .ok_or_else(|| malformed_value("timestampValue must be a string"))?;
        return Ok(Value::from_timestamp(decode_timestamp(raw)?));
    }
    if let Some(string) = object.get("stringValue") {
        let parsed = string
            .as_str()
            .ok_or_else(|| malformed_value("stringValue must be a string"))?;
        return Ok(Value::from_string(parsed));
    }
    if object.contains_key("bytesValue") {
        return Err(not_implemented("bytesValue is not supported"));
    }
    if object.contains_key("referenceValue") {
        return Err(not_implemented("referenceValue is not supported"));
    }
    if let Some(point) = object.get("geoPointValue") {
        return decode_geo_point(point);
    }
    if let Some(array) = object.get("arrayValue") {
        let decoded = match array.get("values").and_then(JsonValue::as_array) {
            Some(entries) => entries
                .iter()
                .map(decode_value)
                .collect::<FirestoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        return Ok(Value::from_array(decoded));
    }
    if let Some(map) = object.get("mapValue") {
        return decode_fields(map.get("fields")).map(Value::from_map);
    }

    let keys = object.keys().cloned().collect::<Vec<_>>().join(", ");
    Err(malformed_value(format!(
        "Value object carries no recognized tag (keys: {keys})"
    )))
}

/// Decodes a document resource's `fields` object into a plain mapping. A
/// document without user fields decodes to an empty map.
pub fn decode_document_fields(document: &JsonValue) -> FirestoreResult<BTreeMap<String, Value>> {
    decode_fields(document.get("fields"))
}

fn decode_fields(fields: Option<&JsonValue>) -> FirestoreResult<BTreeMap<String, Value>> {
    let object = match fields {
        Some(value) => value
            .as_object()
            .ok_or_else(|| malformed_value("Expected 'fields' to be an object"))?,
        None => return Ok(BTreeMap::new()),
    };

    let mut decoded = BTreeMap::new();
    for (key, value) in object {
        decoded.insert(key.clone(), decode_value(value)?);
    }
    Ok(decoded)
}

fn decode_integer(value: &JsonValue) -> FirestoreResult<Value> {
    let parsed = match value {
        JsonValue::String(raw) => raw
            .parse::<i64>()
            .map_err(|err| malformed_value(format!("Invalid integerValue '{raw}': {err}")))?,
        JsonValue::Number(number) => number
            .as_i64()
            .ok_or_else(|| malformed_value("integerValue is outside the i64 range"))?,
        _ => return Err(malformed_value("integerValue must be a string or number")),
    };
    Ok(Value::from_integer(parsed))
}

fn decode_double(value: &JsonValue) -> FirestoreResult<Value> {
    let parsed = match value {
        JsonValue::Number(number) => number
            .as_f64()
            .ok_or_else(|| malformed_value("Invalid doubleValue"))?,
        JsonValue::String(raw) => raw
            .parse::<f64>()
            .map_err(|err| malformed_value(format!("Invalid doubleValue '{raw}': {err}")))?,
        _ => return Err(malformed_value("doubleValue must be a number or string")),
    };
    Ok(Value::from_double(parsed))
}

fn decode_geo_point(value: &JsonValue) -> FirestoreResult<Value> {
    // Missing components default to 0 on the wire.
    let latitude = value.get("latitude").and_then(JsonValue::as_f64).unwrap_or(0.0);
    let longitude = value.get("longitude").and_then(JsonValue::as_f64).unwrap_or(0.0);
    let point = GeoPoint::new(latitude, longitude)
        .map_err(|err| malformed_value(format!("Invalid geoPointValue: {err}")))?;
    Ok(Value::from_geo_point(point))
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(value: &str) -> FirestoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.with_timezone(&Utc))
        .map_err(|err| malformed_value(format!("Invalid timestampValue '{value}': {err}")))
}
