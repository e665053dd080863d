//! Commit-style write payloads: document fields, an update mask, and
//! server-side field transforms.

use std::collections::BTreeMap;

use serde_json::{json, Value as JsonValue};

use crate::codec::{encode_fields_map, encode_value};
use crate::error::{FirestoreError, FirestoreResult};
use crate::model::FieldPath;
use crate::value::Value;

/// Write-time operations the server applies to a single field.
#[derive(Clone, Debug)]
pub enum TransformOperation {
    Increment(Value),
    AppendMissingElements(Vec<Value>),
    RemoveAllFromArray(Vec<Value>),
}

#[derive(Clone, Debug)]
pub struct FieldTransform {
    field: FieldPath,
    operation: TransformOperation,
}

impl FieldTransform {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operation(&self) -> &TransformOperation {
        &self.operation
    }
}

/// Accumulates one update write for a `:commit` request.
///
/// Plain fields land in `fields` and the update mask; a field named in the
/// mask without a value is deleted server-side; transformed fields travel
/// only in `updateTransforms` (transforms apply independently of the mask).
#[derive(Debug, Default)]
pub struct UpdateWrite {
    fields: BTreeMap<String, Value>,
    mask: Vec<FieldPath>,
    transforms: Vec<FieldTransform>,
    deferred: Option<FirestoreError>,
}

impl UpdateWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field to a value and includes it in the update mask.
    pub fn set(mut self, field: impl AsRef<str>, value: impl Into<Value>) -> Self {
        match FieldPath::from_dot_separated(field.as_ref()) {
            Ok(path) => {
                self.push_mask(path);
                self.fields.insert(field.as_ref().to_string(), value.into());
            }
            Err(err) => self.defer(err),
        }
        self
    }

    /// Names a field in the update mask without supplying a value, deleting
    /// it from the document.
    pub fn delete_field(mut self, field: impl AsRef<str>) -> Self {
        match FieldPath::from_dot_separated(field.as_ref()) {
            Ok(path) => self.push_mask(path),
            Err(err) => self.defer(err),
        }
        self
    }

    /// Increments a numeric field by the given operand.
    pub fn increment(mut self, field: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.push_transform(field.as_ref(), TransformOperation::Increment(value.into()));
        self
    }

    /// Appends the elements not already present to an array field.
    pub fn append<V, I>(mut self, field: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_transform(
            field.as_ref(),
            TransformOperation::AppendMissingElements(values),
        );
        self
    }

    /// Removes every occurrence of the given elements from an array field.
    pub fn clear<V, I>(mut self, field: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_transform(field.as_ref(), TransformOperation::RemoveAllFromArray(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.mask.is_empty() && self.transforms.is_empty()
    }

    /// Encodes the complete `:commit` body for the named document.
    pub fn into_commit_body(self, document_name: &str) -> FirestoreResult<JsonValue> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let mask: Vec<String> = self.mask.iter().map(FieldPath::canonical_string).collect();
        let mut write = serde_json::Map::new();
        write.insert(
            "update".to_string(),
            json!({
                "name": document_name,
                "fields": encode_fields_map(&self.fields)
            }),
        );
        write.insert("updateMask".to_string(), json!({ "fieldPaths": mask }));
        if let Some(transforms) = encode_field_transforms(&self.transforms) {
            write.insert("updateTransforms".to_string(), JsonValue::Array(transforms));
        }

        Ok(json!({ "writes": [ JsonValue::Object(write) ] }))
    }

    fn push_mask(&mut self, path: FieldPath) {
        if !self.mask.contains(&path) {
            self.mask.push(path);
        }
    }

    fn push_transform(&mut self, field: &str, operation: TransformOperation) {
        match FieldPath::from_dot_separated(field) {
            Ok(path) => self.transforms.push(FieldTransform {
                field: path,
                operation,
            }),
            Err(err) => self.defer(err),
        }
    }

    fn defer(&mut self, err: FirestoreError) {
        self.deferred.get_or_insert(err);
    }
}

fn encode_field_transforms(transforms: &[FieldTransform]) -> Option<Vec<JsonValue>> {
    if transforms.is_empty() {
        return None;
    }

    let mut encoded = Vec::with_capacity(transforms.len());
    for transform in transforms {
        let field_path = transform.field().canonical_string();
        let json = match transform.operation() {
            TransformOperation::Increment(operand) => json!({
                "fieldPath": field_path,
                "increment": encode_value(operand)
            }),
            TransformOperation::AppendMissingElements(elements) => json!({
                "fieldPath": field_path,
                "appendMissingElements": {
                    "values": elements.iter().map(encode_value).collect::<Vec<_>>()
                }
            }),
            TransformOperation::RemoveAllFromArray(elements) => json!({
                "fieldPath": field_path,
                "removeAllFromArray": {
                    "values": elements.iter().map(encode_value).collect::<Vec<_>>()
                }
            }),
        };
        encoded.push(json);
    }

    Some(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = "projects/p/databases/(default)/documents/users/u1";

    #[test]
    fn commit_body_shape() {
        let body = UpdateWrite::new()
            .set("name", "bar")
            .increment("visits", 1i64)
            .append("tags", vec![2i64])
            .into_commit_body(DOC)
            .unwrap();

        assert_eq!(
            body,
            json!({
                "writes": [
                    {
                        "update": {
                            "name": DOC,
                            "fields": { "name": { "stringValue": "bar" } }
                        },
                        "updateMask": { "fieldPaths": ["name"] },
                        "updateTransforms": [
                            { "fieldPath": "visits", "increment": { "integerValue": "1" } },
                            {
                                "fieldPath": "tags",
                                "appendMissingElements": {
                                    "values": [ { "integerValue": "2" } ]
                                }
                            }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn transforms_stay_out_of_mask() {
        let body = UpdateWrite::new()
            .set("a", 1i64)
            .increment("b", 1i64)
            .into_commit_body(DOC)
            .unwrap();
        assert_eq!(body["writes"][0]["updateMask"]["fieldPaths"], json!(["a"]));
    }

    #[test]
    fn delete_field_masks_without_value() {
        let body = UpdateWrite::new()
            .delete_field("stale")
            .into_commit_body(DOC)
            .unwrap();
        assert_eq!(body["writes"][0]["updateMask"]["fieldPaths"], json!(["stale"]));
        assert_eq!(body["writes"][0]["update"]["fields"], json!({}));
        assert!(body["writes"][0].get("updateTransforms").is_none());
    }

    #[test]
    fn clear_removes_elements() {
        let body = UpdateWrite::new()
            .clear("tags", vec!["old"])
            .into_commit_body(DOC)
            .unwrap();
        assert_eq!(
            body["writes"][0]["updateTransforms"][0],
            json!({
                "fieldPath": "tags",
                "removeAllFromArray": { "values": [ { "stringValue": "old" } ] }
            })
        );
    }

    #[test]
    fn invalid_field_surfaces_at_encode() {
        let err = UpdateWrite::new()
            .set("", 1i64)
            .into_commit_body(DOC)
            .unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }
}
