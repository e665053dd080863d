use std::collections::BTreeMap;

use crate::value::Value;

/// One document returned by a read or query: its full resource name plus
/// the decoded field mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub(crate) fn new(name: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The full resource name,
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document identifier (last path segment).
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}
