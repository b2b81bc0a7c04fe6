//! Schema-less documents.
//!
//! A document is an ordered list of named fields. Two field names are
//! reserved and managed by the collection:
//! - `$docId`: the identifier assigned on insert
//! - `$meta`: creation/update timestamps and a revision counter

use crate::error::{CoreError, CoreResult};
use crate::types::DocId;
use std::time::{SystemTime, UNIX_EPOCH};
use vellum_codec::Value;

/// Reserved field holding the document identifier.
pub const ID_FIELD: &str = "$docId";

/// Reserved field holding document metadata.
pub const META_FIELD: &str = "$meta";

/// Bookkeeping stored under [`META_FIELD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocMeta {
    /// Insert time, milliseconds since the epoch.
    pub created: i64,
    /// Last update time, if the document was ever updated.
    pub updated: Option<i64>,
    /// Number of updates applied since insert.
    pub revision: u64,
}

impl DocMeta {
    fn to_value(self) -> Value {
        let mut fields = vec![
            ("created".to_string(), Value::Integer(self.created)),
            ("revision".to_string(), Value::Integer(i64::try_from(self.revision).unwrap_or(i64::MAX))),
        ];
        if let Some(updated) = self.updated {
            fields.push(("updated".to_string(), Value::Integer(updated)));
        }
        Value::Map(fields)
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            created: value.get("created")?.as_integer()?,
            updated: value.get("updated").and_then(Value::as_integer),
            revision: value
                .get("revision")
                .and_then(Value::as_integer)
                .and_then(|r| u64::try_from(r).ok())
                .unwrap_or(0),
        })
    }
}

/// A document stored in a collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from a map value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the value is not a map.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(CoreError::invalid_document(format!(
                "expected a map, got {}",
                other.type_name()
            ))),
        }
    }

    /// Creates a document from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the JSON is not an object.
    pub fn from_json(json: &serde_json::Value) -> CoreResult<Self> {
        Self::from_value(Value::from_json(json))
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Sets a top-level field, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Removes a top-level field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Returns the fields in order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Returns the assigned identifier, if any.
    pub fn id(&self) -> Option<DocId> {
        self.get(ID_FIELD)
            .and_then(Value::as_integer)
            .and_then(|n| u64::try_from(n).ok())
            .map(DocId::new)
    }

    /// Returns the document metadata, if any.
    pub fn meta(&self) -> Option<DocMeta> {
        self.get(META_FIELD).and_then(DocMeta::from_value)
    }

    pub(crate) fn set_id(&mut self, id: DocId) {
        self.set(ID_FIELD, Value::Integer(i64::try_from(id.as_u64()).unwrap_or(i64::MAX)));
    }

    pub(crate) fn set_meta(&mut self, meta: DocMeta) {
        self.set(META_FIELD, meta.to_value());
    }

    /// Removes the reserved identifier and metadata fields.
    pub fn strip_reserved(&mut self) {
        self.remove(ID_FIELD);
        self.remove(META_FIELD);
    }

    /// Converts the document into a map value.
    pub fn to_value(&self) -> Value {
        Value::Map(self.fields.clone())
    }

    /// Converts the document into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Map(doc.fields)
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = CoreError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_json(&json)
    }
}

/// Current wall-clock time in milliseconds since the epoch.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
