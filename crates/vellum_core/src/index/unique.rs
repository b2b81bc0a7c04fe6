//! Unique hash index.

use crate::accessor::Accessor;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::index::key::HashKey;
use crate::index::traits::{probe_values, settle_after_insert, Index, IndexDescriptor, IndexKind, IndexState};
use crate::operators::OperatorKind;
use crate::types::DocId;
use std::collections::HashMap;
use vellum_codec::{strict_eq, Value};

/// One-to-one mapping from value to document.
///
/// Missing and null values are not indexed, so any number of documents
/// may leave the field unset. Neither are values containing NaN.
#[derive(Debug)]
pub struct UniqueIndex {
    descriptor: IndexDescriptor,
    accessor: Accessor,
    keys: HashMap<HashKey, DocId>,
    reverse: HashMap<DocId, HashKey>,
    state: IndexState,
}

impl UniqueIndex {
    /// Creates an empty unique index on `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let descriptor = IndexDescriptor::new(path, IndexKind::Unique);
        let accessor = Accessor::compile(&descriptor.path);
        Self {
            descriptor,
            accessor,
            keys: HashMap::new(),
            reverse: HashMap::new(),
            state: IndexState::Empty,
        }
    }

    /// Returns the document holding `value`, if any.
    pub fn get(&self, value: &Value) -> Option<DocId> {
        self.keys.get(&HashKey::of(value)).copied()
    }

    fn key_of(&self, doc: &Document) -> Option<(Value, HashKey)> {
        match self.accessor.get(doc) {
            None | Some(Value::Null) => None,
            // Values holding NaN equal nothing, not even themselves.
            Some(value) if !strict_eq(value, value) => None,
            Some(value) => Some((value.clone(), HashKey::of(value))),
        }
    }
}

impl Index for UniqueIndex {
    fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    fn state(&self) -> IndexState {
        self.state
    }

    fn set_state(&mut self, state: IndexState) {
        self.state = state;
    }

    fn add_document(&mut self, doc: &Document) -> CoreResult<()> {
        let id = doc
            .id()
            .ok_or_else(|| CoreError::invalid_document("document has no identifier"))?;
        let Some((value, key)) = self.key_of(doc) else {
            return Ok(());
        };
        match self.keys.get(&key) {
            Some(existing) if *existing != id => {
                return Err(CoreError::duplicate_key(&self.descriptor.path, value.to_string()));
            }
            Some(_) => {}
            None => {
                self.keys.insert(key.clone(), id);
                self.reverse.insert(id, key);
            }
        }
        settle_after_insert(&mut self.state);
        Ok(())
    }

    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        let Some(id) = doc.id() else {
            return Ok(false);
        };
        match self.reverse.remove(&id) {
            Some(key) => {
                self.keys.remove(&key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_document(&self, value: &Value) -> Vec<DocId> {
        if value.is_null() {
            return Vec::new();
        }
        self.get(value).into_iter().collect()
    }

    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>> {
        if !matches!(op, OperatorKind::Eq | OperatorKind::In) {
            return None;
        }
        let values = probe_values(op, probe)?;
        // Null matches documents that were never indexed.
        if values.iter().any(Value::is_null) {
            return None;
        }
        Some(values.iter().flat_map(|v| self.find_document(v)).collect())
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.reverse.clear();
        self.state = IndexState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, email: impl Into<Value>) -> Document {
        let mut doc = Document::new().with("email", email);
        doc.set_id(DocId::new(id));
        doc
    }

    #[test]
    fn rejects_duplicate_value() {
        let mut index = UniqueIndex::new("email");
        index.add_document(&doc(1, "a@x")).unwrap();
        let err = index.add_document(&doc(2, "a@x")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
        assert_eq!(index.get(&Value::from("a@x")), Some(DocId::new(1)));
    }

    #[test]
    fn nulls_are_not_indexed() {
        let mut index = UniqueIndex::new("email");
        index.add_document(&doc(1, Value::Null)).unwrap();
        index.add_document(&doc(2, Value::Null)).unwrap();
        index.add_document(&Document::new().with("other", 1)).unwrap_err();
        assert!(index.is_empty());
        assert_eq!(index.find(OperatorKind::Eq, &Value::Null), None);
    }

    fn addressed(id: u64, address: Value) -> Document {
        let mut doc = Document::new().with("address", address);
        doc.set_id(DocId::new(id));
        doc
    }

    #[test]
    fn distinct_composites_coexist() {
        let mut index = UniqueIndex::new("address");
        index.add_document(&addressed(1, Value::map([("city", "Oslo")]))).unwrap();
        index.add_document(&addressed(2, Value::map([("city", "Graz")]))).unwrap();
        index.add_document(&addressed(3, Value::from(vec![1, 2]))).unwrap();
        index.add_document(&addressed(4, Value::from(vec!["1,2"]))).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(
            index.get(&Value::map([("city", "Graz")])),
            Some(DocId::new(2))
        );

        let err = index
            .add_document(&addressed(5, Value::from(vec![1.0, 2.0])))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
    }

    #[test]
    fn map_keys_ignore_field_order() {
        let mut index = UniqueIndex::new("address");
        index
            .add_document(&addressed(1, Value::map([("city", "Oslo"), ("zip", "0150")])))
            .unwrap();
        assert_eq!(
            index.get(&Value::map([("zip", "0150"), ("city", "Oslo")])),
            Some(DocId::new(1))
        );
    }

    #[test]
    fn large_integral_float_collides_with_integer() {
        let mut index = UniqueIndex::new("email");
        index.add_document(&doc(1, 10_000_000_000_000_000i64)).unwrap();
        assert!(index.add_document(&doc(2, 1e16)).is_err());
        assert_eq!(
            index.find(OperatorKind::Eq, &Value::Float(1e16)),
            Some(vec![DocId::new(1)])
        );
    }

    #[test]
    fn nan_values_are_not_indexed() {
        let mut index = UniqueIndex::new("email");
        index.add_document(&doc(1, f64::NAN)).unwrap();
        index.add_document(&doc(2, f64::NAN)).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.find(OperatorKind::Eq, &Value::Float(f64::NAN)), Some(vec![]));
    }

    #[test]
    fn update_moves_key() {
        let mut index = UniqueIndex::new("email");
        let old = doc(1, "a@x");
        let new = doc(1, "b@x");
        index.add_document(&old).unwrap();
        index.update_document(&old, &new).unwrap();
        assert_eq!(index.get(&Value::from("a@x")), None);
        assert_eq!(index.find(OperatorKind::Eq, &Value::from("b@x")), Some(vec![DocId::new(1)]));
    }

    #[test]
    fn failed_update_restores_old_key() {
        let mut index = UniqueIndex::new("email");
        index.add_document(&doc(1, "a@x")).unwrap();
        index.add_document(&doc(2, "b@x")).unwrap();
        assert!(index.update_document(&doc(2, "b@x"), &doc(2, "a@x")).is_err());
        assert_eq!(index.get(&Value::from("b@x")), Some(DocId::new(2)));
    }
}
