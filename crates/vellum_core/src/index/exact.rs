//! Exact-match hash index.

use crate::accessor::Accessor;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::index::key::HashKey;
use crate::index::traits::{probe_values, settle_after_insert, Index, IndexDescriptor, IndexKind, IndexState};
use crate::operators::OperatorKind;
use crate::types::DocId;
use std::collections::HashMap;
use vellum_codec::Value;

/// Many-to-one mapping from value to documents.
///
/// Documents missing the field are not indexed; explicit nulls are.
#[derive(Debug)]
pub struct ExactIndex {
    descriptor: IndexDescriptor,
    accessor: Accessor,
    buckets: HashMap<HashKey, Vec<DocId>>,
    count: usize,
    state: IndexState,
}

impl ExactIndex {
    /// Creates an empty exact index on `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let descriptor = IndexDescriptor::new(path, IndexKind::Exact);
        let accessor = Accessor::compile(&descriptor.path);
        Self {
            descriptor,
            accessor,
            buckets: HashMap::new(),
            count: 0,
            state: IndexState::Empty,
        }
    }

    /// Number of distinct values.
    pub fn distinct(&self) -> usize {
        self.buckets.len()
    }
}

impl Index for ExactIndex {
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
        let Some(value) = self.accessor.get(doc) else {
            return Ok(());
        };
        let bucket = self.buckets.entry(HashKey::of(value)).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
            self.count += 1;
        }
        settle_after_insert(&mut self.state);
        Ok(())
    }

    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        let (Some(id), Some(value)) = (doc.id(), self.accessor.get(doc)) else {
            return Ok(false);
        };
        let key = HashKey::of(value);
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return Ok(false);
        };
        let Some(pos) = bucket.iter().position(|existing| *existing == id) else {
            return Ok(false);
        };
        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.count -= 1;
        Ok(true)
    }

    fn find_document(&self, value: &Value) -> Vec<DocId> {
        self.buckets.get(&HashKey::of(value)).cloned().unwrap_or_default()
    }

    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>> {
        if !matches!(op, OperatorKind::Eq | OperatorKind::In) {
            return None;
        }
        let values = probe_values(op, probe)?;
        Some(values.iter().flat_map(|v| self.find_document(v)).collect())
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.count = 0;
        self.state = IndexState::Empty;
    }
}
