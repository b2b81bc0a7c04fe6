//! Ordered tree index.

use crate::accessor::Accessor;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::index::key::{FamilyCounts, OrderedKey};
use crate::index::traits::{settle_after_insert, Index, IndexDescriptor, IndexKind, IndexState};
use crate::operators::OperatorKind;
use crate::types::DocId;
use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};
use vellum_codec::Value;

/// BTree-based index for ordered traversal and range queries.
///
/// `TreeIndex` supports:
/// - Equality and `in` lookups
/// - Range queries (greater than, less than, between)
/// - Ordered iteration
///
/// Like [`BinaryIndex`](crate::index::BinaryIndex), documents missing the
/// field are indexed under the missing key.
#[derive(Debug)]
pub struct TreeIndex {
    descriptor: IndexDescriptor,
    accessor: Accessor,
    entries: BTreeMap<OrderedKey, Vec<DocId>>,
    count: usize,
    families: FamilyCounts,
    state: IndexState,
}

impl TreeIndex {
    /// Creates an empty tree index on `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let descriptor = IndexDescriptor::new(path, IndexKind::Tree);
        let accessor = Accessor::compile(&descriptor.path);
        Self {
            descriptor,
            accessor,
            entries: BTreeMap::new(),
            count: 0,
            families: FamilyCounts::default(),
            state: IndexState::Empty,
        }
    }

    /// Returns documents with values in the given range.
    pub fn range<R>(&self, range: R) -> Vec<DocId>
    where
        R: RangeBounds<OrderedKey>,
    {
        self.entries
            .range(range)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Returns documents with values greater than `value`.
    pub fn greater_than(&self, value: &Value) -> Vec<DocId> {
        self.range((Bound::Excluded(key(value)), Bound::Unbounded))
    }

    /// Returns documents with values greater than or equal to `value`.
    pub fn greater_than_or_equal(&self, value: &Value) -> Vec<DocId> {
        self.range((Bound::Included(key(value)), Bound::Unbounded))
    }

    /// Returns documents with values less than `value`.
    pub fn less_than(&self, value: &Value) -> Vec<DocId> {
        self.range((Bound::Unbounded, Bound::Excluded(key(value))))
    }

    /// Returns documents with values less than or equal to `value`.
    pub fn less_than_or_equal(&self, value: &Value) -> Vec<DocId> {
        self.range((Bound::Unbounded, Bound::Included(key(value))))
    }

    /// Returns documents with values between `lo` and `hi`, inclusive.
    pub fn between(&self, lo: &Value, hi: &Value) -> Vec<DocId> {
        let (lo, hi) = (key(lo), key(hi));
        if lo > hi {
            return Vec::new();
        }
        self.range(lo..=hi)
    }

    /// Returns `(value, id)` pairs in value order.
    pub fn scan_ordered(&self) -> Vec<(Option<&Value>, DocId)> {
        self.entries
            .iter()
            .flat_map(|(k, ids)| ids.iter().map(move |id| (k.0.as_ref(), *id)))
            .collect()
    }

    /// Returns the minimum key.
    pub fn min_key(&self) -> Option<&OrderedKey> {
        self.entries.keys().next()
    }

    /// Returns the maximum key.
    pub fn max_key(&self) -> Option<&OrderedKey> {
        self.entries.keys().next_back()
    }

    /// Number of distinct values.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }
}

fn key(value: &Value) -> OrderedKey {
    OrderedKey(Some(value.clone()))
}

impl Index for TreeIndex {
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
        let value = self.accessor.get(doc);
        let ids = self.entries.entry(OrderedKey(value.cloned())).or_default();
        if !ids.contains(&id) {
            ids.push(id);
            self.count += 1;
            self.families.add(value);
        }
        settle_after_insert(&mut self.state);
        Ok(())
    }

    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        let Some(id) = doc.id() else {
            return Ok(false);
        };
        let key = OrderedKey(self.accessor.get(doc).cloned());
        let Some(ids) = self.entries.get_mut(&key) else {
            return Ok(false);
        };
        let Some(pos) = ids.iter().position(|existing| *existing == id) else {
            return Ok(false);
        };
        ids.remove(pos);
        if ids.is_empty() {
            self.entries.remove(&key);
        }
        self.count -= 1;
        self.families.remove(key.0.as_ref());
        Ok(true)
    }

    fn find_document(&self, value: &Value) -> Vec<DocId> {
        self.entries.get(&key(value)).cloned().unwrap_or_default()
    }

    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>> {
        let items = match (op, probe.as_array()) {
            (OperatorKind::In | OperatorKind::Between, Some(items)) => items,
            (OperatorKind::In | OperatorKind::Between, None) => return None,
            _ => std::slice::from_ref(probe),
        };
        if !items.iter().all(|item| self.families.serves(item)) {
            return None;
        }
        match op {
            OperatorKind::Eq => Some(self.find_document(probe)),
            OperatorKind::In => Some(items.iter().flat_map(|v| self.find_document(v)).collect()),
            OperatorKind::Gt => Some(self.greater_than(probe)),
            OperatorKind::Gte => Some(self.greater_than_or_equal(probe)),
            OperatorKind::Lt => Some(self.less_than(probe)),
            OperatorKind::Lte => Some(self.less_than_or_equal(probe)),
            OperatorKind::Between => match items {
                [lo, hi] => Some(self.between(lo, hi)),
                _ => None,
            },
            _ => None,
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
        self.families.clear();
        self.state = IndexState::Empty;
    }
}
