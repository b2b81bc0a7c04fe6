//! Sorted-array index with binary range search.

use crate::accessor::Accessor;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::index::key::{FamilyCounts, OrderedKey};
use crate::index::traits::{settle_after_insert, Index, IndexDescriptor, IndexKind, IndexState};
use crate::operators::OperatorKind;
use crate::types::DocId;
use vellum_codec::Value;

/// Inclusive span of positions in a [`BinaryIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    /// First position.
    pub start: usize,
    /// Last position.
    pub end: usize,
}

impl IndexRange {
    fn inclusive(start: usize, end_exclusive: usize) -> Option<Self> {
        (start < end_exclusive).then(|| Self {
            start,
            end: end_exclusive - 1,
        })
    }

    /// Number of positions covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; empty ranges are represented as `None`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Index keeping `(value, id)` pairs sorted by value.
///
/// Every document is indexed, including those missing the field, since
/// missing values take part in ordering comparisons.
#[derive(Debug)]
pub struct BinaryIndex {
    descriptor: IndexDescriptor,
    accessor: Accessor,
    entries: Vec<(OrderedKey, DocId)>,
    families: FamilyCounts,
    state: IndexState,
}

impl BinaryIndex {
    /// Creates an empty binary index on `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let descriptor = IndexDescriptor::new(path, IndexKind::Binary);
        let accessor = Accessor::compile(&descriptor.path);
        Self {
            descriptor,
            accessor,
            entries: Vec::new(),
            families: FamilyCounts::default(),
            state: IndexState::Empty,
        }
    }

    /// First position whose value is not less than `probe`.
    pub fn calculate_range_start(&self, probe: &Value) -> usize {
        let key = OrderedKey(Some(probe.clone()));
        self.entries.partition_point(|(k, _)| *k < key)
    }

    /// First position whose value is greater than `probe`.
    pub fn calculate_range_end(&self, probe: &Value) -> usize {
        let key = OrderedKey(Some(probe.clone()));
        self.entries.partition_point(|(k, _)| *k <= key)
    }

    /// Positions holding values that satisfy `op` against `probe`.
    ///
    /// Returns `None` when nothing matches. Supports `eq`, the four range
    /// operators and `between` with a `[lo, hi]` probe.
    pub fn calculate_range(&self, op: OperatorKind, probe: &Value) -> Option<IndexRange> {
        let len = self.entries.len();
        let (min, max) = (&self.entries.first()?.0, &self.entries.last()?.0);
        let key = OrderedKey(Some(probe.clone()));
        match op {
            OperatorKind::Gt if key >= *max => return None,
            OperatorKind::Lt if key <= *min => return None,
            _ => {}
        }
        match op {
            OperatorKind::Eq => IndexRange::inclusive(
                self.calculate_range_start(probe),
                self.calculate_range_end(probe),
            ),
            OperatorKind::Gt => IndexRange::inclusive(self.calculate_range_end(probe), len),
            OperatorKind::Gte => IndexRange::inclusive(self.calculate_range_start(probe), len),
            OperatorKind::Lt => IndexRange::inclusive(0, self.calculate_range_start(probe)),
            OperatorKind::Lte => IndexRange::inclusive(0, self.calculate_range_end(probe)),
            OperatorKind::Between => match probe.as_array() {
                Some([lo, hi]) => IndexRange::inclusive(
                    self.calculate_range_start(lo),
                    self.calculate_range_end(hi),
                ),
                _ => None,
            },
            _ => None,
        }
    }

    /// Identifiers stored in `range`, in value order.
    pub fn ids_in(&self, range: IndexRange) -> Vec<DocId> {
        self.entries[range.start..=range.end].iter().map(|(_, id)| *id).collect()
    }

    /// Smallest indexed value.
    pub fn min_key(&self) -> Option<&OrderedKey> {
        self.entries.first().map(|(k, _)| k)
    }

    /// Largest indexed value.
    pub fn max_key(&self) -> Option<&OrderedKey> {
        self.entries.last().map(|(k, _)| k)
    }

    fn serves(&self, op: OperatorKind, probe: &Value) -> bool {
        match (op, probe.as_array()) {
            (OperatorKind::Between | OperatorKind::In, Some(items)) => {
                items.iter().all(|item| self.families.serves(item))
            }
            _ => self.families.serves(probe),
        }
    }
}

impl Index for BinaryIndex {
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
        let key = OrderedKey(value.cloned());
        let pos = self.entries.partition_point(|(k, _)| *k <= key);
        self.entries.insert(pos, (key, id));
        self.families.add(value);
        settle_after_insert(&mut self.state);
        Ok(())
    }

    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        let Some(id) = doc.id() else {
            return Ok(false);
        };
        let key = OrderedKey(self.accessor.get(doc).cloned());
        let start = self.entries.partition_point(|(k, _)| *k < key);
        let end = self.entries.partition_point(|(k, _)| *k <= key);
        let pos = self.entries[start..end]
            .iter()
            .position(|(_, existing)| *existing == id)
            .map(|offset| start + offset)
            .or_else(|| self.entries.iter().position(|(_, existing)| *existing == id));
        match pos {
            Some(pos) => {
                let (key, _) = self.entries.remove(pos);
                self.families.remove(key.0.as_ref());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_document(&self, value: &Value) -> Vec<DocId> {
        self.calculate_range(OperatorKind::Eq, value)
            .map(|range| self.ids_in(range))
            .unwrap_or_default()
    }

    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>> {
        if !self.serves(op, probe) {
            return None;
        }
        match op {
            OperatorKind::In => Some(
                probe
                    .as_array()?
                    .iter()
                    .flat_map(|item| self.find_document(item))
                    .collect(),
            ),
            OperatorKind::Eq
            | OperatorKind::Gt
            | OperatorKind::Gte
            | OperatorKind::Lt
            | OperatorKind::Lte
            | OperatorKind::Between => Some(
                self.calculate_range(op, probe)
                    .map(|range| self.ids_in(range))
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.families.clear();
        self.state = IndexState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, age: impl Into<Value>) -> Document {
        let mut doc = Document::new().with("age", age);
        doc.set_id(DocId::new(id));
        doc
    }

    fn ages(values: &[i64]) -> BinaryIndex {
        let mut index = BinaryIndex::new("age");
        for (i, age) in values.iter().enumerate() {
            index.add_document(&doc(i as u64 + 1, *age)).unwrap();
        }
        index
    }

    fn sorted(mut ids: Vec<DocId>) -> Vec<u64> {
        ids.sort();
        ids.into_iter().map(DocId::as_u64).collect()
    }

    #[test]
    fn gte_ignores_insertion_order() {
        let index = ages(&[5, 1, 9, 3, 7]);
        let ids = index.find(OperatorKind::Gte, &Value::from(5)).unwrap();
        assert_eq!(sorted(ids), vec![1, 3, 5]);
    }

    #[test]
    fn range_bounds() {
        let index = ages(&[1, 3, 3, 3, 5]);
        assert_eq!(index.calculate_range_start(&Value::from(3)), 1);
        assert_eq!(index.calculate_range_end(&Value::from(3)), 4);
        assert_eq!(
            index.calculate_range(OperatorKind::Eq, &Value::from(3)),
            Some(IndexRange { start: 1, end: 3 })
        );
        assert_eq!(
            index.calculate_range(OperatorKind::Lt, &Value::from(3)),
            Some(IndexRange { start: 0, end: 0 })
        );
        assert_eq!(index.calculate_range(OperatorKind::Eq, &Value::from(4)), None);
    }

    #[test]
    fn strict_operators_reject_outside_bounds() {
        let index = ages(&[1, 5]);
        assert_eq!(index.calculate_range(OperatorKind::Gt, &Value::from(5)), None);
        assert_eq!(index.calculate_range(OperatorKind::Lt, &Value::from(1)), None);
        assert_eq!(index.find(OperatorKind::Gt, &Value::from(10)), Some(vec![]));
    }

    #[test]
    fn between_is_inclusive() {
        let index = ages(&[1, 4, 6, 10, 12]);
        let probe = Value::from(vec![4, 10]);
        assert_eq!(sorted(index.find(OperatorKind::Between, &probe).unwrap()), vec![2, 3, 4]);
        let inverted = Value::from(vec![10, 4]);
        assert_eq!(index.find(OperatorKind::Between, &inverted), Some(vec![]));
    }

    #[test]
    fn missing_values_sort_first() {
        let mut index = ages(&[3]);
        let mut bare = Document::new();
        bare.set_id(DocId::new(9));
        index.add_document(&bare).unwrap();
        assert_eq!(index.find(OperatorKind::Lt, &Value::from(3)), Some(vec![DocId::new(9)]));
        assert!(index.remove_document(&bare).unwrap());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn mixed_families_fall_back_to_scan() {
        let mut index = ages(&[3]);
        index.add_document(&doc(2, "three")).unwrap();
        assert_eq!(index.find(OperatorKind::Gt, &Value::from(1)), None);
        assert!(index.find(OperatorKind::Gt, &Value::Null).is_some());
    }

    #[test]
    fn update_moves_entry() {
        let mut index = ages(&[1, 2, 3]);
        index.update_document(&doc(1, 1), &doc(1, 10)).unwrap();
        assert_eq!(index.max_key(), Some(&OrderedKey(Some(Value::from(10)))));
        assert_eq!(index.find_document(&Value::from(10)), vec![DocId::new(1)]);
        assert!(index.find_document(&Value::from(1)).is_empty());
    }
}
