//! Identifier index.

use crate::document::{Document, ID_FIELD};
use crate::error::{CoreError, CoreResult};
use crate::index::traits::{probe_values, settle_after_insert, Index, IndexDescriptor, IndexKind, IndexState};
use crate::operators::OperatorKind;
use crate::types::DocId;
use vellum_codec::Value;

/// Sorted list of live identifiers.
///
/// The collection stores documents in identifier order, so the position
/// of an identifier here is also the position of its document.
/// `last_id` only ever grows: removing the newest document does not make
/// its identifier available again.
#[derive(Debug)]
pub struct IdIndex {
    descriptor: IndexDescriptor,
    ids: Vec<DocId>,
    last_id: Option<DocId>,
    state: IndexState,
}

impl IdIndex {
    /// Creates an empty identifier index.
    pub fn new() -> Self {
        Self {
            descriptor: IndexDescriptor::new(ID_FIELD, IndexKind::Id),
            ids: Vec::new(),
            last_id: None,
            state: IndexState::Empty,
        }
    }

    /// Returns the identifier the next insert will receive.
    pub fn next_id(&self) -> DocId {
        self.last_id.map_or(DocId::new(1), DocId::next)
    }

    /// Returns the most recently issued identifier.
    pub fn last_id(&self) -> Option<DocId> {
        self.last_id
    }

    /// Resets the issued-identifier watermark after a rejected insert.
    pub(crate) fn restore_last_id(&mut self, last_id: Option<DocId>) {
        self.last_id = last_id;
    }

    /// Binary search for the position of `id`.
    pub fn position(&self, id: DocId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Returns true if `id` is live.
    pub fn contains(&self, id: DocId) -> bool {
        self.position(id).is_some()
    }

    /// Live identifiers in ascending order.
    pub fn ids(&self) -> &[DocId] {
        &self.ids
    }

    fn doc_id(doc: &Document) -> CoreResult<DocId> {
        doc.id()
            .ok_or_else(|| CoreError::invalid_document("document has no identifier"))
    }
}

impl Default for IdIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for IdIndex {
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
        let id = Self::doc_id(doc)?;
        match self.ids.binary_search(&id) {
            Ok(_) => return Err(CoreError::DuplicateIdentifier { id }),
            Err(pos) => self.ids.insert(pos, id),
        }
        self.last_id = Some(self.last_id.map_or(id, |last| last.max(id)));
        settle_after_insert(&mut self.state);
        Ok(())
    }

    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        let id = Self::doc_id(doc)?;
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                self.ids.remove(pos);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    fn update_document(&mut self, old: &Document, new: &Document) -> CoreResult<()> {
        if old.id() != new.id() {
            return Err(CoreError::invalid_operation("updates cannot change a document identifier"));
        }
        Ok(())
    }

    fn find_document(&self, value: &Value) -> Vec<DocId> {
        value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(DocId::new)
            .filter(|id| self.contains(*id))
            .into_iter()
            .collect()
    }

    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>> {
        if !matches!(op, OperatorKind::Eq | OperatorKind::In) {
            return None;
        }
        Some(
            probe_values(op, probe)?
                .iter()
                .flat_map(|value| self.find_document(value))
                .collect(),
        )
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.state = IndexState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64) -> Document {
        let mut doc = Document::new();
        doc.set_id(DocId::new(id));
        doc
    }

    #[test]
    fn next_id_is_monotonic() {
        let mut index = IdIndex::new();
        assert_eq!(index.next_id(), DocId::new(1));

        index.add_document(&doc(1)).unwrap();
        index.add_document(&doc(2)).unwrap();
        assert_eq!(index.next_id(), DocId::new(3));

        index.remove_document(&doc(2)).unwrap();
        assert_eq!(index.next_id(), DocId::new(3));
        assert_eq!(index.ids(), &[DocId::new(1)]);
    }

    #[test]
    fn positions_follow_sorted_order() {
        let mut index = IdIndex::new();
        for id in [1, 2, 3, 4] {
            index.add_document(&doc(id)).unwrap();
        }
        index.remove_document(&doc(2)).unwrap();
        assert_eq!(index.position(DocId::new(3)), Some(1));
        assert_eq!(index.position(DocId::new(2)), None);
    }

    #[test]
    fn duplicate_identifier_rejected() {
        let mut index = IdIndex::new();
        index.add_document(&doc(5)).unwrap();
        let err = index.add_document(&doc(5)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn eq_lookup() {
        let mut index = IdIndex::new();
        index.add_document(&doc(1)).unwrap();
        assert_eq!(index.find(OperatorKind::Eq, &Value::from(1)), Some(vec![DocId::new(1)]));
        assert_eq!(index.find(OperatorKind::Eq, &Value::from(2)), Some(vec![]));
        assert_eq!(index.find(OperatorKind::Gt, &Value::from(0)), None);
        assert_eq!(index.state(), IndexState::Clean);
    }
}
