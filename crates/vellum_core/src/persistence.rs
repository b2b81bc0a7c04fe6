//! Persistence adapter interface.
//!
//! The collection calls the adapter after each in-memory mutation has
//! completed. Adapter failures are logged and emitted as error events;
//! they never roll back the in-memory state.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexDescriptor;
use crate::types::DocId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use vellum_codec::{from_cbor, to_cbor};

/// Storage backend notified of collection mutations.
pub trait PersistenceAdapter: Send + Sync {
    /// Index descriptors to create when a collection is constructed.
    fn load_indices(&self) -> CoreResult<Vec<IndexDescriptor>>;

    /// A document was inserted.
    fn document_inserted(&self, doc: &Document) -> CoreResult<()>;

    /// A document was updated; `doc` is the new version.
    fn document_updated(&self, doc: &Document) -> CoreResult<()>;

    /// A document was removed; `doc` still carries its identifier.
    fn document_removed(&self, doc: &Document) -> CoreResult<()>;

    /// An index was created.
    fn index_created(&self, _descriptor: &IndexDescriptor) -> CoreResult<()> {
        Ok(())
    }

    /// An index was dropped.
    fn index_removed(&self, _descriptor: &IndexDescriptor) -> CoreResult<()> {
        Ok(())
    }
}

/// In-memory adapter storing CBOR-encoded documents.
#[derive(Debug, Default)]
pub struct MemoryPersistenceAdapter {
    documents: RwLock<BTreeMap<DocId, Vec<u8>>>,
    indices: RwLock<Vec<IndexDescriptor>>,
    failing: AtomicBool,
}

impl MemoryPersistenceAdapter {
    /// Creates an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter that reports `indices` on load.
    pub fn with_indices(indices: Vec<IndexDescriptor>) -> Self {
        Self {
            indices: RwLock::new(indices),
            ..Self::default()
        }
    }

    /// Makes every document write fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Decodes every stored document, in identifier order.
    ///
    /// # Errors
    ///
    /// Returns a codec error if a stored payload is corrupt.
    pub fn documents(&self) -> CoreResult<Vec<Document>> {
        self.documents
            .read()
            .values()
            .map(|bytes| Document::from_value(from_cbor(bytes)?))
            .collect()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored index descriptors.
    pub fn indices(&self) -> Vec<IndexDescriptor> {
        self.indices.read().clone()
    }

    fn store(&self, doc: &Document) -> CoreResult<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(CoreError::persistence("adapter is unavailable"));
        }
        let id = doc
            .id()
            .ok_or_else(|| CoreError::persistence("document has no identifier"))?;
        let bytes = to_cbor(&doc.to_value())?;
        self.documents.write().insert(id, bytes);
        Ok(())
    }
}

impl PersistenceAdapter for MemoryPersistenceAdapter {
    fn load_indices(&self) -> CoreResult<Vec<IndexDescriptor>> {
        Ok(self.indices())
    }

    fn document_inserted(&self, doc: &Document) -> CoreResult<()> {
        self.store(doc)
    }

    fn document_updated(&self, doc: &Document) -> CoreResult<()> {
        self.store(doc)
    }

    fn document_removed(&self, doc: &Document) -> CoreResult<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(CoreError::persistence("adapter is unavailable"));
        }
        if let Some(id) = doc.id() {
            self.documents.write().remove(&id);
        }
        Ok(())
    }

    fn index_created(&self, descriptor: &IndexDescriptor) -> CoreResult<()> {
        let mut indices = self.indices.write();
        if !indices.contains(descriptor) {
            indices.push(descriptor.clone());
        }
        Ok(())
    }

    fn index_removed(&self, descriptor: &IndexDescriptor) -> CoreResult<()> {
        self.indices.write().retain(|existing| existing != descriptor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKind;

    fn doc(id: u64, name: &str) -> Document {
        let mut doc = Document::new().with("name", name);
        doc.set_id(DocId::new(id));
        doc
    }

    #[test]
    fn stores_and_decodes_documents() {
        let adapter = MemoryPersistenceAdapter::new();
        adapter.document_inserted(&doc(1, "Thomas")).unwrap();
        adapter.document_inserted(&doc(2, "Markus")).unwrap();
        adapter.document_updated(&doc(1, "Tom")).unwrap();
        adapter.document_removed(&doc(2, "Markus")).unwrap();

        let stored = adapter.documents().unwrap();
        assert_eq!(stored, vec![doc(1, "Tom")]);
    }

    #[test]
    fn failing_adapter_reports_persistence_errors() {
        let adapter = MemoryPersistenceAdapter::new();
        adapter.set_failing(true);
        let err = adapter.document_inserted(&doc(1, "Thomas")).unwrap_err();
        assert!(matches!(err, CoreError::Persistence { .. }));
        assert!(adapter.is_empty());
    }

    #[test]
    fn index_descriptors_round_trip() {
        let adapter = MemoryPersistenceAdapter::with_indices(vec![IndexDescriptor::new("age", IndexKind::Binary)]);
        let email = IndexDescriptor::new("email", IndexKind::Unique);
        adapter.index_created(&email).unwrap();
        adapter.index_created(&email).unwrap();
        assert_eq!(adapter.load_indices().unwrap().len(), 2);
        adapter.index_removed(&email).unwrap();
        assert_eq!(adapter.indices(), vec![IndexDescriptor::new("age", IndexKind::Binary)]);
    }
}
