//! Per-collection index registry.
//!
//! The manager owns every index of one collection, keyed by
//! `(path, kind)`, and forwards each document mutation to all of them.
//!
//! # Invariants
//!
//! - At most one index exists per `(path, kind)` pair
//! - A mutation either reaches every clean index or none of them
//! - Dirty indices are never consulted; they wait for `ensure_index`
//! - Every lookup records exactly one usage sample

use crate::document::{Document, ID_FIELD};
use crate::error::{CoreError, CoreResult};
use crate::index::{
    BinaryIndex, ExactIndex, IdIndex, Index, IndexDescriptor, IndexKind, TreeIndex, UniqueIndex,
};
use crate::operators::OperatorKind;
use crate::types::DocId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use vellum_codec::Value;

/// Lookup counters for one `(path, kind)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexUsage {
    /// Number of lookups.
    pub requests: u64,
    /// Lookups answered by a clean index.
    pub hits: u64,
    /// Lookups that found no usable index.
    pub misses: u64,
}

/// Owns the indices of one collection.
pub struct IndexManager {
    id_index: IdIndex,
    indices: Vec<Box<dyn Index>>,
    usage: RwLock<HashMap<IndexDescriptor, IndexUsage>>,
    adaptive: bool,
}

impl IndexManager {
    /// Creates a manager holding only the identifier index.
    ///
    /// With `adaptive` false, ordered indices are flagged dirty on every
    /// mutation instead of being updated in place.
    pub fn new(adaptive: bool) -> Self {
        Self {
            id_index: IdIndex::new(),
            indices: Vec::new(),
            usage: RwLock::new(HashMap::new()),
            adaptive,
        }
    }

    /// Returns the identifier index.
    pub fn id_index(&self) -> &IdIndex {
        &self.id_index
    }

    /// Returns the identifier the next insert will receive.
    pub fn next_id(&self) -> DocId {
        self.id_index.next_id()
    }

    /// Returns true if ordered indices are maintained on every mutation.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Switches between adaptive and lazy maintenance.
    ///
    /// Leaving lazy mode does not rebuild anything; indices flagged dirty
    /// meanwhile stay dirty until `ensure_index`.
    pub fn set_adaptive(&mut self, adaptive: bool) {
        self.adaptive = adaptive;
    }

    /// Descriptors of all secondary indices, in creation order.
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.indices.iter().map(|i| i.descriptor().clone()).collect()
    }

    /// Returns true if an index exists for `(path, kind)`.
    ///
    /// Unlike [`get_index`](Self::get_index) this does not count as a lookup.
    pub fn has_index(&self, path: &str, kind: IndexKind) -> bool {
        self.lookup(path, kind).is_some()
    }

    fn lookup(&self, path: &str, kind: IndexKind) -> Option<&dyn Index> {
        if kind == IndexKind::Id {
            return (path == ID_FIELD).then_some(&self.id_index as &dyn Index);
        }
        self.position(path, kind).map(|pos| self.indices[pos].as_ref())
    }

    fn position(&self, path: &str, kind: IndexKind) -> Option<usize> {
        self.indices.iter().position(|i| {
            let descriptor = i.descriptor();
            descriptor.kind == kind && descriptor.path == path
        })
    }

    fn record(&self, descriptor: IndexDescriptor, hit: bool) {
        let mut usage = self.usage.write();
        let entry = usage.entry(descriptor).or_default();
        entry.requests += 1;
        if hit {
            entry.hits += 1;
        } else {
            entry.misses += 1;
        }
    }

    /// Returns the index for `(path, kind)` and records the lookup.
    ///
    /// A dirty index is still returned but counts as a miss.
    pub fn get_index(&self, path: &str, kind: IndexKind) -> Option<&dyn Index> {
        let index = self.lookup(path, kind);
        self.record(
            IndexDescriptor::new(path, kind),
            index.is_some_and(|i| !i.is_dirty()),
        );
        index
    }

    fn serving<'a: 'p, 'p>(&'a self, path: &'p str, op: OperatorKind) -> impl Iterator<Item = &'a dyn Index> + 'p {
        op.index_candidates()
            .iter()
            .filter_map(move |kind| self.lookup(path, *kind))
            .filter(|index| !index.is_dirty())
    }

    /// Picks the first clean index able to serve `op` on `path`.
    ///
    /// Selection alone records no usage; see [`IndexManager::probe`].
    pub fn select(&self, path: &str, op: OperatorKind) -> Option<&dyn Index> {
        self.serving(path, op).next()
    }

    /// Answers `op` from the first clean index that accepts `value`.
    ///
    /// Records one usage sample: a hit on the index that answered, or a
    /// miss on the kind `op` demands when every candidate was absent,
    /// dirty or declined the lookup.
    pub fn probe(&self, path: &str, op: OperatorKind, value: &Value) -> Option<(IndexDescriptor, Vec<DocId>)> {
        for index in self.serving(path, op) {
            if let Some(ids) = index.find(op, value) {
                let descriptor = index.descriptor().clone();
                self.record(descriptor.clone(), true);
                return Some((descriptor, ids));
            }
        }
        if let Some(kind) = op.demanded_index() {
            self.record(IndexDescriptor::new(path, kind), false);
        }
        None
    }

    /// Answers `op` through the index for `(path, kind)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] if no such index exists and
    /// [`CoreError::StaleIndex`] if it is dirty.
    pub fn find(
        &self,
        path: &str,
        kind: IndexKind,
        op: OperatorKind,
        probe: &Value,
    ) -> CoreResult<Option<Vec<DocId>>> {
        let index = self.get_index(path, kind).ok_or_else(|| CoreError::IndexNotFound {
            path: path.to_string(),
            kind,
        })?;
        if index.is_dirty() {
            return Err(CoreError::StaleIndex {
                path: path.to_string(),
                kind,
            });
        }
        Ok(index.find(op, probe))
    }

    /// Creates and backfills an index from `docs`.
    ///
    /// Returns false if the index already existed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if a unique index cannot be
    /// built over the existing documents; nothing is registered then.
    pub fn create_index(&mut self, path: &str, kind: IndexKind, docs: &[Document]) -> CoreResult<bool> {
        if kind == IndexKind::Id {
            if path == ID_FIELD {
                return Ok(false);
            }
            return Err(CoreError::invalid_operation(format!(
                "identifier index can only be built on `{ID_FIELD}`"
            )));
        }
        if self.position(path, kind).is_some() {
            return Ok(false);
        }
        let mut index = build_index(path, kind);
        index.rebuild(docs)?;
        debug!(path, %kind, entries = index.len(), "created index");
        self.indices.push(index);
        Ok(true)
    }

    /// Unregisters and discards the index for `(path, kind)`.
    pub fn nuke_index(&mut self, path: &str, kind: IndexKind) -> bool {
        let Some(pos) = self.position(path, kind) else {
            return false;
        };
        self.indices.remove(pos);
        self.usage.write().remove(&IndexDescriptor::new(path, kind));
        debug!(path, %kind, "dropped index");
        true
    }

    /// Rebuilds the index for `(path, kind)` if dirty, or always with `force`.
    ///
    /// Returns true if a rebuild happened.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] for an unknown pair, or the
    /// rebuild error, leaving the index dirty.
    pub fn ensure_index(
        &mut self,
        path: &str,
        kind: IndexKind,
        force: bool,
        docs: &[Document],
    ) -> CoreResult<bool> {
        let pos = self.position(path, kind).ok_or_else(|| CoreError::IndexNotFound {
            path: path.to_string(),
            kind,
        })?;
        let index = &mut self.indices[pos];
        if !force && !index.is_dirty() {
            return Ok(false);
        }
        index.rebuild(docs)?;
        debug!(path, %kind, entries = index.len(), "rebuilt index");
        Ok(true)
    }

    /// Rebuilds every dirty index, or every index with `force`.
    ///
    /// Returns the descriptors that were rebuilt.
    ///
    /// # Errors
    ///
    /// Stops at the first failing rebuild.
    pub fn ensure_all(&mut self, force: bool, docs: &[Document]) -> CoreResult<Vec<IndexDescriptor>> {
        let mut rebuilt = Vec::new();
        for index in &mut self.indices {
            if force || index.is_dirty() {
                index.rebuild(docs)?;
                rebuilt.push(index.descriptor().clone());
            }
        }
        Ok(rebuilt)
    }

    /// Flags every secondary index dirty.
    pub fn flag_dirty(&mut self) {
        for index in &mut self.indices {
            index.mark_dirty();
        }
    }

    /// Returns true if the mutation should skip `index`.
    ///
    /// Lazy mode turns ordered indices dirty instead of updating them.
    fn defer(adaptive: bool, index: &mut dyn Index) -> bool {
        if index.is_dirty() {
            return true;
        }
        if !adaptive && index.descriptor().kind.is_ordered() {
            index.mark_dirty();
            return true;
        }
        false
    }

    /// Adds a document to every index.
    ///
    /// # Errors
    ///
    /// On failure every index that already accepted the document is
    /// rolled back before the error is returned.
    pub fn add_document(&mut self, doc: &Document) -> CoreResult<()> {
        let last_id = self.id_index.last_id();
        self.id_index.add_document(doc)?;
        let adaptive = self.adaptive;
        let mut applied = Vec::new();
        let mut failure = None;
        for (pos, index) in self.indices.iter_mut().enumerate() {
            if Self::defer(adaptive, index.as_mut()) {
                continue;
            }
            if let Err(err) = index.add_document(doc) {
                failure = Some(err);
                break;
            }
            applied.push(pos);
        }
        let Some(err) = failure else {
            return Ok(());
        };
        for pos in applied {
            let _ = self.indices[pos].remove_document(doc);
        }
        let _ = self.id_index.remove_document(doc);
        self.id_index.restore_last_id(last_id);
        Err(err)
    }

    /// Moves a document from `old` to `new` in every index.
    ///
    /// # Errors
    ///
    /// On failure every index that already moved is moved back.
    pub fn update_document(&mut self, old: &Document, new: &Document) -> CoreResult<()> {
        self.id_index.update_document(old, new)?;
        let adaptive = self.adaptive;
        let mut applied = Vec::new();
        let mut failure = None;
        for (pos, index) in self.indices.iter_mut().enumerate() {
            if Self::defer(adaptive, index.as_mut()) {
                continue;
            }
            if let Err(err) = index.update_document(old, new) {
                failure = Some(err);
                break;
            }
            applied.push(pos);
        }
        let Some(err) = failure else {
            return Ok(());
        };
        for pos in applied {
            let index = &mut self.indices[pos];
            if let Err(restore) = index.update_document(new, old) {
                warn!(error = %restore, index = %index.descriptor(), "index rollback failed, marking dirty");
                index.mark_dirty();
            }
        }
        Err(err)
    }

    /// Removes a document from every index.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document carries no identifier.
    pub fn remove_document(&mut self, doc: &Document) -> CoreResult<bool> {
        if doc.id().is_none() {
            return Err(CoreError::invalid_document("document has no identifier"));
        }
        let removed = self.id_index.remove_document(doc)?;
        let adaptive = self.adaptive;
        for index in &mut self.indices {
            if Self::defer(adaptive, index.as_mut()) {
                continue;
            }
            index.remove_document(doc)?;
        }
        Ok(removed)
    }

    /// Empties every index. Issued identifiers are not reused afterwards.
    pub fn clear(&mut self) {
        self.id_index.clear();
        for index in &mut self.indices {
            index.clear();
        }
    }

    /// Snapshot of the usage counters.
    pub fn usage(&self) -> Vec<(IndexDescriptor, IndexUsage)> {
        let mut usage: Vec<_> = self.usage.read().iter().map(|(d, u)| (d.clone(), *u)).collect();
        usage.sort_by(|a, b| (&a.0.path, a.0.kind as u8).cmp(&(&b.0.path, b.0.kind as u8)));
        usage
    }

    /// Counters for one pair.
    pub fn usage_of(&self, path: &str, kind: IndexKind) -> IndexUsage {
        self.usage
            .read()
            .get(&IndexDescriptor::new(path, kind))
            .copied()
            .unwrap_or_default()
    }

    /// Resets all usage counters.
    pub fn reset_usage(&self) {
        self.usage.write().clear();
    }
}

impl fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexManager")
            .field("ids", &self.id_index.len())
            .field("indices", &self.descriptors())
            .field("adaptive", &self.adaptive)
            .finish()
    }
}

/// Closed factory from kind to implementation.
fn build_index(path: &str, kind: IndexKind) -> Box<dyn Index> {
    match kind {
        IndexKind::Id => Box::new(IdIndex::new()),
        IndexKind::Unique => Box::new(UniqueIndex::new(path)),
        IndexKind::Exact => Box::new(ExactIndex::new(path)),
        IndexKind::Binary => Box::new(BinaryIndex::new(path)),
        IndexKind::Tree => Box::new(TreeIndex::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, email: &str, age: i64) -> Document {
        let mut doc = Document::new().with("email", email).with("age", age);
        doc.set_id(DocId::new(id));
        doc
    }

    fn manager_with(docs: &[Document]) -> IndexManager {
        let mut manager = IndexManager::new(true);
        for doc in docs {
            manager.add_document(doc).unwrap();
        }
        manager
    }

    #[test]
    fn create_index_backfills() {
        let docs = vec![doc(1, "a", 30), doc(2, "b", 40)];
        let mut manager = manager_with(&docs);
        assert!(manager.create_index("age", IndexKind::Binary, &docs).unwrap());
        assert!(!manager.create_index("age", IndexKind::Binary, &docs).unwrap());
        assert_eq!(manager.descriptors().len(), 1);

        let ids = manager
            .find("age", IndexKind::Binary, OperatorKind::Gt, &Value::from(35))
            .unwrap();
        assert_eq!(ids, Some(vec![DocId::new(2)]));
    }

    #[test]
    fn unique_violation_rolls_back_every_index() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        manager.create_index("age", IndexKind::Tree, &docs).unwrap();
        manager.create_index("email", IndexKind::Unique, &docs).unwrap();

        let err = manager.add_document(&doc(2, "a", 50)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
        assert!(!manager.id_index().contains(DocId::new(2)));
        assert_eq!(manager.next_id(), DocId::new(2));
        let tree = manager.get_index("age", IndexKind::Tree).unwrap();
        assert!(tree.find_document(&Value::from(50)).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn get_index_counts_once_per_call() {
        let mut manager = IndexManager::new(true);
        manager.create_index("age", IndexKind::Tree, &[]).unwrap();
        manager.get_index("age", IndexKind::Tree);
        manager.get_index("age", IndexKind::Tree);
        manager.get_index("age", IndexKind::Exact);

        assert_eq!(
            manager.usage_of("age", IndexKind::Tree),
            IndexUsage { requests: 2, hits: 2, misses: 0 }
        );
        assert_eq!(manager.usage_of("age", IndexKind::Exact).misses, 1);
        manager.reset_usage();
        assert!(manager.usage().is_empty());
    }

    #[test]
    fn missing_and_stale_indices_are_errors() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        let err = manager
            .find("age", IndexKind::Tree, OperatorKind::Eq, &Value::from(30))
            .unwrap_err();
        assert!(matches!(err, CoreError::IndexNotFound { .. }));

        manager.create_index("age", IndexKind::Tree, &docs).unwrap();
        manager.flag_dirty();
        let err = manager
            .find("age", IndexKind::Tree, OperatorKind::Eq, &Value::from(30))
            .unwrap_err();
        assert!(matches!(err, CoreError::StaleIndex { .. }));
        assert!(manager.select("age", OperatorKind::Eq).is_none());

        assert!(manager.ensure_index("age", IndexKind::Tree, false, &docs).unwrap());
        assert!(!manager.ensure_index("age", IndexKind::Tree, false, &docs).unwrap());
        assert!(manager.select("age", OperatorKind::Eq).is_some());
    }

    #[test]
    fn lazy_mode_dirties_ordered_indices() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        manager.create_index("age", IndexKind::Binary, &docs).unwrap();
        manager.create_index("email", IndexKind::Exact, &docs).unwrap();
        manager.set_adaptive(false);

        manager.add_document(&doc(2, "b", 40)).unwrap();
        assert!(manager.get_index("age", IndexKind::Binary).unwrap().is_dirty());
        let exact = manager.get_index("email", IndexKind::Exact).unwrap();
        assert!(!exact.is_dirty());
        assert_eq!(exact.len(), 2);
    }

    #[test]
    fn nuke_index_unregisters() {
        let mut manager = IndexManager::new(true);
        manager.create_index("age", IndexKind::Tree, &[]).unwrap();
        assert!(manager.nuke_index("age", IndexKind::Tree));
        assert!(!manager.nuke_index("age", IndexKind::Tree));
        assert!(!manager.has_index("age", IndexKind::Tree));
    }

    #[test]
    fn declined_lookup_counts_as_miss() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        manager.create_index("age", IndexKind::Binary, &docs).unwrap();

        let (descriptor, ids) = manager.probe("age", OperatorKind::Gt, &Value::from(10)).unwrap();
        assert_eq!(descriptor, IndexDescriptor::new("age", IndexKind::Binary));
        assert_eq!(ids, vec![DocId::new(1)]);

        // Text probes against a numeric index are declined.
        assert!(manager.probe("age", OperatorKind::Gt, &Value::from("10")).is_none());
        assert_eq!(
            manager.usage_of("age", IndexKind::Binary),
            IndexUsage { requests: 2, hits: 1, misses: 1 }
        );
    }

    #[test]
    fn declined_index_falls_through_to_next_candidate() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        manager.create_index("email", IndexKind::Tree, &docs).unwrap();
        manager.create_index("email", IndexKind::Exact, &docs).unwrap();
        manager.add_document(&doc(2, "b", 40)).unwrap();

        let (descriptor, _) = manager
            .probe("email", OperatorKind::Eq, &Value::map([("local", "a")]))
            .unwrap();
        assert_eq!(descriptor.kind, IndexKind::Exact);
        assert_eq!(manager.usage_of("email", IndexKind::Tree).requests, 0);
        assert_eq!(manager.usage_of("email", IndexKind::Exact).hits, 1);
    }

    #[test]
    fn select_prefers_candidate_order() {
        let docs = vec![doc(1, "a", 30)];
        let mut manager = manager_with(&docs);
        manager.create_index("age", IndexKind::Exact, &docs).unwrap();
        manager.create_index("age", IndexKind::Tree, &docs).unwrap();
        let chosen = manager.select("age", OperatorKind::Eq).unwrap();
        assert_eq!(chosen.descriptor().kind, IndexKind::Tree);
        assert!(manager.select("age", OperatorKind::Regex).is_none());
        assert!(manager.select(ID_FIELD, OperatorKind::Eq).is_some());
    }
}
