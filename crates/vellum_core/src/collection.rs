//! Collections.
//!
//! A collection owns its documents, stored in identifier order, the
//! index manager, the compiled-query cache and the registry of tracked
//! result sets. Every mutation goes through [`Collection::insert_one`],
//! [`Collection::update`] or [`Collection::remove`], which keep these in
//! step:
//!
//! 1. indices (all-or-nothing, rolled back on constraint violations)
//! 2. document storage
//! 3. tracked result sets, in registration order
//! 4. changes API, events, persistence adapter
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use vellum_core::{Collection, Document};
//!
//! let mut people = Collection::new("people");
//! people.insert_one(Document::new().with("name", "Thomas").with("surname", "Buxhofer")).unwrap();
//! people.insert_one(Document::new().with("name", "Markus").with("surname", "Nachbaur")).unwrap();
//!
//! let thomases = people.find(&json!({"eq": {"name": "Thomas"}})).unwrap();
//! assert_eq!(thomases.count(), 1);
//! ```

use crate::accessor::{Accessor, AccessorCache};
use crate::config::CollectionConfig;
use crate::document::{now_millis, DocMeta, Document};
use crate::error::{CoreError, CoreResult};
use crate::events::{Change, ChangeLog, Event, EventBus, EventKind, ListenerId};
use crate::index::{Index, IndexDescriptor, IndexKind, IndexManager};
use crate::operators::Predicates;
use crate::performance::PerformanceManager;
use crate::persistence::PersistenceAdapter;
use crate::query::{Definition, ExecContext, Query};
use crate::result_set::{materialize, ResultSet, TrackedResultSet, TrackedView};
use crate::stats::CollectionStats;
use crate::types::{DocId, ViewId};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};
use vellum_codec::{compare_values, strict_eq, Value};

/// Outcome of a batch insert.
///
/// Each document is inserted on its own; a failing document does not
/// stop the batch.
#[derive(Debug, Default)]
pub struct BatchInsertReport {
    /// Identifiers assigned to the inserted documents, in input order.
    pub inserted: Vec<DocId>,
    /// Input position and error of every rejected document.
    pub failures: Vec<(usize, CoreError)>,
}

impl BatchInsertReport {
    /// Returns true if every document was inserted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A named set of documents with indices and live queries.
pub struct Collection {
    name: String,
    config: CollectionConfig,
    documents: Vec<Document>,
    indices: IndexManager,
    accessors: AccessorCache,
    predicates: Predicates,
    queries: Mutex<LruCache<String, Query>>,
    views: BTreeMap<ViewId, Weak<RwLock<TrackedView>>>,
    next_view: u64,
    events: EventBus,
    changes: ChangeLog,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    stats: CollectionStats,
}

impl Collection {
    /// Creates an empty collection with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::empty(name.into(), CollectionConfig::default(), None)
    }

    /// Creates a collection and the indices listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured index is invalid.
    pub fn with_config(name: impl Into<String>, config: CollectionConfig) -> CoreResult<Self> {
        let mut collection = Self::empty(name.into(), config, None);
        collection.create_configured_indices(Vec::new())?;
        Ok(collection)
    }

    /// Creates a collection backed by a persistence adapter.
    ///
    /// Indices reported by [`PersistenceAdapter::load_indices`] are created
    /// alongside the configured ones.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error if loading fails.
    pub fn with_adapter(
        name: impl Into<String>,
        config: CollectionConfig,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> CoreResult<Self> {
        let loaded = adapter.load_indices()?;
        let mut collection = Self::empty(name.into(), config, Some(adapter));
        collection.create_configured_indices(loaded)?;
        Ok(collection)
    }

    fn empty(
        name: String,
        config: CollectionConfig,
        adapter: Option<Arc<dyn PersistenceAdapter>>,
    ) -> Self {
        let cache_size = NonZeroUsize::new(config.query_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            indices: IndexManager::new(config.adaptive_indices),
            events: EventBus::new(config.event_delivery),
            changes: ChangeLog::new(config.changes_api, config.max_history),
            name,
            config,
            documents: Vec::new(),
            accessors: AccessorCache::new(),
            predicates: Predicates::new(),
            queries: Mutex::new(LruCache::new(cache_size)),
            views: BTreeMap::new(),
            next_view: 0,
            adapter,
            stats: CollectionStats::new(),
        }
    }

    fn create_configured_indices(&mut self, loaded: Vec<IndexDescriptor>) -> CoreResult<()> {
        let descriptors: Vec<IndexDescriptor> =
            self.config.indices.iter().cloned().chain(loaded).collect();
        for descriptor in descriptors {
            self.indices
                .create_index(&descriptor.path, descriptor.kind, &self.documents)?;
        }
        Ok(())
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All documents in identifier order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns the index manager.
    pub fn indices(&self) -> &IndexManager {
        &self.indices
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// Returns the cached accessor for `path`.
    pub fn accessor(&self, path: &str) -> Arc<Accessor> {
        self.accessors.get_or_compile(path)
    }

    /// Makes a host predicate available to `where` clauses.
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.predicates.register(name, predicate);
    }

    pub(crate) fn exec_context(&self) -> ExecContext<'_> {
        ExecContext::with_indices(&self.indices, self.config.scan_warning_threshold)
    }

    // === Mutations ===

    /// Inserts a document and returns its new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentifier`] if the document carries
    /// the identifier of a live document and [`CoreError::DuplicateKey`]
    /// on a unique index violation. Nothing is stored in either case.
    pub fn insert_one(&mut self, mut doc: Document) -> CoreResult<DocId> {
        if let Some(id) = doc.id() {
            if self.indices.id_index().contains(id) {
                let err = CoreError::DuplicateIdentifier { id };
                self.reject(&err);
                return Err(err);
            }
        }
        let id = self.indices.next_id();
        doc.set_id(id);
        doc.set_meta(DocMeta {
            created: now_millis(),
            updated: None,
            revision: 0,
        });
        if let Err(err) = self.indices.add_document(&doc) {
            self.reject(&err);
            return Err(err);
        }
        self.documents.push(doc.clone());

        self.notify_views(|view| view.apply_upsert(&doc));
        self.record_change(EventKind::Insert, &doc);
        self.events.emit(Event::insert(doc.clone()));
        self.persist(|adapter| adapter.document_inserted(&doc));
        self.stats.record_insert();
        trace!(collection = %self.name, %id, "inserted document");
        Ok(id)
    }

    /// Inserts several documents, each on its own.
    pub fn insert<I>(&mut self, docs: I) -> BatchInsertReport
    where
        I: IntoIterator<Item = Document>,
    {
        let mut report = BatchInsertReport::default();
        for (position, doc) in docs.into_iter().enumerate() {
            match self.insert_one(doc) {
                Ok(id) => report.inserted.push(id),
                Err(err) => report.failures.push((position, err)),
            }
        }
        debug!(
            collection = %self.name,
            inserted = report.inserted.len(),
            failed = report.failures.len(),
            "batch insert"
        );
        report
    }

    /// Replaces the stored document with the same identifier.
    ///
    /// The metadata revision is incremented and the update time set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] for unknown identifiers and
    /// [`CoreError::DuplicateKey`] on a unique index violation, in which
    /// case the stored document and every index are left unchanged.
    pub fn update(&mut self, mut doc: Document) -> CoreResult<()> {
        let id = doc
            .id()
            .ok_or_else(|| CoreError::invalid_document("document has no identifier"))?;
        let pos = self
            .indices
            .id_index()
            .position(id)
            .ok_or(CoreError::DocumentNotFound { id })?;
        let previous = self.documents[pos].meta();
        let now = now_millis();
        doc.set_meta(DocMeta {
            created: previous.map_or(now, |meta| meta.created),
            updated: Some(now),
            revision: previous.map_or(1, |meta| meta.revision + 1),
        });
        if let Err(err) = self.indices.update_document(&self.documents[pos], &doc) {
            self.reject(&err);
            return Err(err);
        }
        self.documents[pos] = doc.clone();

        self.notify_views(|view| view.apply_upsert(&doc));
        self.record_change(EventKind::Update, &doc);
        self.events.emit(Event::update(doc.clone()));
        self.persist(|adapter| adapter.document_updated(&doc));
        self.stats.record_update();
        trace!(collection = %self.name, %id, "updated document");
        Ok(())
    }

    /// Removes a document and returns it without its identifier and metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] for unknown identifiers.
    pub fn remove(&mut self, id: DocId) -> CoreResult<Document> {
        let pos = self
            .indices
            .id_index()
            .position(id)
            .ok_or(CoreError::DocumentNotFound { id })?;
        if let Err(err) = self.indices.remove_document(&self.documents[pos]) {
            self.reject(&err);
            return Err(err);
        }
        let mut doc = self.documents.remove(pos);

        self.notify_views(|view| view.apply_remove(id));
        self.record_change(EventKind::Delete, &doc);
        self.events.emit(Event::delete(doc.clone()));
        self.persist(|adapter| adapter.document_removed(&doc));
        self.stats.record_remove();
        trace!(collection = %self.name, %id, "removed document");

        doc.strip_reserved();
        Ok(doc)
    }

    /// Applies `f` to every matching document and stores the result.
    ///
    /// Returns the number of updated documents.
    ///
    /// # Errors
    ///
    /// Returns compilation errors and the first update error.
    pub fn find_and_update<F>(&mut self, definition: &serde_json::Value, f: F) -> CoreResult<usize>
    where
        F: FnMut(&mut Document),
    {
        let ids = self.find(definition)?.ids();
        self.update_each(&ids, f)
    }

    /// Removes every matching document and returns them.
    ///
    /// # Errors
    ///
    /// Returns compilation errors.
    pub fn find_and_remove(&mut self, definition: &serde_json::Value) -> CoreResult<Vec<Document>> {
        let ids = self.find(definition)?.ids();
        self.remove_each(&ids)
    }

    /// Applies `f` to the documents with the given identifiers, typically
    /// the `ids()` of a result set, and stores the results.
    ///
    /// Unknown identifiers are skipped. Stops at the first failing update;
    /// earlier updates stay applied. The identifier cannot be changed by `f`.
    ///
    /// # Errors
    ///
    /// Returns the first update error.
    pub fn update_each<F>(&mut self, ids: &[DocId], mut f: F) -> CoreResult<usize>
    where
        F: FnMut(&mut Document),
    {
        let mut updated = 0;
        for &id in ids {
            let Some(mut doc) = self.get(id).cloned() else {
                continue;
            };
            f(&mut doc);
            doc.set_id(id);
            self.update(doc)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Removes the documents with the given identifiers, skipping unknown ones.
    ///
    /// # Errors
    ///
    /// Returns the first removal error.
    pub fn remove_each(&mut self, ids: &[DocId]) -> CoreResult<Vec<Document>> {
        let mut removed = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.indices.id_index().contains(id) {
                removed.push(self.remove(id)?);
            }
        }
        Ok(removed)
    }

    /// Removes every document. Identifiers already issued are not reused.
    ///
    /// Every removed document is reported the way [`Collection::remove`]
    /// reports it, to listeners and to the persistence adapter.
    pub fn clear(&mut self) {
        let removed = std::mem::take(&mut self.documents);
        self.indices.clear();
        self.notify_views(|view| view.rows.clear());
        for doc in &removed {
            self.record_change(EventKind::Delete, doc);
            self.events.emit(Event::delete(doc.clone()));
            self.persist(|adapter| adapter.document_removed(doc));
            self.stats.record_remove();
        }
        debug!(collection = %self.name, removed = removed.len(), "cleared collection");
    }

    fn reject(&self, err: &CoreError) {
        debug!(collection = %self.name, error = %err, "mutation rejected");
        self.stats.record_error();
        self.events.emit(Event::error(err.to_string()));
    }

    fn notify_views<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut TrackedView),
    {
        // Ascending ids: a parent view is always processed before its children.
        self.views.retain(|_, weak| match weak.upgrade() {
            Some(view) => {
                f(&mut view.write());
                true
            }
            None => false,
        });
    }

    fn record_change(&self, operation: EventKind, doc: &Document) {
        if self.changes.is_enabled() {
            self.changes.record(Change {
                collection: self.name.clone(),
                operation,
                document: doc.clone(),
            });
        }
    }

    fn persist<F>(&self, f: F)
    where
        F: FnOnce(&dyn PersistenceAdapter) -> CoreResult<()>,
    {
        let Some(adapter) = &self.adapter else {
            return;
        };
        if let Err(err) = f(adapter.as_ref()) {
            warn!(collection = %self.name, error = %err, "persistence adapter failed");
            self.stats.record_error();
            self.events.emit(Event::error(err.to_string()));
        }
    }

    // === Reads ===

    /// Returns the document with identifier `id`.
    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.indices
            .id_index()
            .position(id)
            .and_then(|pos| self.documents.get(pos))
    }

    /// Returns the document whose `path` equals `value`, through a unique
    /// index when one exists.
    pub fn by(&self, path: &str, value: impl Into<Value>) -> Option<&Document> {
        let value = value.into();
        if !value.is_null() {
            if let Some(index) = self.indices.get_index(path, IndexKind::Unique) {
                if !index.is_dirty() {
                    return index
                        .find_document(&value)
                        .first()
                        .and_then(|id| self.get(*id));
                }
            }
        }
        let accessor = self.accessor(path);
        self.documents
            .iter()
            .find(|doc| accessor.get(doc).is_some_and(|v| strict_eq(v, &value)))
    }

    /// Compiles a definition, reusing the cached graph of an earlier query
    /// with the same structure.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid definitions.
    pub fn compile(&self, definition: &serde_json::Value) -> CoreResult<Query> {
        let definition = Definition::parse(definition)?;
        let structure = definition.structure_signature();
        let cached = self.queries.lock().get(&structure).cloned();
        if let Some(cached) = cached {
            let query = cached.rebind(&definition, &self.predicates)?;
            self.stats.record_query(true);
            return Ok(query);
        }
        let query = Query::from_definition(&definition, &self.predicates, &self.accessors)?;
        debug!(collection = %self.name, structure = %structure, "compiled query");
        self.queries.lock().put(structure, query.clone());
        self.stats.record_query(false);
        Ok(query)
    }

    /// Number of compiled query structures currently cached.
    pub fn cached_queries(&self) -> usize {
        self.queries.lock().len()
    }

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid definitions.
    pub fn find(&self, definition: &serde_json::Value) -> CoreResult<ResultSet<'_>> {
        let query = self.compile(definition)?;
        Ok(self.find_query(&query))
    }

    /// Runs an already compiled query.
    pub fn find_query(&self, query: &Query) -> ResultSet<'_> {
        let all: Vec<&Document> = self.documents.iter().collect();
        ResultSet::new(self, query.resolve_with(&all, &self.exec_context()))
    }

    /// Returns the first matching document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid definitions.
    pub fn find_one(&self, definition: &serde_json::Value) -> CoreResult<Option<&Document>> {
        Ok(self.find(definition)?.first())
    }

    /// Number of matching documents.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid definitions.
    pub fn count(&self, definition: &serde_json::Value) -> CoreResult<usize> {
        Ok(self.find(definition)?.count())
    }

    // === Tracked result sets ===

    /// Runs a query and keeps its result in sync with later mutations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid definitions.
    pub fn find_tracked(&mut self, definition: &serde_json::Value) -> CoreResult<TrackedResultSet> {
        let query = self.compile(definition)?;
        let all: Vec<&Document> = self.documents.iter().collect();
        let rows = materialize(&query, &all, &self.exec_context());
        Ok(self.register_view(TrackedView {
            query,
            rows,
            parent: None,
        }))
    }

    /// Tracks a query over the rows of another tracked result set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `parent` is not tracked
    /// by this collection, or a compilation error.
    pub fn chain_tracked(
        &mut self,
        parent: &TrackedResultSet,
        definition: &serde_json::Value,
    ) -> CoreResult<TrackedResultSet> {
        if !self.is_tracked(parent) {
            return Err(CoreError::invalid_operation(format!(
                "{} is not tracked by collection `{}`",
                parent.id(),
                self.name
            )));
        }
        let query = self.compile(definition)?;
        let rows = {
            let parent_view = parent.view().read();
            let input: Vec<&Document> = parent_view.rows.values().collect();
            materialize(&query, &input, &ExecContext::default())
        };
        Ok(self.register_view(TrackedView {
            query,
            rows,
            parent: Some(Arc::clone(parent.view())),
        }))
    }

    fn register_view(&mut self, view: TrackedView) -> TrackedResultSet {
        self.next_view += 1;
        let id = ViewId(self.next_view);
        let view = Arc::new(RwLock::new(view));
        self.views.insert(id, Arc::downgrade(&view));
        debug!(collection = %self.name, view = %id, rows = view.read().rows.len(), "tracking result set");
        TrackedResultSet::new(id, view)
    }

    /// Stops tracking a result set. Its rows are frozen from now on.
    ///
    /// Returns false if the set was not tracked by this collection.
    pub fn release(&mut self, tracked: &TrackedResultSet) -> bool {
        let registered = self.is_tracked(tracked);
        if registered {
            self.views.remove(&tracked.id());
            debug!(collection = %self.name, view = %tracked.id(), "released result set");
        }
        registered
    }

    /// Returns true if `tracked` is registered with this collection.
    pub fn is_tracked(&self, tracked: &TrackedResultSet) -> bool {
        self.views
            .get(&tracked.id())
            .and_then(Weak::upgrade)
            .is_some_and(|view| Arc::ptr_eq(&view, tracked.view()))
    }

    /// Number of tracked result sets still alive.
    pub fn tracked_count(&self) -> usize {
        self.views.values().filter(|view| view.strong_count() > 0).count()
    }

    // === Indices ===

    /// Creates and backfills an index. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if a unique index cannot be
    /// built over the current documents.
    pub fn create_index(&mut self, path: &str, kind: IndexKind) -> CoreResult<bool> {
        let created = self.indices.create_index(path, kind, &self.documents)?;
        if created {
            let descriptor = IndexDescriptor::new(path, kind);
            self.persist(|adapter| adapter.index_created(&descriptor));
        }
        Ok(created)
    }

    /// Creates a unique index on `path` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if existing documents share a value.
    pub fn ensure_unique_index(&mut self, path: &str) -> CoreResult<()> {
        self.create_index(path, IndexKind::Unique).map(|_| ())
    }

    /// Drops an index. Returns false if it did not exist.
    pub fn nuke_index(&mut self, path: &str, kind: IndexKind) -> bool {
        let removed = self.indices.nuke_index(path, kind);
        if removed {
            let descriptor = IndexDescriptor::new(path, kind);
            self.persist(|adapter| adapter.index_removed(&descriptor));
        }
        removed
    }

    /// Rebuilds an index if dirty, or always with `force`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] for unknown indices.
    pub fn ensure_index(&mut self, path: &str, kind: IndexKind, force: bool) -> CoreResult<bool> {
        let rebuilt = self.indices.ensure_index(path, kind, force, &self.documents)?;
        if rebuilt {
            self.stats.record_rebuild();
            self.events.emit(Event::rebuild(IndexDescriptor::new(path, kind)));
        }
        Ok(rebuilt)
    }

    /// Rebuilds every dirty index, or every index with `force`.
    ///
    /// # Errors
    ///
    /// Returns the first rebuild error.
    pub fn ensure_all_indices(&mut self, force: bool) -> CoreResult<usize> {
        let rebuilt = self.indices.ensure_all(force, &self.documents)?;
        for descriptor in &rebuilt {
            self.stats.record_rebuild();
            self.events.emit(Event::rebuild(descriptor.clone()));
        }
        Ok(rebuilt.len())
    }

    /// Flags every secondary index dirty.
    pub fn flag_indices_dirty(&mut self) {
        self.indices.flag_dirty();
    }

    /// Switches index maintenance mode. Turning adaptive mode on rebuilds
    /// the indices that went dirty meanwhile.
    ///
    /// # Errors
    ///
    /// Returns the first rebuild error.
    pub fn configure(&mut self, adaptive: bool) -> CoreResult<()> {
        self.config.adaptive_indices = adaptive;
        self.indices.set_adaptive(adaptive);
        if adaptive {
            self.ensure_all_indices(false)?;
        }
        Ok(())
    }

    /// Creates the indices the usage counters ask for, then resets them.
    ///
    /// Does nothing unless `auto_index_threshold` is configured. Meant to
    /// run between operations.
    ///
    /// # Errors
    ///
    /// Returns the first index creation error.
    pub fn maintain(&mut self) -> CoreResult<Vec<IndexDescriptor>> {
        let Some(threshold) = self.config.auto_index_threshold else {
            return Ok(Vec::new());
        };
        let planned = PerformanceManager::new(threshold).plan(&self.indices);
        for descriptor in &planned {
            self.create_index(&descriptor.path, descriptor.kind)?;
            debug!(collection = %self.name, index = %descriptor, "created index from usage");
        }
        self.indices.reset_usage();
        Ok(planned)
    }

    // === Events and changes ===

    /// Registers an event listener.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    /// Unregisters an event listener.
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Subscribes to every future event.
    pub fn subscribe(&self) -> Receiver<Event> {
        self.events.subscribe()
    }

    /// Delivers queued events in deferred mode. Returns how many were delivered.
    pub fn flush_events(&self) -> usize {
        self.events.flush()
    }

    /// Recorded changes, oldest first. Empty unless the changes API is enabled.
    pub fn changes(&self) -> Vec<Change> {
        self.changes.changes()
    }

    /// Discards recorded changes.
    pub fn flush_changes(&self) {
        self.changes.flush();
    }

    // === Aggregates ===

    /// Largest defined value at `path` under the shared ordering.
    pub fn max(&self, path: &str) -> Option<Value> {
        let accessor = self.accessor(path);
        self.defined_values(&accessor)
            .max_by(|a, b| compare_values(Some(*a), Some(*b)))
            .cloned()
    }

    /// Smallest defined value at `path` under the shared ordering.
    pub fn min(&self, path: &str) -> Option<Value> {
        let accessor = self.accessor(path);
        self.defined_values(&accessor)
            .min_by(|a, b| compare_values(Some(*a), Some(*b)))
            .cloned()
    }

    /// Mean of the numeric values at `path`.
    pub fn avg(&self, path: &str) -> Option<f64> {
        let accessor = self.accessor(path);
        let numbers: Vec<f64> = self
            .defined_values(&accessor)
            .filter_map(Value::as_number)
            .collect();
        if numbers.is_empty() {
            return None;
        }
        Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
    }

    /// Every defined value at `path`, in identifier order.
    pub fn extract(&self, path: &str) -> Vec<Value> {
        let accessor = self.accessor(path);
        self.defined_values(&accessor).cloned().collect()
    }

    fn defined_values<'a>(&'a self, accessor: &'a Accessor) -> impl Iterator<Item = &'a Value> + 'a {
        self.documents
            .iter()
            .filter_map(move |doc| accessor.get(doc))
            .filter(|value| !value.is_null())
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("documents", &self.documents.len())
            .field("indices", &self.indices)
            .field("tracked", &self.tracked_count())
            .field("cached_queries", &self.cached_queries())
            .field("events", &self.events)
            .finish()
    }
}
