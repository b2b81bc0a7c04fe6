//! Query results.
//!
//! A [`ResultSet`] is a snapshot of matching documents borrowed from its
//! collection; it can be refined further (`find`, `limit`, `offset`,
//! sorting) without touching the collection. A [`TrackedResultSet`] is
//! registered with the collection and kept in sync with every later
//! insert, update and remove.

use crate::collection::Collection;
use crate::document::Document;
use crate::error::CoreResult;
use crate::query::{ExecContext, Query};
use crate::types::{DocId, ViewId};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use vellum_codec::{sort_helper, Value};

/// Documents matching a query, borrowed from a collection.
#[derive(Debug, Clone)]
pub struct ResultSet<'c> {
    collection: &'c Collection,
    rows: Vec<&'c Document>,
}

impl<'c> ResultSet<'c> {
    pub(crate) fn new(collection: &'c Collection, rows: Vec<&'c Document>) -> Self {
        Self { collection, rows }
    }

    /// Narrows the result with another query, run against these rows only.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for invalid definitions.
    pub fn find(self, definition: &serde_json::Value) -> CoreResult<Self> {
        let query = self.collection.compile(definition)?;
        let ctx = self.collection.exec_context();
        let rows = query.resolve_with(&self.rows, &ctx);
        Ok(Self { rows, ..self })
    }

    /// Narrows the result with an already compiled query.
    pub fn find_query(self, query: &Query) -> Self {
        let ctx = self.collection.exec_context();
        let rows = query.resolve_with(&self.rows, &ctx);
        Self { rows, ..self }
    }

    /// Keeps the rows for which `f` returns true.
    #[must_use]
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Document) -> bool,
    {
        self.rows.retain(|doc| f(doc));
        self
    }

    /// Keeps at most `n` rows.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Skips the first `n` rows.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.rows.drain(..n.min(self.rows.len()));
        self
    }

    /// Sorts by one field with the shared ordering helper. Stable.
    #[must_use]
    pub fn simplesort(self, path: &str, desc: bool) -> Self {
        self.compound_sort(&[(path, desc)])
    }

    /// Sorts by several `(field, descending)` keys, first key first. Stable.
    #[must_use]
    pub fn compound_sort(mut self, keys: &[(&str, bool)]) -> Self {
        let accessors: Vec<_> = keys
            .iter()
            .map(|(path, desc)| (self.collection.accessor(path), *desc))
            .collect();
        self.rows.sort_by(|a, b| {
            accessors
                .iter()
                .map(|(accessor, desc)| sort_helper(accessor.get(a), accessor.get(b), *desc))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        self
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row.
    pub fn first(&self) -> Option<&'c Document> {
        self.rows.first().copied()
    }

    /// Borrowed rows.
    pub fn rows(&self) -> &[&'c Document] {
        &self.rows
    }

    /// Owned copies of the rows.
    pub fn data(&self) -> Vec<Document> {
        self.rows.iter().map(|doc| (*doc).clone()).collect()
    }

    /// Identifiers of the rows.
    pub fn ids(&self) -> Vec<DocId> {
        self.rows.iter().filter_map(|doc| doc.id()).collect()
    }

    /// Values at `path` for every row, skipping rows without one.
    pub fn extract(&self, path: &str) -> Vec<Value> {
        let accessor = self.collection.accessor(path);
        self.rows
            .iter()
            .filter_map(|doc| accessor.get(doc).cloned())
            .collect()
    }
}

/// Materialized rows of a tracked result set.
#[derive(Debug)]
pub(crate) struct TrackedView {
    pub(crate) query: Query,
    pub(crate) rows: BTreeMap<DocId, Document>,
    pub(crate) parent: Option<Arc<RwLock<TrackedView>>>,
}

impl TrackedView {
    fn in_parent(&self, id: DocId) -> bool {
        self.parent
            .as_ref()
            .map_or(true, |parent| parent.read().rows.contains_key(&id))
    }

    /// Re-tests a new or changed document.
    pub(crate) fn apply_upsert(&mut self, doc: &Document) {
        let Some(id) = doc.id() else {
            return;
        };
        if self.in_parent(id) && self.query.object_matches(doc) {
            self.rows.insert(id, doc.clone());
        } else {
            self.rows.remove(&id);
        }
    }

    pub(crate) fn apply_remove(&mut self, id: DocId) {
        self.rows.remove(&id);
    }
}

/// A result set kept live by its collection.
///
/// The collection holds only a weak reference: dropping the handle
/// unregisters the view. Chained views keep their parent alive.
#[derive(Debug, Clone)]
pub struct TrackedResultSet {
    id: ViewId,
    view: Arc<RwLock<TrackedView>>,
}

impl TrackedResultSet {
    pub(crate) fn new(id: ViewId, view: Arc<RwLock<TrackedView>>) -> Self {
        Self { id, view }
    }

    pub(crate) fn view(&self) -> &Arc<RwLock<TrackedView>> {
        &self.view
    }

    /// Registration identifier.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The tracked query.
    pub fn query(&self) -> Query {
        self.view.read().query.clone()
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.view.read().rows.len()
    }

    /// Returns true if no document matches.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> Vec<DocId> {
        self.view.read().rows.keys().copied().collect()
    }

    /// Owned copies of the rows, in identifier order.
    pub fn data(&self) -> Vec<Document> {
        self.view.read().rows.values().cloned().collect()
    }

    /// Returns true if the document is in the view.
    pub fn contains(&self, id: DocId) -> bool {
        self.view.read().rows.contains_key(&id)
    }
}

/// Builds the initial rows of a tracked view.
pub(crate) fn materialize(
    query: &Query,
    input: &[&Document],
    ctx: &ExecContext<'_>,
) -> BTreeMap<DocId, Document> {
    query
        .resolve_with(input, ctx)
        .into_iter()
        .filter_map(|doc| doc.id().map(|id| (id, doc.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::collection::Collection;
    use crate::document::Document;
    use crate::types::DocId;
    use serde_json::json;
    use vellum_codec::Value;

    fn people() -> Collection {
        let mut people = Collection::new("people");
        for (name, age) in [("Thomas", 41), ("Markus", 35), ("Anna", 29), ("Thomas", 23)] {
            people
                .insert_one(Document::new().with("name", name).with("age", age))
                .unwrap();
        }
        people
    }

    fn names(docs: &[Document]) -> Vec<String> {
        docs.iter()
            .filter_map(|d| d.get("name").and_then(|v| v.as_text()).map(str::to_string))
            .collect()
    }

    #[test]
    fn chained_find_runs_on_parent_rows() {
        let people = people();
        let thomases = people.find(&json!({"name": "Thomas"})).unwrap();
        assert_eq!(thomases.count(), 2);
        let young = thomases.find(&json!({"lt": {"age": 30}})).unwrap();
        assert_eq!(young.ids(), vec![DocId::new(4)]);
    }

    #[test]
    fn sort_limit_offset() {
        let people = people();
        let sorted = people.find(&json!({})).unwrap().simplesort("age", false);
        assert_eq!(sorted.extract("age"), [23, 29, 35, 41].map(Value::from).to_vec());

        let page = people
            .find(&json!({}))
            .unwrap()
            .simplesort("age", true)
            .offset(1)
            .limit(2);
        assert_eq!(names(&page.data()), vec!["Markus", "Anna"]);
        assert_eq!(page.first().and_then(|d| d.id()), Some(DocId::new(2)));
    }

    #[test]
    fn compound_sort_breaks_ties() {
        let people = people();
        let sorted = people
            .find(&json!({}))
            .unwrap()
            .compound_sort(&[("name", false), ("age", true)]);
        assert_eq!(
            sorted.ids(),
            vec![DocId::new(3), DocId::new(2), DocId::new(1), DocId::new(4)]
        );
    }

    #[test]
    fn filter_and_offset_past_end() {
        let people = people();
        let over_thirty = people
            .find(&json!({}))
            .unwrap()
            .filter(|doc| doc.get("age").and_then(|v| v.as_integer()).is_some_and(|a| a > 30));
        assert_eq!(over_thirty.count(), 2);
        assert!(over_thirty.offset(10).is_empty());
    }
}
