//! Cross-module test helpers.
//!
//! [`scan_ids`] is the oracle: it resolves a definition with no index
//! access at all. [`ModelHarness`] drives a collection with generated
//! mutations and checks it against that oracle.

use crate::generators::Mutation;
use serde_json::Value as Json;
use tracing::debug;
use vellum_core::{
    Collection, CollectionConfig, CoreResult, DocId, Document, IndexKind, Query, TrackedResultSet,
    Value,
};

/// Identifiers matched by a forced linear scan over `docs`.
pub fn scan_ids(docs: &[Document], definition: &Json) -> CoreResult<Vec<DocId>> {
    let query = Query::compile(definition)?;
    let refs: Vec<&Document> = docs.iter().collect();
    Ok(ids_of(query.resolve(&refs)))
}

/// Identifiers of `docs`, in order.
pub fn ids_of<'d>(docs: impl IntoIterator<Item = &'d Document>) -> Vec<DocId> {
    docs.into_iter().filter_map(Document::id).collect()
}

/// Sorted copy of `ids`.
pub fn sorted(mut ids: Vec<DocId>) -> Vec<DocId> {
    ids.sort_unstable();
    ids
}

/// A collection with a tracked query, checked against forced scans.
pub struct ModelHarness {
    /// The collection under test.
    pub collection: Collection,
    definition: Json,
    tracked: TrackedResultSet,
    assigned: Vec<DocId>,
}

impl ModelHarness {
    /// Creates a collection with every ordered and hash index on `age`,
    /// tracking `definition`.
    pub fn new(definition: Json, adaptive: bool) -> Self {
        let config = CollectionConfig::new()
            .adaptive_indices(adaptive)
            .index("age", IndexKind::Binary)
            .index("age", IndexKind::Tree)
            .index("age", IndexKind::Exact)
            .unique("serial");
        let mut collection = Collection::with_config("model", config).expect("Invalid config");
        let tracked = collection
            .find_tracked(&definition)
            .expect("Failed to track query");
        Self {
            collection,
            definition,
            tracked,
            assigned: Vec::new(),
        }
    }

    /// Applies one mutation.
    pub fn apply(&mut self, mutation: &Mutation) {
        debug!(?mutation, "applying mutation");
        match mutation {
            Mutation::Insert(age) => {
                let serial = self.assigned.len();
                let id = self
                    .collection
                    .insert_one(crate::fixtures::aged(serial, age.clone()))
                    .expect("Failed to insert");
                self.assigned.push(id);
            }
            Mutation::Update(slot, age) => {
                let Some(mut doc) = self.pick(*slot).cloned() else {
                    return;
                };
                match age {
                    Some(age) => doc.set("age", age.clone()),
                    None => {
                        doc.remove("age");
                    }
                }
                self.collection.update(doc).expect("Failed to update");
            }
            Mutation::Remove(slot) => {
                let Some(id) = self.pick(*slot).and_then(Document::id) else {
                    return;
                };
                self.collection.remove(id).expect("Failed to remove");
            }
        }
    }

    fn pick(&self, slot: usize) -> Option<&Document> {
        let docs = self.collection.documents();
        if docs.is_empty() {
            return None;
        }
        docs.get(slot % docs.len())
    }

    /// Identifiers assigned by inserts so far, in insertion order.
    pub fn assigned(&self) -> &[DocId] {
        &self.assigned
    }

    /// Tracked identifiers, ascending.
    pub fn tracked_ids(&self) -> Vec<DocId> {
        self.tracked.ids()
    }

    /// Identifiers the collection returns for the tracked definition.
    pub fn queried_ids(&self) -> Vec<DocId> {
        let result = self
            .collection
            .find(&self.definition)
            .expect("Failed to query");
        ids_of(result.rows().iter().copied())
    }

    /// Identifiers a forced scan returns for the tracked definition.
    pub fn expected_ids(&self) -> Vec<DocId> {
        scan_ids(self.collection.documents(), &self.definition).expect("Failed to scan")
    }

    /// Values currently stored at `age`.
    pub fn ages(&self) -> Vec<Option<Value>> {
        self.collection
            .documents()
            .iter()
            .map(|doc| doc.get("age").cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn harness_tracks_inserts_and_removes() {
        let mut harness = ModelHarness::new(json!({"gte": {"age": 5}}), true);
        for age in [5, 1, 9] {
            harness.apply(&Mutation::Insert(Some(Value::from(age))));
        }
        harness.apply(&Mutation::Remove(0));
        harness.apply(&Mutation::Update(0, None));
        assert_eq!(harness.tracked_ids(), vec![DocId::new(3)]);
        assert_eq!(harness.tracked_ids(), sorted(harness.expected_ids()));
        assert_eq!(harness.queried_ids(), harness.expected_ids());
        assert_eq!(harness.ages(), vec![None, Some(Value::from(9))]);
    }
}
