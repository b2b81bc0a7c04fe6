//! Index trait and descriptor types.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::operators::OperatorKind;
use crate::types::DocId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vellum_codec::Value;

/// Type of index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum IndexKind {
    /// Document identifier index.
    Id = 0,
    /// Unique hash index enforcing one document per value.
    Unique = 1,
    /// Hash index for equality lookups.
    Exact = 2,
    /// Sorted array with binary range search.
    Binary = 3,
    /// Ordered tree for equality and range lookups.
    Tree = 4,
}

impl IndexKind {
    /// Returns the lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Unique => "unique",
            Self::Exact => "exact",
            Self::Binary => "binary",
            Self::Tree => "tree",
        }
    }

    /// Returns true for indices that answer range operators.
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::Binary | Self::Tree)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for IndexKind {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Id),
            1 => Ok(Self::Unique),
            2 => Ok(Self::Exact),
            3 => Ok(Self::Binary),
            4 => Ok(Self::Tree),
            _ => Err(CoreError::invalid_operation(format!(
                "unknown index kind: {value}"
            ))),
        }
    }
}

impl FromStr for IndexKind {
    type Err = CoreError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "id" => Ok(Self::Id),
            "unique" => Ok(Self::Unique),
            "exact" => Ok(Self::Exact),
            "binary" => Ok(Self::Binary),
            "tree" => Ok(Self::Tree),
            _ => Err(CoreError::invalid_operation(format!(
                "unknown index kind: {name}"
            ))),
        }
    }
}

/// The (path, kind) pair identifying an index within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Dotted field path.
    pub path: String,
    /// Index kind.
    pub kind: IndexKind,
}

impl IndexDescriptor {
    /// Creates a descriptor.
    pub fn new(path: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Creates a deterministic index name for a collection.
    #[must_use]
    pub fn canonical_name(&self, collection: &str) -> String {
        format!("__idx_{}_{}_{:?}", collection, self.path, self.kind)
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.path)
    }
}

/// Lifecycle state of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Created, never populated.
    Empty,
    /// Being filled from the document set.
    Populating,
    /// Reflects the current document set.
    Clean,
    /// Stale; must be rebuilt before it may answer queries.
    Dirty,
}

/// Core index trait.
///
/// Indices read the value at their path from each document they are
/// given; the collection guarantees every mutation reaches every index.
pub trait Index: Send + Sync {
    /// Returns the (path, kind) this index serves.
    fn descriptor(&self) -> &IndexDescriptor;

    /// Returns the lifecycle state.
    fn state(&self) -> IndexState;

    /// Sets the lifecycle state.
    fn set_state(&mut self, state: IndexState);

    /// Returns true if the index must not answer queries.
    fn is_dirty(&self) -> bool {
        self.state() == IndexState::Dirty
    }

    /// Flags the index stale.
    fn mark_dirty(&mut self) {
        self.set_state(IndexState::Dirty);
    }

    /// Inserts a document's value.
    fn add_document(&mut self, doc: &Document) -> CoreResult<()>;

    /// Removes a document's entry. Returns false if it was not indexed.
    fn remove_document(&mut self, doc: &Document) -> CoreResult<bool>;

    /// Moves a document from its old value to its new one.
    ///
    /// Always a remove followed by an add; on failure the old entry is
    /// restored before the error is returned.
    fn update_document(&mut self, old: &Document, new: &Document) -> CoreResult<()> {
        self.remove_document(old)?;
        if let Err(err) = self.add_document(new) {
            self.add_document(old)?;
            return Err(err);
        }
        Ok(())
    }

    /// Point lookup of every document whose value equals `value`.
    fn find_document(&self, value: &Value) -> Vec<DocId>;

    /// Answers `op` against `probe`.
    ///
    /// Returns `None` when this index cannot answer exactly, in which
    /// case the caller scans. A returned candidate set never misses a
    /// match; callers still verify each candidate.
    fn find(&self, op: OperatorKind, probe: &Value) -> Option<Vec<DocId>>;

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and returns to `Empty`.
    fn clear(&mut self);

    /// Repopulates the index from scratch.
    fn rebuild(&mut self, docs: &[Document]) -> CoreResult<()> {
        self.clear();
        self.set_state(IndexState::Populating);
        for doc in docs {
            if let Err(err) = self.add_document(doc) {
                self.set_state(IndexState::Dirty);
                return Err(err);
            }
        }
        self.set_state(IndexState::Clean);
        Ok(())
    }
}

/// Marks an `Empty` index clean once it receives its first entry.
pub(crate) fn settle_after_insert(state: &mut IndexState) {
    if *state == IndexState::Empty {
        *state = IndexState::Clean;
    }
}

/// Values of an `in` probe, or the probe itself for other operators.
pub(crate) fn probe_values(op: OperatorKind, probe: &Value) -> Option<&[Value]> {
    match op {
        OperatorKind::In => probe.as_array(),
        _ => Some(std::slice::from_ref(probe)),
    }
}
