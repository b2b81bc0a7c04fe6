//! Collection configuration.

use crate::index::{IndexDescriptor, IndexKind};

/// When event listeners run relative to the mutation that emitted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDelivery {
    /// Listeners run to completion before the mutating call returns.
    #[default]
    Sync,
    /// Events queue until [`crate::Collection::flush_events`] is called.
    Deferred,
}

/// Configuration for a collection.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Update range indices in place on every mutation.
    ///
    /// When disabled, mutations only flag binary and tree indices dirty
    /// and they are rebuilt on demand.
    pub adaptive_indices: bool,

    /// Event delivery mode.
    pub event_delivery: EventDelivery,

    /// Record every mutation for the changes API.
    pub changes_api: bool,

    /// Maximum number of recorded changes kept in history.
    pub max_history: usize,

    /// Indices created when the collection is constructed.
    pub indices: Vec<IndexDescriptor>,

    /// Create a demanded index after this many requests missed it (None = never).
    pub auto_index_threshold: Option<u64>,

    /// Log a warning when a linear scan visits more documents than this.
    pub scan_warning_threshold: usize,

    /// Number of compiled query structures kept, least recently used first out.
    pub query_cache_size: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            adaptive_indices: true,
            event_delivery: EventDelivery::Sync,
            changes_api: false,
            max_history: 10_000,
            indices: Vec::new(),
            auto_index_threshold: None,
            scan_warning_threshold: 1000,
            query_cache_size: 256,
        }
    }
}

impl CollectionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether range indices are maintained adaptively.
    #[must_use]
    pub const fn adaptive_indices(mut self, value: bool) -> Self {
        self.adaptive_indices = value;
        self
    }

    /// Sets the event delivery mode.
    #[must_use]
    pub const fn event_delivery(mut self, delivery: EventDelivery) -> Self {
        self.event_delivery = delivery;
        self
    }

    /// Enables or disables the changes API.
    #[must_use]
    pub const fn changes_api(mut self, value: bool) -> Self {
        self.changes_api = value;
        self
    }

    /// Sets the change history limit.
    #[must_use]
    pub const fn max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    /// Adds an index created at construction.
    #[must_use]
    pub fn index(mut self, path: impl Into<String>, kind: IndexKind) -> Self {
        self.indices.push(IndexDescriptor::new(path, kind));
        self
    }

    /// Adds a unique index created at construction.
    #[must_use]
    pub fn unique(self, path: impl Into<String>) -> Self {
        self.index(path, IndexKind::Unique)
    }

    /// Adds a binary (sorted array) index created at construction.
    #[must_use]
    pub fn binary(self, path: impl Into<String>) -> Self {
        self.index(path, IndexKind::Binary)
    }

    /// Sets the auto-index threshold.
    #[must_use]
    pub const fn auto_index_threshold(mut self, threshold: Option<u64>) -> Self {
        self.auto_index_threshold = threshold;
        self
    }

    /// Sets the scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, threshold: usize) -> Self {
        self.scan_warning_threshold = threshold;
        self
    }

    /// Sets the compiled-query cache capacity. Zero keeps a single entry.
    #[must_use]
    pub const fn query_cache_size(mut self, size: usize) -> Self {
        self.query_cache_size = size;
        self
    }
}
