//! Collection statistics.
//!
//! All counters are atomic and can be read while operations are in
//! progress. Values only grow.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one collection.
#[derive(Debug, Default)]
pub struct CollectionStats {
    inserts: AtomicU64,
    updates: AtomicU64,
    removes: AtomicU64,
    queries: AtomicU64,
    /// Queries whose compiled graph came from the query cache.
    cache_hits: AtomicU64,
    rebuilds: AtomicU64,
    /// Rejected mutations and persistence failures.
    errors: AtomicU64,
}

impl CollectionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self, cache_hit: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_rebuild(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of inserted documents.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the number of updated documents.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the number of removed documents.
    pub fn removes(&self) -> u64 {
        self.removes.load(Ordering::Relaxed)
    }

    /// Returns the number of compiled or reused queries.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Returns the number of query cache hits.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of index rebuilds.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Returns the number of errors.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts: self.inserts(),
            updates: self.updates(),
            removes: self.removes(),
            queries: self.queries(),
            cache_hits: self.cache_hits(),
            rebuilds: self.rebuilds(),
            errors: self.errors(),
        }
    }
}

/// A point-in-time copy of [`CollectionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Inserted documents.
    pub inserts: u64,
    /// Updated documents.
    pub updates: u64,
    /// Removed documents.
    pub removes: u64,
    /// Queries run.
    pub queries: u64,
    /// Query cache hits.
    pub cache_hits: u64,
    /// Index rebuilds.
    pub rebuilds: u64,
    /// Errors.
    pub errors: u64,
}
