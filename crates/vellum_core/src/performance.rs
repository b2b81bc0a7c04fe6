//! Advisory index creation from usage counters.
//!
//! Leaves record a miss on the index kind their operator demands whenever
//! no usable index answered them. [`PerformanceManager::plan`] turns paths that
//! missed often enough into index descriptors; the collection creates
//! them between operations and resets the counters.

use crate::index::{IndexDescriptor, IndexKind, IndexManager};

/// Decides which indices to create.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceManager {
    threshold: u64,
}

impl PerformanceManager {
    /// Creates a manager that builds an index after `threshold` misses.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// Returns the miss threshold.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Indices worth creating, in path order.
    ///
    /// A path that already has a binary or tree index gets no second
    /// ordered index.
    pub fn plan(&self, indices: &IndexManager) -> Vec<IndexDescriptor> {
        let mut planned: Vec<IndexDescriptor> = Vec::new();
        for (descriptor, usage) in indices.usage() {
            if usage.misses < self.threshold || !descriptor.kind.is_ordered() {
                continue;
            }
            let ordered_exists = [IndexKind::Binary, IndexKind::Tree]
                .into_iter()
                .any(|kind| indices.has_index(&descriptor.path, kind));
            let already_planned = planned.iter().any(|p| p.path == descriptor.path);
            if !ordered_exists && !already_planned {
                planned.push(descriptor);
            }
        }
        planned
    }
}
