//! Index implementations and the per-collection index manager.
//!
//! # Index Types
//!
//! - [`IdIndex`]: sorted identifiers, position lookup for the collection
//! - [`UniqueIndex`]: one document per value, enforces the constraint
//! - [`ExactIndex`]: hash buckets for equality lookups
//! - [`BinaryIndex`]: sorted array with binary range search
//! - [`TreeIndex`]: ordered map for equality and range lookups
//!
//! Every index moves through `Empty → Populating → Clean`, and becomes
//! `Dirty` when it stops reflecting the document set. A dirty index must
//! never answer a query.

mod binary;
mod exact;
mod id;
mod key;
mod manager;
mod traits;
mod tree;
mod unique;

pub use binary::{BinaryIndex, IndexRange};
pub use exact::ExactIndex;
pub use id::IdIndex;
pub use key::{FamilyCounts, HashKey, OrderedKey, ValueFamily};
pub use manager::{IndexManager, IndexUsage};
pub use traits::{Index, IndexDescriptor, IndexKind, IndexState};
pub use tree::TreeIndex;
pub use unique::UniqueIndex;
