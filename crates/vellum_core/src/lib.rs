//! # Vellum Core
//!
//! In-memory document store with a compiled query engine.
//!
//! This crate provides:
//! - Collections of schema-less [`Document`]s with stable identifiers
//! - A query compiler turning JSON definitions into reusable operator graphs
//! - Five index kinds (identifier, unique, exact, binary, tree) maintained
//!   on every mutation, eagerly or lazily
//! - Chainable result sets, and tracked result sets that follow mutations
//! - Events, a changes log and a pluggable persistence adapter
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//! use vellum_core::{Collection, CollectionConfig, Document};
//!
//! let config = CollectionConfig::new().unique("email").binary("age");
//! let mut users = Collection::with_config("users", config).unwrap();
//!
//! users.insert_one(Document::new().with("email", "ada@example.com").with("age", 36)).unwrap();
//! users.insert_one(Document::new().with("email", "alan@example.com").with("age", 41)).unwrap();
//!
//! let over_forty = users.find(&json!({"gt": {"age": 40}})).unwrap();
//! assert_eq!(over_forty.count(), 1);
//!
//! // Unique constraint violations leave the collection untouched.
//! assert!(users.insert_one(Document::new().with("email", "ada@example.com")).is_err());
//! assert_eq!(users.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accessor;
mod collection;
mod config;
mod document;
mod error;
mod events;
pub mod index;
mod operators;
mod performance;
mod persistence;
pub mod query;
mod result_set;
mod stats;
mod types;

pub use accessor::{Accessor, AccessorCache};
pub use collection::{BatchInsertReport, Collection};
pub use config::{CollectionConfig, EventDelivery};
pub use document::{DocMeta, Document, ID_FIELD, META_FIELD};
pub use error::{CoreError, CoreResult};
pub use events::{Change, ChangeLog, Event, EventBus, EventKind, ListenerId};
pub use index::{Index, IndexDescriptor, IndexKind, IndexManager, IndexState, IndexUsage};
pub use operators::{evaluate, Condition, Operand, OperatorKind, Predicate, Predicates};
pub use performance::PerformanceManager;
pub use persistence::{MemoryPersistenceAdapter, PersistenceAdapter};
pub use query::{Definition, ExecContext, Operation, OperatorData, Query};
pub use result_set::{ResultSet, TrackedResultSet};
pub use stats::{CollectionStats, StatsSnapshot};
pub use types::{DocId, ViewId};
pub use vellum_codec::Value;
