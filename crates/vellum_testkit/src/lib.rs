//! # Vellum Testkit
//!
//! Test utilities for Vellum.
//!
//! This crate provides:
//! - Document fixtures and preloaded collections
//! - Property-based test generators using proptest
//! - A model harness that checks a collection against forced scans
//! - Cross-module scenario and property tests
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use vellum_testkit::prelude::*;
//!
//! init_tracing();
//! let people = people_collection();
//! let thomases = people.find(&json!({"eq": {"name": "Thomas"}})).unwrap();
//! assert_eq!(thomases.count(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;

use tracing_subscriber::EnvFilter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;

/// Installs a `tracing` subscriber for tests.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Calling this
/// more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
