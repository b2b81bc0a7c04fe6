//! # Vellum Codec
//!
//! Dynamic document values for Vellum.
//!
//! This crate provides:
//! - [`Value`], the schema-less value stored in documents and used as query literals
//! - The shared ordering helpers used by range operators, sorting and sorted indices
//! - JSON conversion for query definitions and document input
//! - CBOR encoding for persistence adapters
//!
//! ## Usage
//!
//! ```
//! use vellum_codec::{from_cbor, lt_helper, to_cbor, Value};
//!
//! let value = Value::from(42);
//! let bytes = to_cbor(&value).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), value);
//!
//! // Missing values sort below everything that is defined.
//! assert!(lt_helper(None, Some(&Value::from(5)), false));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod compare;
mod error;
mod json;
mod value;

pub use cbor::{from_cbor, to_cbor};
pub use compare::{compare_values, gt_helper, loose_eq, lt_helper, sort_helper, strict_eq};
pub use error::{CodecError, CodecResult};
pub use value::Value;
