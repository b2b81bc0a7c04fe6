//! Property accessor compiler.
//!
//! A dotted path such as `address.city` or `tags.0` is parsed once into
//! segments and reused for every document. Numeric segments index into
//! arrays; on maps they are ordinary keys. Literal dots cannot be escaped.

use crate::document::Document;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use vellum_codec::Value;

#[derive(Debug, Clone)]
struct Segment {
    name: String,
    index: Option<usize>,
}

/// Compiled extractor for one dotted path.
#[derive(Debug, Clone)]
pub struct Accessor {
    path: String,
    segments: Vec<Segment>,
}

impl Accessor {
    /// Compiles a dotted path.
    pub fn compile(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|name| Segment {
                name: name.to_string(),
                index: name.parse().ok(),
            })
            .collect();
        Self {
            path: path.to_string(),
            segments,
        }
    }

    /// Returns the source path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Extracts the value at this path, or `None` when any segment is missing.
    pub fn get<'d>(&self, doc: &'d Document) -> Option<&'d Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = doc.get(&first.name)?;
        for segment in rest {
            current = match current {
                Value::Array(_) => current.get_index(segment.index?)?,
                _ => current.get(&segment.name)?,
            };
        }
        Some(current)
    }
}

/// Per-collection cache of compiled accessors keyed by path.
#[derive(Debug, Default)]
pub struct AccessorCache {
    accessors: RwLock<HashMap<String, Arc<Accessor>>>,
}

impl AccessorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached accessor for `path`, compiling it on first use.
    pub fn get_or_compile(&self, path: &str) -> Arc<Accessor> {
        if let Some(accessor) = self.accessors.read().get(path) {
            return Arc::clone(accessor);
        }
        let mut accessors = self.accessors.write();
        Arc::clone(accessors.entry(path.to_string()).or_insert_with(|| {
            trace!(path, "compiled property accessor");
            Arc::new(Accessor::compile(path))
        }))
    }

    /// Returns the number of compiled paths.
    pub fn len(&self) -> usize {
        self.accessors.read().len()
    }

    /// Returns true if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_json(&json!({
            "name": "Thomas",
            "address": {"city": "Graz", "zip": {"code": 8010}},
            "tags": ["a", "b"],
            "slots": {"0": "zero"}
        }))
        .unwrap()
    }

    #[test]
    fn top_level_and_nested() {
        let doc = doc();
        assert_eq!(Accessor::compile("name").get(&doc), Some(&Value::from("Thomas")));
        assert_eq!(
            Accessor::compile("address.zip.code").get(&doc),
            Some(&Value::Integer(8010))
        );
    }

    #[test]
    fn numeric_segments() {
        let doc = doc();
        assert_eq!(Accessor::compile("tags.1").get(&doc), Some(&Value::from("b")));
        assert_eq!(Accessor::compile("tags.5").get(&doc), None);
        assert_eq!(Accessor::compile("slots.0").get(&doc), Some(&Value::from("zero")));
    }

    #[test]
    fn missing_segments_yield_none() {
        let doc = doc();
        assert_eq!(Accessor::compile("address.street").get(&doc), None);
        assert_eq!(Accessor::compile("name.first").get(&doc), None);
        assert_eq!(Accessor::compile("nope.deeper").get(&doc), None);
    }

    #[test]
    fn cache_compiles_once() {
        let cache = AccessorCache::new();
        let a = cache.get_or_compile("address.city");
        let b = cache.get_or_compile("address.city");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
