//! Document fixtures and preloaded collections.

use serde_json::json;
use vellum_core::{Collection, CollectionConfig, Document, IndexKind, Value};

/// The three people used throughout the query examples.
pub fn people() -> Vec<Document> {
    [
        ("Thomas", "Buxhofer"),
        ("Thomas", "Dallapiccola"),
        ("Markus", "Nachbaur"),
    ]
    .into_iter()
    .map(|(name, surname)| person(name, surname))
    .collect()
}

/// A document with `name` and `surname`.
pub fn person(name: &str, surname: &str) -> Document {
    Document::new().with("name", name).with("surname", surname)
}

/// A `people` collection holding [`people`].
pub fn people_collection() -> Collection {
    let mut collection = Collection::new("people");
    let report = collection.insert(people());
    assert!(report.is_complete(), "Failed to insert fixtures: {:?}", report.failures);
    collection
}

/// Richer user records with nested addresses.
pub fn users() -> Vec<Document> {
    [
        json!({"email": "ada@example.com", "age": 36, "tags": ["math", "engines"], "address": {"city": "London"}}),
        json!({"email": "alan@example.com", "age": 41, "tags": ["math"], "address": {"city": "Wilmslow"}}),
        json!({"email": "grace@example.com", "age": 85, "tags": ["cobol", "navy"], "address": {"city": "Arlington"}}),
        json!({"email": "edsger@example.com", "age": 72, "tags": [], "address": {"city": "Nuenen"}}),
        json!({"email": "barbara@example.com", "tags": ["clu"]}),
    ]
    .iter()
    .map(|json| Document::from_json(json).expect("Invalid user fixture"))
    .collect()
}

/// A `users` collection with a unique `email` index and a binary `age` index.
pub fn users_collection() -> Collection {
    let config = CollectionConfig::new()
        .unique("email")
        .index("age", IndexKind::Binary)
        .index("address.city", IndexKind::Exact);
    let mut collection = Collection::with_config("users", config).expect("Invalid users config");
    let report = collection.insert(users());
    assert!(report.is_complete(), "Failed to insert fixtures: {:?}", report.failures);
    collection
}

/// A document carrying a `serial` number and, unless `None`, an `age`.
pub fn aged(serial: usize, age: Option<Value>) -> Document {
    let doc = Document::new().with("serial", serial as i64);
    match age {
        Some(age) => doc.with("age", age),
        None => doc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_fixture_is_indexed() {
        let users = users_collection();
        assert_eq!(users.len(), 5);
        assert!(users.indices().has_index("email", IndexKind::Unique));
        assert_eq!(users.count(&json!({"eq": {"address.city": "London"}})).unwrap(), 1);
        assert_eq!(users.count(&json!({"gte": {"age": 70}})).unwrap(), 2);
    }

    #[test]
    fn aged_without_age() {
        let doc = aged(3, None);
        assert!(doc.get("age").is_none());
        assert_eq!(doc.get("serial"), Some(&Value::from(3)));
    }
}
