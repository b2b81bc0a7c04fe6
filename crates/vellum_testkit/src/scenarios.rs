//! End-to-end scenarios over the public API.

use crate::fixtures::{people, people_collection, person};
use crate::integration::{ids_of, scan_ids};
use serde_json::json;
use vellum_codec::{lt_helper, Value};
use vellum_core::{
    evaluate, Collection, CollectionConfig, CoreError, DocId, Document, Index, IndexKind, Operand,
    OperatorKind, Query,
};

fn raw(ids: Vec<DocId>) -> Vec<u64> {
    ids.into_iter().map(DocId::as_u64).collect()
}

#[test]
fn and_of_equalities_returns_first_person() {
    crate::init_tracing();
    let people = people_collection();
    let query = Query::compile(&json!({
        "and": [{"eq": {"name": "Thomas"}}, {"eq": {"surname": "Buxhofer"}}]
    }))
    .unwrap();
    let refs: Vec<&Document> = people.documents().iter().collect();
    let matched = query.resolve(&refs);
    assert_eq!(raw(ids_of(matched.iter().copied())), vec![1]);
    assert_eq!(matched[0].get("surname"), Some(&Value::from("Buxhofer")));
}

#[test]
fn tracked_set_picks_up_new_thomas() {
    let mut people = people_collection();
    let thomases = people.find_tracked(&json!({"eq": {"name": "Thomas"}})).unwrap();
    assert_eq!(thomases.count(), 2);
    people.insert_one(person("Thomas", "Urach")).unwrap();
    assert_eq!(thomases.count(), 3);
    assert_eq!(raw(thomases.ids()), vec![1, 2, 4]);
}

#[test]
fn range_query_through_each_ordered_index() {
    for kind in [IndexKind::Binary, IndexKind::Tree] {
        let config = CollectionConfig::new().index("age", kind);
        let mut collection = Collection::with_config("ages", config).unwrap();
        for age in [5, 1, 9, 3, 7] {
            collection.insert_one(Document::new().with("age", age)).unwrap();
        }
        let mut ages: Vec<i64> = collection
            .find(&json!({"gte": {"age": 5}}))
            .unwrap()
            .extract("age")
            .iter()
            .filter_map(Value::as_integer)
            .collect();
        ages.sort_unstable();
        assert_eq!(ages, vec![5, 7, 9], "{kind:?}");
        assert_eq!(collection.indices().usage_of("age", kind).hits, 1);
    }
}

#[test]
fn unique_violation_leaves_no_trace() {
    let mut users = Collection::new("users");
    users.ensure_unique_index("email").unwrap();
    users.create_index("email", IndexKind::Exact).unwrap();
    users.insert_one(Document::new().with("email", "a@x.com")).unwrap();

    let err = users
        .insert_one(Document::new().with("email", "a@x.com").with("second", true))
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateKey { .. }));
    assert_eq!(users.len(), 1);
    assert_eq!(users.count(&json!({"second": true})).unwrap(), 0);
    assert_eq!(users.count(&json!({"eq": {"email": "a@x.com"}})).unwrap(), 1);
    let exact = users.indices().get_index("email", IndexKind::Exact).unwrap();
    assert_eq!(exact.len(), 1);
}

#[test]
fn removed_document_never_returned() {
    let mut collection = Collection::new("numbers");
    let ids: Vec<DocId> = (1..=5)
        .map(|n| collection.insert_one(Document::new().with("n", n)).unwrap())
        .collect();
    let removed = collection.remove(ids[2]).unwrap();
    assert_eq!(removed.get("n"), Some(&Value::from(3)));

    assert_eq!(collection.count(&json!({})).unwrap(), 4);
    let all = scan_ids(collection.documents(), &json!({})).unwrap();
    assert!(!all.contains(&ids[2]));
    assert_eq!(collection.find(&json!({"eq": {"n": 3}})).unwrap().count(), 0);
}

#[test]
fn operator_spot_checks() {
    let between = Operand::literal(Value::from(vec![1, 10]));
    assert!(evaluate(OperatorKind::Between, Some(&Value::from(5)), &between));
    assert!(!evaluate(OperatorKind::Between, Some(&Value::from(15)), &between));

    let letters = Operand::literal(Value::from(vec!["a", "b", "c"]));
    assert!(evaluate(OperatorKind::In, Some(&Value::from("b")), &letters));

    assert!(lt_helper(None, Some(&Value::from(5)), false));
}

#[test]
fn chained_result_sets_and_sorting() {
    let people = people_collection();
    let names: Vec<Value> = people
        .find(&json!({"eq": {"name": "Thomas"}}))
        .unwrap()
        .find(&json!({"regex": {"surname": "^D"}}))
        .unwrap()
        .extract("surname");
    assert_eq!(names, vec![Value::from("Dallapiccola")]);

    let sorted = people
        .find(&json!({}))
        .unwrap()
        .simplesort("surname", true)
        .limit(2)
        .extract("surname");
    assert_eq!(sorted, vec![Value::from("Nachbaur"), Value::from("Dallapiccola")]);
}

#[test]
fn batch_insert_reports_each_failure() {
    let mut collection = Collection::with_config("people", CollectionConfig::new().unique("surname")).unwrap();
    let mut batch = people();
    batch.push(person("Anna", "Buxhofer"));
    batch.push(person("Eva", "Moser"));
    let report = collection.insert(batch);
    assert_eq!(raw(report.inserted), vec![1, 2, 3, 4]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 3);
    assert_eq!(collection.len(), 4);
}
