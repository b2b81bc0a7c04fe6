//! Properties that must hold for every generated dataset and query.

use crate::fixtures::aged;
use crate::generators::{
    age_condition_strategy, aged_documents_strategy, composite_condition_strategy,
    composite_documents_strategy, composite_mutations_strategy, mutations_strategy,
    numeric_value_strategy, Mutation, PropTestConfig,
};
use crate::integration::{ids_of, scan_ids, sorted, ModelHarness};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use vellum_codec::strict_eq;
use vellum_core::{Collection, CollectionConfig, DocId, Document, IndexKind, Query};

fn indexed(docs: &[Document], kinds: &[IndexKind], adaptive: bool) -> Collection {
    let config = kinds
        .iter()
        .fold(CollectionConfig::new().adaptive_indices(adaptive), |config, kind| {
            config.index("age", *kind)
        })
        .unique("serial");
    let mut collection = Collection::with_config("props", config).expect("Invalid config");
    let report = collection.insert(docs.to_vec());
    assert!(report.is_complete(), "{:?}", report.failures);
    collection
}

fn query_ids(collection: &Collection, definition: &serde_json::Value) -> Vec<DocId> {
    let result = collection.find(definition).expect("Failed to query");
    ids_of(result.rows().iter().copied())
}

fn id_set(ids: Vec<DocId>) -> BTreeSet<DocId> {
    ids.into_iter().collect()
}

/// Drops documents whose `age` equals an earlier document's non-null `age`.
fn distinct_ages(docs: Vec<Document>) -> Vec<Document> {
    let mut kept: Vec<Document> = Vec::with_capacity(docs.len());
    for doc in docs {
        let taken = doc.get("age").is_some_and(|age| {
            !age.is_null()
                && kept
                    .iter()
                    .any(|other| other.get("age").is_some_and(|seen| strict_eq(age, seen)))
        });
        if !taken {
            kept.push(doc);
        }
    }
    kept
}

/// Builds a collection with a single `age` index of `kind`.
fn indexed_by(docs: Vec<Document>, kind: IndexKind) -> Collection {
    let docs = if kind == IndexKind::Unique {
        distinct_ages(docs)
    } else {
        docs
    };
    indexed(&docs, &[kind], true)
}

const ALL_KINDS: [IndexKind; 3] = [IndexKind::Binary, IndexKind::Tree, IndexKind::Exact];
const LOOKUP_KINDS: [IndexKind; 4] = [
    IndexKind::Binary,
    IndexKind::Tree,
    IndexKind::Exact,
    IndexKind::Unique,
];

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn index_and_scan_agree(
        docs in aged_documents_strategy(40, false),
        definition in age_condition_strategy(false),
        kind in prop::sample::select(LOOKUP_KINDS.to_vec()),
    ) {
        let collection = indexed_by(docs, kind);
        let expected = scan_ids(collection.documents(), &definition).unwrap();
        prop_assert_eq!(query_ids(&collection, &definition), expected);
    }

    #[test]
    fn composite_and_large_values_agree_with_scan(
        docs in composite_documents_strategy(30),
        definition in composite_condition_strategy(),
        kind in prop::sample::select(LOOKUP_KINDS.to_vec()),
    ) {
        let collection = indexed_by(docs, kind);
        let expected = scan_ids(collection.documents(), &definition).unwrap();
        prop_assert_eq!(query_ids(&collection, &definition), expected);
    }

    #[test]
    fn tracked_result_set_matches_scan_over_composites(
        definition in composite_condition_strategy(),
        mutations in composite_mutations_strategy(30),
    ) {
        let mut harness = ModelHarness::new(definition, true);
        for mutation in &mutations {
            harness.apply(mutation);
            prop_assert_eq!(harness.tracked_ids(), sorted(harness.expected_ids()));
            prop_assert_eq!(harness.queried_ids(), harness.expected_ids());
        }
    }

    #[test]
    fn numeric_index_lookups_agree(
        docs in aged_documents_strategy(40, true),
        definition in age_condition_strategy(true),
    ) {
        let collection = indexed(&docs, &ALL_KINDS, true);
        let expected = scan_ids(collection.documents(), &definition).unwrap();
        prop_assert_eq!(query_ids(&collection, &definition), expected);
    }

    #[test]
    fn and_is_intersection_or_is_union(
        docs in aged_documents_strategy(30, false),
        q1 in age_condition_strategy(false),
        q2 in age_condition_strategy(false),
    ) {
        let collection = indexed(&docs, &[IndexKind::Binary], true);
        let a = id_set(query_ids(&collection, &q1));
        let b = id_set(query_ids(&collection, &q2));

        let and = query_ids(&collection, &json!({"and": [q1.clone(), q2.clone()]}));
        let or = query_ids(&collection, &json!({"or": [q1, q2]}));
        prop_assert_eq!(id_set(and), a.intersection(&b).copied().collect::<BTreeSet<_>>());
        let or_len = or.len();
        let or = id_set(or);
        prop_assert_eq!(or_len, or.len());
        prop_assert_eq!(or, a.union(&b).copied().collect::<BTreeSet<_>>());
    }

    #[test]
    fn tracked_result_set_matches_scan(
        definition in age_condition_strategy(false),
        mutations in mutations_strategy(30, false),
    ) {
        let mut harness = ModelHarness::new(definition, true);
        for mutation in &mutations {
            harness.apply(mutation);
            prop_assert_eq!(harness.tracked_ids(), sorted(harness.expected_ids()));
        }
    }

    #[test]
    fn dirty_indices_never_served(
        definition in age_condition_strategy(true),
        mutations in mutations_strategy(30, true),
    ) {
        let mut harness = ModelHarness::new(definition, false);
        for mutation in &mutations {
            harness.apply(mutation);
            prop_assert_eq!(harness.queried_ids(), harness.expected_ids());
        }
        harness.collection.ensure_all_indices(false).unwrap();
        prop_assert_eq!(harness.queried_ids(), harness.expected_ids());
    }

    #[test]
    fn identifiers_strictly_increase(mutations in mutations_strategy(40, false)) {
        let mut harness = ModelHarness::new(json!({}), true);
        for mutation in &mutations {
            harness.apply(mutation);
        }
        let assigned = harness.assigned();
        prop_assert!(assigned.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn fork_keeps_structure_and_tracks_literal(
        docs in aged_documents_strategy(30, true),
        first in numeric_value_strategy(),
        second in numeric_value_strategy(),
        op in prop::sample::select(vec!["eq", "gt", "lte"]),
    ) {
        let refs: Vec<&Document> = docs.iter().collect();
        let query = Query::compile(&json!({ op: {"age": first.to_json()} })).unwrap();
        let forked = query.fork(&json!({"age": second.to_json()})).unwrap();
        let direct = Query::compile(&json!({ op: {"age": second.to_json()} })).unwrap();

        prop_assert_eq!(forked.structure_signature(), query.structure_signature());
        prop_assert!(forked.shares_graph(&query));
        prop_assert_eq!(forked.value_signature(), direct.value_signature());
        prop_assert_eq!(
            ids_of(forked.resolve(&refs).iter().copied()),
            ids_of(direct.resolve(&refs).iter().copied())
        );
    }
}

#[test]
fn unique_index_keeps_composites_apart() {
    let docs = vec![
        aged(0, Some(vellum_core::Value::map([("city", "Oslo")]))),
        aged(1, Some(vellum_core::Value::map([("city", "Graz")]))),
        aged(2, Some(vellum_core::Value::from(vec![1, 2]))),
        aged(3, Some(vellum_core::Value::from(vec!["1,2"]))),
        aged(4, Some(vellum_core::Value::Integer(10_000_000_000_000_000))),
    ];
    let collection = indexed_by(docs, IndexKind::Unique);
    assert_eq!(collection.len(), 5);

    for definition in [
        json!({"eq": {"age": {"city": "Graz"}}}),
        json!({"eq": {"age": 1e16}}),
        json!({"in": {"age": [["1,2"], [1, 2]]}}),
    ] {
        let expected = scan_ids(collection.documents(), &definition).unwrap();
        assert!(!expected.is_empty(), "{definition}");
        assert_eq!(query_ids(&collection, &definition), expected, "{definition}");
    }
}

#[test]
fn identifiers_survive_removal_of_last() {
    let mut collection = Collection::new("ids");
    let first = collection.insert_one(aged(0, None)).unwrap();
    collection.remove(first).unwrap();
    let second = collection.insert_one(aged(1, None)).unwrap();
    assert!(second > first);
}

#[test]
fn tracked_scenario_with_mixed_mutations() {
    let mut harness = ModelHarness::new(json!({"or": [{"lt": {"age": 0}}, {"eq": {"age": "b"}}]}), true);
    let mutations = [
        Mutation::Insert(Some((-3).into())),
        Mutation::Insert(Some("b".into())),
        Mutation::Insert(None),
        Mutation::Update(0, Some(4.into())),
        Mutation::Remove(1),
    ];
    for mutation in &mutations {
        harness.apply(mutation);
        assert_eq!(harness.tracked_ids(), sorted(harness.expected_ids()));
    }
    assert_eq!(harness.tracked_ids(), vec![DocId::new(3)]);
}
