//! Property-based test generators using proptest.
//!
//! Values are drawn from small domains so that generated documents collide
//! often enough for equality and range lookups to be meaningful.

use crate::fixtures::aged;
use proptest::prelude::*;
use serde_json::json;
use vellum_core::{Document, Value};

/// Strategy for numbers only, integers and halves mixed.
pub fn numeric_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-20i64..20).prop_map(Value::Integer),
        (-40i32..40).prop_map(|n| Value::Float(f64::from(n) / 2.0)),
    ]
}

/// Strategy for field values of every kind an ordered index can hold.
pub fn mixed_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => numeric_value_strategy(),
        1 => Just(Value::Null),
        1 => any::<bool>().prop_map(Value::Bool),
        2 => prop::string::string_regex("[a-c]{0,2}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
    ]
}

/// Strategy for integers and integral floats on both sides of 2^53.
#[allow(clippy::cast_precision_loss)]
pub fn large_number_strategy() -> impl Strategy<Value = Value> {
    const TWO_53: i64 = 1 << 53;
    prop_oneof![
        (-2i64..=2).prop_map(|d| Value::Integer(TWO_53 + d)),
        (-1i64..=1).prop_map(|d| Value::Float((TWO_53 + 2 * d) as f64)),
        Just(Value::Integer(10_000_000_000_000_000)),
        Just(Value::Float(1e16)),
    ]
}

/// Strategy for nested arrays and maps over a handful of leaves.
///
/// Leaves include large numbers and text that collides with an array's
/// display form. Maps never repeat a field name.
pub fn composite_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        (0i64..3).prop_map(Value::Integer),
        Just(Value::Float(1.0)),
        large_number_strategy(),
        prop::sample::select(vec!["1,2", "a"]).prop_map(Value::from),
        Just(Value::Null),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map(prop::sample::select(vec!["p", "q"]), inner, 1..3)
                .prop_map(|fields| Value::map(fields)),
        ]
    })
}

/// Strategy for an optional field value, `None` meaning the field is absent.
pub fn field_strategy(numeric_only: bool) -> BoxedStrategy<Option<Value>> {
    let value = if numeric_only {
        numeric_value_strategy().boxed()
    } else {
        mixed_value_strategy().boxed()
    };
    prop_oneof![1 => Just(None), 6 => value.prop_map(Some)].boxed()
}

/// Strategy for documents with distinct serials and a generated `age`.
pub fn aged_documents_strategy(max: usize, numeric_only: bool) -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(field_strategy(numeric_only), 0..max).prop_map(|ages| {
        ages.into_iter()
            .enumerate()
            .map(|(serial, age)| aged(serial, age))
            .collect()
    })
}

/// Strategy for documents whose `age` is composite, a large number or absent.
pub fn composite_documents_strategy(max: usize) -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(composite_field_strategy(), 0..max).prop_map(|ages| {
        ages.into_iter()
            .enumerate()
            .map(|(serial, age)| aged(serial, age))
            .collect()
    })
}

fn composite_field_strategy() -> BoxedStrategy<Option<Value>> {
    prop_oneof![1 => Just(None), 6 => composite_value_strategy().prop_map(Some)].boxed()
}

/// Strategy for single-leaf query definitions on `age` with composite literals.
pub fn composite_condition_strategy() -> impl Strategy<Value = serde_json::Value> {
    let simple = (
        prop::sample::select(vec!["eq", "ne", "gt", "lte", "aeq"]),
        composite_value_strategy(),
    )
        .prop_map(|(op, value)| json!({ op: { "age": value.to_json() } }));
    let membership = (
        prop::sample::select(vec!["in", "nin"]),
        prop::collection::vec(composite_value_strategy(), 0..4),
    )
        .prop_map(|(op, values)| {
            let values: Vec<_> = values.iter().map(Value::to_json).collect();
            json!({ op: { "age": values } })
        });
    prop_oneof![3 => simple, 1 => membership]
}

/// Strategy for single-leaf query definitions on `age`.
pub fn age_condition_strategy(numeric_only: bool) -> impl Strategy<Value = serde_json::Value> {
    let literal = move || {
        if numeric_only {
            numeric_value_strategy().boxed()
        } else {
            mixed_value_strategy().boxed()
        }
    };
    let simple = (
        prop::sample::select(vec!["eq", "ne", "gt", "gte", "lt", "lte", "aeq", "dteq"]),
        literal(),
    )
        .prop_map(|(op, value)| json!({ op: { "age": value.to_json() } }));
    let between = (literal(), literal()).prop_map(|(lo, hi)| {
        json!({"between": {"age": [lo.to_json(), hi.to_json()]}})
    });
    let membership = (
        prop::sample::select(vec!["in", "nin"]),
        prop::collection::vec(literal(), 0..4),
    )
        .prop_map(|(op, values)| {
            let values: Vec<_> = values.iter().map(Value::to_json).collect();
            json!({ op: { "age": values } })
        });
    prop_oneof![4 => simple, 1 => between, 1 => membership]
}

/// A mutation applied to a collection under test.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert a new document with this `age`.
    Insert(Option<Value>),
    /// Replace the `age` of the live document at this position, modulo
    /// the collection size.
    Update(usize, Option<Value>),
    /// Remove the live document at this position, modulo the collection size.
    Remove(usize),
}

fn mutations_over(field: BoxedStrategy<Option<Value>>, max: usize) -> impl Strategy<Value = Vec<Mutation>> {
    let mutation = prop_oneof![
        3 => field.clone().prop_map(Mutation::Insert),
        2 => (any::<usize>(), field).prop_map(|(slot, age)| Mutation::Update(slot, age)),
        1 => any::<usize>().prop_map(Mutation::Remove),
    ];
    prop::collection::vec(mutation, 0..max)
}

/// Strategy for a sequence of mutations.
pub fn mutations_strategy(max: usize, numeric_only: bool) -> impl Strategy<Value = Vec<Mutation>> {
    mutations_over(field_strategy(numeric_only), max)
}

/// Strategy for a sequence of mutations writing composite `age` values.
pub fn composite_mutations_strategy(max: usize) -> impl Strategy<Value = Vec<Mutation>> {
    mutations_over(composite_field_strategy(), max)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to a proptest configuration.
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::Query;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_conditions_compile(definition in age_condition_strategy(false)) {
            prop_assert!(Query::compile(&definition).is_ok());
        }

        #[test]
        fn composite_conditions_compile(definition in composite_condition_strategy()) {
            prop_assert!(Query::compile(&definition).is_ok());
        }

        #[test]
        fn composite_maps_have_distinct_fields(value in composite_value_strategy()) {
            fn check(value: &Value) -> bool {
                match value {
                    Value::Map(pairs) => {
                        pairs.iter().enumerate().all(|(i, (name, item))| {
                            pairs[..i].iter().all(|(seen, _)| seen != name) && check(item)
                        })
                    }
                    Value::Array(items) => items.iter().all(check),
                    _ => true,
                }
            }
            prop_assert!(check(&value));
        }

        #[test]
        fn serials_are_distinct(docs in aged_documents_strategy(20, false)) {
            let serials: Vec<_> = docs.iter().filter_map(|d| d.get("serial").cloned()).collect();
            for (i, serial) in serials.iter().enumerate() {
                prop_assert_eq!(serial, &Value::from(i as i64));
            }
        }
    }

    #[test]
    fn config_presets() {
        assert!(PropTestConfig::quick().cases < PropTestConfig::default().cases);
        assert!(PropTestConfig::thorough().cases > PropTestConfig::default().cases);
    }
}
