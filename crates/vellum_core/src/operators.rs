//! Operator library.
//!
//! Every operator is a pure predicate over a stored value (possibly
//! missing) and a compiled operand. Operators never fail at evaluation
//! time: mismatched kinds simply do not match.
//!
//! The registry is closed: [`OperatorKind::from_str`] resolves every
//! supported name and rejects anything else with a compilation error.

use crate::error::{CoreError, CoreResult};
use crate::index::IndexKind;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vellum_codec::{gt_helper, loose_eq, lt_helper, strict_eq, Value};

/// Names of every registered operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    /// Strict equality.
    Eq,
    /// Loose equality (`"1"` equals `1`).
    Aeq,
    /// Strict inequality, NaN aware.
    Ne,
    /// Date equality through the ordering helper.
    Dteq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Inclusive range `[lo, hi]`.
    Between,
    /// Membership in a literal array.
    In,
    /// Not a member of a literal array.
    Nin,
    /// Value is a key of a literal map.
    KeyIn,
    /// Value is not a key of a literal map.
    NKeyIn,
    /// Value names a defined entry of a literal map.
    DefinedIn,
    /// Value names no entry of a literal map.
    UndefinedIn,
    /// Regular expression match.
    Regex,
    /// Text contains a substring.
    ContainsString,
    /// Value contains at least one of the listed items.
    ContainsAny,
    /// Value contains none of the listed items.
    ContainsNone,
    /// Value contains all of the listed items.
    Contains,
    /// Type name check.
    Type,
    /// Array length check.
    Size,
    /// Text length check.
    Len,
    /// Host predicate, must return exactly `true`.
    Where,
    /// Negated nested condition.
    Not,
    /// All nested conditions hold for the value.
    And,
    /// At least one nested condition holds for the value.
    Or,
}

impl OperatorKind {
    /// Every registered operator.
    pub const ALL: [OperatorKind; 27] = [
        Self::Eq,
        Self::Aeq,
        Self::Ne,
        Self::Dteq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
        Self::In,
        Self::Nin,
        Self::KeyIn,
        Self::NKeyIn,
        Self::DefinedIn,
        Self::UndefinedIn,
        Self::Regex,
        Self::ContainsString,
        Self::ContainsAny,
        Self::ContainsNone,
        Self::Contains,
        Self::Type,
        Self::Size,
        Self::Len,
        Self::Where,
        Self::Not,
        Self::And,
        Self::Or,
    ];

    /// Returns the registered name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Aeq => "aeq",
            Self::Ne => "ne",
            Self::Dteq => "dteq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::In => "in",
            Self::Nin => "nin",
            Self::KeyIn => "keyin",
            Self::NKeyIn => "nkeyin",
            Self::DefinedIn => "definedin",
            Self::UndefinedIn => "undefinedin",
            Self::Regex => "regex",
            Self::ContainsString => "containsString",
            Self::ContainsAny => "containsAny",
            Self::ContainsNone => "containsNone",
            Self::Contains => "contains",
            Self::Type => "type",
            Self::Size => "size",
            Self::Len => "len",
            Self::Where => "where",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Index kind best suited to accelerate this operator.
    ///
    /// Advisory only: the performance manager uses it to decide which
    /// index to build for frequently queried paths.
    pub const fn demanded_index(self) -> Option<IndexKind> {
        match self {
            Self::Eq | Self::In => Some(IndexKind::Tree),
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Between => Some(IndexKind::Binary),
            _ => None,
        }
    }

    /// Index kinds able to answer this operator, most preferred first.
    pub const fn index_candidates(self) -> &'static [IndexKind] {
        match self {
            Self::Eq | Self::In => &[
                IndexKind::Tree,
                IndexKind::Binary,
                IndexKind::Exact,
                IndexKind::Unique,
                IndexKind::Id,
            ],
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Between => {
                &[IndexKind::Binary, IndexKind::Tree]
            }
            _ => &[],
        }
    }

    /// Returns true for the names shared with query-level combinators.
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperatorKind {
    type Err = CoreError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let bare = name.strip_prefix('$').unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == bare)
            .ok_or_else(|| CoreError::compilation(format!("unknown operator `{name}`")))
    }
}

/// Host predicate used by `where`.
pub type Predicate = Arc<dyn Fn(Option<&Value>) -> Value + Send + Sync>;

/// Named host predicates available to `where` clauses.
#[derive(Clone, Default)]
pub struct Predicates {
    entries: HashMap<String, Predicate>,
}

impl Predicates {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a predicate under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(predicate));
    }

    /// Looks up a predicate.
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.entries.get(name)
    }
}

impl fmt::Debug for Predicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Compiled right-hand side of an operator.
#[derive(Clone)]
pub enum Operand {
    /// Plain literal value.
    Literal(Value),
    /// Regular expression compiled at query compile time.
    Pattern(Regex),
    /// Host predicate.
    Predicate(Predicate),
    /// One nested condition (`not`, nested `type`/`size`/`len`).
    Condition(Box<Condition>),
    /// Several nested conditions (value-level `and`/`or`).
    Conditions(Vec<Condition>),
}

impl Operand {
    /// Wraps a literal.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Compiles the JSON operand of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for invalid patterns, unknown predicate
    /// names and malformed nested conditions.
    pub fn compile(
        kind: OperatorKind,
        json: &serde_json::Value,
        predicates: &Predicates,
    ) -> CoreResult<Self> {
        match kind {
            OperatorKind::Regex => compile_pattern(json).map(Self::Pattern),
            OperatorKind::Where => {
                let name = json.as_str().ok_or_else(|| {
                    CoreError::compilation("`where` expects the name of a registered predicate")
                })?;
                predicates
                    .get(name)
                    .cloned()
                    .map(Self::Predicate)
                    .ok_or_else(|| CoreError::compilation(format!("unknown predicate `{name}`")))
            }
            OperatorKind::Not => {
                Condition::compile(json, predicates).map(|c| Self::Condition(Box::new(c)))
            }
            OperatorKind::And | OperatorKind::Or => {
                compile_conditions(json, predicates).map(Self::Conditions)
            }
            OperatorKind::Type | OperatorKind::Size | OperatorKind::Len if json.is_object() => {
                Condition::compile(json, predicates).map(|c| Self::Condition(Box::new(c)))
            }
            _ => Ok(Self::Literal(Value::from_json(json))),
        }
    }

    /// Returns the literal, if this operand is one.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Condition(c) => f.debug_tuple("Condition").field(c).finish(),
            Self::Conditions(cs) => f.debug_tuple("Conditions").field(cs).finish(),
        }
    }
}

/// An operator bound to its operand, applied to a single value.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Operator to apply.
    pub kind: OperatorKind,
    /// Compiled operand.
    pub operand: Operand,
}

impl Condition {
    /// Creates a condition.
    pub fn new(kind: OperatorKind, operand: Operand) -> Self {
        Self { kind, operand }
    }

    /// Compiles `{"op": operand, ...}`; several keys form a value-level `and`.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for non-objects and unknown operators.
    pub fn compile(json: &serde_json::Value, predicates: &Predicates) -> CoreResult<Self> {
        let mut conditions = compile_conditions(json, predicates)?;
        if conditions.len() == 1 {
            Ok(conditions.remove(0))
        } else {
            Ok(Self::new(OperatorKind::And, Operand::Conditions(conditions)))
        }
    }

    /// Tests a value against this condition.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        evaluate(self.kind, value, &self.operand)
    }
}

fn compile_conditions(
    json: &serde_json::Value,
    predicates: &Predicates,
) -> CoreResult<Vec<Condition>> {
    match json {
        serde_json::Value::Object(fields) if !fields.is_empty() => fields
            .iter()
            .map(|(name, operand)| {
                let kind = name.parse::<OperatorKind>()?;
                Ok(Condition::new(kind, Operand::compile(kind, operand, predicates)?))
            })
            .collect(),
        serde_json::Value::Array(items) => {
            let mut all = Vec::new();
            for item in items {
                all.extend(compile_conditions(item, predicates)?);
            }
            Ok(all)
        }
        other => Err(CoreError::compilation(format!(
            "expected a nested condition, got `{other}`"
        ))),
    }
}

fn compile_pattern(json: &serde_json::Value) -> CoreResult<Regex> {
    let (pattern, flags) = match json {
        serde_json::Value::String(pattern) => (pattern.as_str(), ""),
        serde_json::Value::Array(parts) => match parts.as_slice() {
            [serde_json::Value::String(p), serde_json::Value::String(f)] => (p.as_str(), f.as_str()),
            [serde_json::Value::String(p)] => (p.as_str(), ""),
            _ => return Err(CoreError::compilation("`regex` expects [pattern, flags]")),
        },
        _ => return Err(CoreError::compilation("`regex` expects a pattern string")),
    };
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| CoreError::compilation(format!("invalid pattern `{pattern}`: {e}")))
}

/// Evaluates an operator against a stored value.
pub fn evaluate(kind: OperatorKind, value: Option<&Value>, operand: &Operand) -> bool {
    match operand {
        Operand::Literal(literal) => evaluate_literal(kind, value, literal),
        Operand::Pattern(regex) => kind == OperatorKind::Regex && regex_matches(value, regex),
        Operand::Predicate(predicate) => {
            kind == OperatorKind::Where && matches!(predicate(value), Value::Bool(true))
        }
        Operand::Condition(condition) => match kind {
            OperatorKind::Not => !condition.matches(value),
            OperatorKind::Type => {
                let name = Value::from(value.map_or("undefined", Value::type_name));
                condition.matches(Some(&name))
            }
            OperatorKind::Size => array_len(value).is_some_and(|n| condition.matches(Some(&n))),
            OperatorKind::Len => text_len(value).is_some_and(|n| condition.matches(Some(&n))),
            _ => false,
        },
        Operand::Conditions(conditions) => match kind {
            OperatorKind::And => conditions.iter().all(|c| c.matches(value)),
            OperatorKind::Or => conditions.iter().any(|c| c.matches(value)),
            _ => false,
        },
    }
}

fn evaluate_literal(kind: OperatorKind, value: Option<&Value>, literal: &Value) -> bool {
    match kind {
        OperatorKind::Eq => value.is_some_and(|v| strict_eq(v, literal)),
        OperatorKind::Aeq => loose_eq(value, Some(literal)),
        OperatorKind::Ne => {
            if literal.is_nan() {
                value.is_some_and(|v| !v.is_nan())
            } else {
                value.map_or(true, |v| !strict_eq(v, literal))
            }
        }
        OperatorKind::Dteq => {
            !lt_helper(value, Some(literal), false) && !gt_helper(value, Some(literal), false)
        }
        OperatorKind::Gt => gt_helper(value, Some(literal), false),
        OperatorKind::Gte => gt_helper(value, Some(literal), true),
        OperatorKind::Lt => lt_helper(value, Some(literal), false),
        OperatorKind::Lte => lt_helper(value, Some(literal), true),
        OperatorKind::Between => between(value, literal),
        OperatorKind::In => in_array(value, literal),
        OperatorKind::Nin => !in_array(value, literal),
        OperatorKind::KeyIn | OperatorKind::DefinedIn => key_in(value, literal),
        OperatorKind::NKeyIn | OperatorKind::UndefinedIn => !key_in(value, literal),
        OperatorKind::Regex => literal
            .as_text()
            .and_then(|p| Regex::new(p).ok())
            .is_some_and(|regex| regex_matches(value, &regex)),
        OperatorKind::ContainsString => match (value, literal) {
            (Some(Value::Text(haystack)), Value::Text(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
        OperatorKind::ContainsAny => items(literal).iter().any(|item| contains_item(value, item)),
        OperatorKind::ContainsNone => !items(literal).iter().any(|item| contains_item(value, item)),
        OperatorKind::Contains => items(literal).iter().all(|item| contains_item(value, item)),
        OperatorKind::Type => {
            literal.as_text() == Some(value.map_or("undefined", Value::type_name))
        }
        OperatorKind::Size => array_len(value).is_some_and(|n| strict_eq(&n, literal)),
        OperatorKind::Len => text_len(value).is_some_and(|n| strict_eq(&n, literal)),
        OperatorKind::Where | OperatorKind::Not | OperatorKind::And | OperatorKind::Or => false,
    }
}

fn between(value: Option<&Value>, range: &Value) -> bool {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return false;
    };
    match range.as_array() {
        Some([lo, hi]) => {
            gt_helper(Some(value), Some(lo), true) && lt_helper(Some(value), Some(hi), true)
        }
        _ => false,
    }
}

fn in_array(value: Option<&Value>, list: &Value) -> bool {
    match (value, list.as_array()) {
        (Some(value), Some(items)) => items.iter().any(|item| strict_eq(value, item)),
        _ => false,
    }
}

fn key_in(value: Option<&Value>, map: &Value) -> bool {
    let key = value.map_or_else(|| "undefined".to_string(), ToString::to_string);
    map.get(&key).is_some()
}

fn regex_matches(value: Option<&Value>, regex: &Regex) -> bool {
    match value {
        Some(Value::Text(text)) => regex.is_match(text),
        Some(v @ (Value::Integer(_) | Value::Float(_) | Value::Bool(_))) => {
            regex.is_match(&v.to_string())
        }
        _ => false,
    }
}

fn items(literal: &Value) -> &[Value] {
    match literal {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn contains_item(value: Option<&Value>, item: &Value) -> bool {
    match value {
        Some(Value::Text(text)) => text.contains(&item.to_string()),
        Some(Value::Array(members)) => members.iter().any(|m| strict_eq(m, item)),
        Some(map @ Value::Map(_)) => map.get(&item.to_string()).is_some(),
        _ => false,
    }
}

fn array_len(value: Option<&Value>) -> Option<Value> {
    let len = value?.as_array()?.len();
    Some(Value::Integer(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn text_len(value: Option<&Value>) -> Option<Value> {
    let len = value?.as_text()?.chars().count();
    Some(Value::Integer(i64::try_from(len).unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(kind: OperatorKind, value: impl Into<Value>, literal: impl Into<Value>) -> bool {
        let value = value.into();
        evaluate(kind, Some(&value), &Operand::literal(literal))
    }

    fn compiled(kind: OperatorKind, json: serde_json::Value) -> Operand {
        Operand::compile(kind, &json, &Predicates::new()).unwrap()
    }

    #[test]
    fn registry_resolves_every_name() {
        for kind in OperatorKind::ALL {
            assert_eq!(kind.name().parse::<OperatorKind>().unwrap(), kind);
        }
        assert_eq!("$gte".parse::<OperatorKind>().unwrap(), OperatorKind::Gte);
        let err = "gtx".parse::<OperatorKind>().unwrap_err();
        assert!(err.to_string().contains("gtx"));
    }

    #[test]
    fn strict_and_loose_equality() {
        assert!(!check(OperatorKind::Eq, "123", 123));
        assert!(check(OperatorKind::Eq, 5, 5.0));
        assert!(check(OperatorKind::Aeq, "123", 123));
        assert!(evaluate(OperatorKind::Aeq, None, &Operand::literal(Value::Null)));
        assert!(!evaluate(OperatorKind::Eq, None, &Operand::literal(Value::Null)));
    }

    #[test]
    fn not_equal_handles_nan() {
        assert!(!check(OperatorKind::Ne, 15, 15.0));
        assert!(check(OperatorKind::Ne, 0, "0"));
        assert!(!check(OperatorKind::Ne, f64::NAN, f64::NAN));
        assert!(check(OperatorKind::Ne, "en", f64::NAN));
        assert!(evaluate(OperatorKind::Ne, None, &Operand::literal(1)));
    }

    #[test]
    fn ordering_operators() {
        assert!(check(OperatorKind::Gt, "bcd", "abc"));
        assert!(check(OperatorKind::Gte, 5, 5));
        assert!(!check(OperatorKind::Gt, 5, 5));
        assert!(check(OperatorKind::Lt, 1, 2.5));
        assert!(check(OperatorKind::Lte, 2, 2));
        assert!(evaluate(OperatorKind::Lt, None, &Operand::literal(5)));
        assert!(check(OperatorKind::Dteq, Value::Date(50), Value::Date(50)));
        assert!(!check(OperatorKind::Dteq, Value::Date(50), Value::Date(51)));
    }

    #[test]
    fn between_is_inclusive() {
        assert!(check(OperatorKind::Between, 5, vec![1, 10]));
        assert!(check(OperatorKind::Between, 1, vec![1, 10]));
        assert!(check(OperatorKind::Between, 10, vec![1, 10]));
        assert!(!check(OperatorKind::Between, 15, vec![1, 10]));
        assert!(!check(OperatorKind::Between, Value::Null, vec![1, 10]));
        assert!(!evaluate(OperatorKind::Between, None, &Operand::literal(vec![1, 10])));
    }

    #[test]
    fn membership() {
        assert!(check(OperatorKind::In, "b", vec!["a", "b", "c"]));
        assert!(!check(OperatorKind::In, "d", vec!["a", "b", "c"]));
        assert!(check(OperatorKind::Nin, "d", vec!["a", "b", "c"]));
        let map = Value::map([("x", 1), ("y", 2)]);
        assert!(check(OperatorKind::KeyIn, "x", map.clone()));
        assert!(check(OperatorKind::NKeyIn, "z", map.clone()));
        assert!(check(OperatorKind::DefinedIn, "y", map.clone()));
        assert!(check(OperatorKind::UndefinedIn, "q", map));
    }

    #[test]
    fn containment() {
        assert!(check(OperatorKind::ContainsString, "hello world", "lo w"));
        assert!(check(OperatorKind::Contains, vec!["a", "b", "c"], vec!["a", "c"]));
        assert!(!check(OperatorKind::Contains, vec!["a", "b"], vec!["a", "z"]));
        assert!(check(OperatorKind::ContainsAny, vec!["a", "b"], vec!["z", "b"]));
        assert!(check(OperatorKind::ContainsNone, vec!["a", "b"], vec!["z"]));
        assert!(check(OperatorKind::Contains, "banana", "nan"));
        assert!(check(OperatorKind::ContainsAny, Value::map([("k", 1)]), "k"));
        assert!(evaluate(OperatorKind::ContainsNone, None, &Operand::literal("x")));
    }

    #[test]
    fn regex_is_compiled_once() {
        let operand = compiled(OperatorKind::Regex, json!(["^tho", "i"]));
        assert!(evaluate(OperatorKind::Regex, Some(&Value::from("Thomas")), &operand));
        assert!(!evaluate(OperatorKind::Regex, Some(&Value::from("Markus")), &operand));
        assert!(!evaluate(OperatorKind::Regex, None, &operand));

        let err = Operand::compile(OperatorKind::Regex, &json!("("), &Predicates::new()).unwrap_err();
        assert!(matches!(err, CoreError::Compilation { .. }));
    }

    #[test]
    fn type_size_len() {
        assert!(check(OperatorKind::Type, "x", "string"));
        assert!(check(OperatorKind::Type, vec![1], "array"));
        assert!(evaluate(OperatorKind::Type, None, &Operand::literal("undefined")));
        assert!(check(OperatorKind::Size, vec![1, 2, 3], 3));
        assert!(!check(OperatorKind::Size, "abc", 3));
        assert!(check(OperatorKind::Len, "abc", 3));

        let nested = compiled(OperatorKind::Size, json!({"gt": 1}));
        assert!(evaluate(OperatorKind::Size, Some(&Value::from(vec![1, 2])), &nested));
        let nested = compiled(OperatorKind::Type, json!({"in": ["number", "string"]}));
        assert!(evaluate(OperatorKind::Type, Some(&Value::from(4)), &nested));
    }

    #[test]
    fn where_requires_exact_true() {
        let mut predicates = Predicates::new();
        predicates.register("even", |v: Option<&Value>| {
            Value::Bool(v.and_then(Value::as_integer).is_some_and(|n| n % 2 == 0))
        });
        predicates.register("truthy", |_: Option<&Value>| Value::Integer(1));
        predicates.register("text_true", |_: Option<&Value>| Value::from("true"));

        let even = Operand::compile(OperatorKind::Where, &json!("even"), &predicates).unwrap();
        assert!(evaluate(OperatorKind::Where, Some(&Value::from(4)), &even));
        assert!(!evaluate(OperatorKind::Where, Some(&Value::from(3)), &even));

        for name in ["truthy", "text_true"] {
            let operand = Operand::compile(OperatorKind::Where, &json!(name), &predicates).unwrap();
            assert!(!evaluate(OperatorKind::Where, Some(&Value::from(4)), &operand));
        }

        assert!(Operand::compile(OperatorKind::Where, &json!("missing"), &predicates).is_err());
    }

    #[test]
    fn value_level_logic() {
        let not = compiled(OperatorKind::Not, json!({"eq": 3}));
        assert!(evaluate(OperatorKind::Not, Some(&Value::from(4)), &not));
        assert!(!evaluate(OperatorKind::Not, Some(&Value::from(3)), &not));

        let and = compiled(OperatorKind::And, json!([{"gt": 1}, {"lt": 5}]));
        assert!(evaluate(OperatorKind::And, Some(&Value::from(3)), &and));
        assert!(!evaluate(OperatorKind::And, Some(&Value::from(7)), &and));

        let or = compiled(OperatorKind::Or, json!([{"lt": 1}, {"gt": 5}]));
        assert!(evaluate(OperatorKind::Or, Some(&Value::from(7)), &or));
        assert!(!evaluate(OperatorKind::Or, Some(&Value::from(3)), &or));

        let err = Operand::compile(OperatorKind::Not, &json!({"nope": 1}), &Predicates::new())
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn demanded_indices() {
        assert_eq!(OperatorKind::Eq.demanded_index(), Some(IndexKind::Tree));
        assert_eq!(OperatorKind::Gte.demanded_index(), Some(IndexKind::Binary));
        assert_eq!(OperatorKind::Regex.demanded_index(), None);
        assert!(OperatorKind::Regex.index_candidates().is_empty());
    }
}
