//! Ordering and equality helpers shared by operators, sorting and indices.
//!
//! The ordering is total over ranks: missing and null values first, then
//! `false`, then every other defined value, then `true`. Inside the middle
//! rank numbers and dates compare numerically, text compares
//! lexicographically, and values of different kinds fall back to comparing
//! their string forms.

use crate::value::Value;
use std::cmp::Ordering;

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 3,
        Some(_) => 2,
    }
}

fn compare_by_string(a: &Value, b: &Value) -> Ordering {
    a.to_string().cmp(&b.to_string())
}

/// Numeric view of integers, floats and dates.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Integer(n) | Value::Date(n) => Some(Number::Int(*n)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

/// 2^63, the first float above every `i64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Orders an integer against a float without rounding the integer.
fn compare_int_float(n: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if f < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = f.trunc() as i64;
    Some(
        n.cmp(&whole)
            .then_with(|| 0.0f64.partial_cmp(&f.fract()).unwrap_or(Ordering::Equal)),
    )
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        (Number::Int(x), Number::Float(y)) => compare_int_float(x, y),
        (Number::Float(x), Number::Int(y)) => compare_int_float(y, x).map(Ordering::reverse),
        (Number::Float(x), Number::Float(y)) => x.partial_cmp(&y),
    }
}

fn compare_defined(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => match (number(a), number(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y).unwrap_or_else(|| compare_by_string(a, b)),
            _ => compare_by_string(a, b),
        },
    }
}

/// Compares two possibly missing values.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (rank_a, rank_b) = (rank(a), rank(b));
    if rank_a != rank_b || rank_a != 2 {
        return rank_a.cmp(&rank_b);
    }
    match (a, b) {
        (Some(a), Some(b)) => compare_defined(a, b),
        _ => Ordering::Equal,
    }
}

/// Returns true if `a` sorts before `b`, or `equal` if they compare equal.
pub fn lt_helper(a: Option<&Value>, b: Option<&Value>, equal: bool) -> bool {
    match compare_values(a, b) {
        Ordering::Less => true,
        Ordering::Equal => equal,
        Ordering::Greater => false,
    }
}

/// Returns true if `a` sorts after `b`, or `equal` if they compare equal.
pub fn gt_helper(a: Option<&Value>, b: Option<&Value>, equal: bool) -> bool {
    match compare_values(a, b) {
        Ordering::Greater => true,
        Ordering::Equal => equal,
        Ordering::Less => false,
    }
}

/// Ordering for sorts, optionally descending.
pub fn sort_helper(a: Option<&Value>, b: Option<&Value>, desc: bool) -> Ordering {
    let ord = compare_values(a, b);
    if desc {
        ord.reverse()
    } else {
        ord
    }
}

/// Strict equality: same kind and same value.
///
/// Integers and floats are one number kind, so `1 == 1.0`, compared
/// exactly even past 2^53. NaN never
/// equals anything. Arrays and maps compare structurally.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) | (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            matches!(
                (number(a), number(b)),
                (Some(x), Some(y)) if compare_numbers(x, y) == Some(Ordering::Equal)
            )
        }
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| strict_eq(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, l)| b.get(key).is_some_and(|r| strict_eq(l, r)))
                && y.iter().all(|(key, _)| a.get(key).is_some())
        }
        _ => false,
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        other => other.as_number(),
    }
}

/// Loose equality: numeric strings equal numbers and a missing value
/// equals null.
pub fn loose_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (None | Some(Value::Null), _) | (_, None | Some(Value::Null)) => false,
        (Some(a), Some(b)) => {
            if strict_eq(a, b) {
                return true;
            }
            match (a, b) {
                (Value::Text(_), Value::Text(_)) => false,
                _ => match (loose_number(a), loose_number(b)) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                },
            }
        }
    }
}
