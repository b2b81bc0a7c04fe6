//! Key types shared by the index implementations.
//!
//! Hash-based indices key on [`HashKey`], a structural normalization that
//! folds integral floats onto integers so that `1` and `1.0` land in one
//! bucket. Ordered indices key
//! on [`OrderedKey`], a total order that agrees with
//! [`vellum_codec::compare_values`] whenever the indexed values share one
//! [`ValueFamily`]. [`FamilyCounts`] tracks which families an index holds
//! so lookups can refuse to answer when the orders could disagree.

use std::cmp::Ordering;
use vellum_codec::{compare_values, Value};

/// 2^63, the first float above every `i64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Hashable normalization of a value.
///
/// Two values get the same key whenever [`vellum_codec::strict_eq`] holds
/// between them. NaN is the one exception: it equals nothing, yet every NaN
/// with one bit pattern shares a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    /// Null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any number with an integral value that fits an `i64`.
    Int(i64),
    /// Any other float, by bit pattern.
    Float(u64),
    /// Text.
    Text(String),
    /// Date in milliseconds.
    Date(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Array, element by element.
    Array(Vec<HashKey>),
    /// Map entries sorted by field name, first occurrence of each name.
    Map(Vec<(String, HashKey)>),
}

impl HashKey {
    /// Normalizes a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Integer(n) => Self::Int(*n),
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(f) => {
                Self::Int(*f as i64)
            }
            Value::Float(f) => Self::Float(f.to_bits()),
            Value::Text(s) => Self::Text(s.clone()),
            Value::Date(millis) => Self::Date(*millis),
            Value::Bytes(bytes) => Self::Bytes(bytes.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::of).collect()),
            Value::Map(pairs) => {
                let mut entries: Vec<(String, HashKey)> = Vec::with_capacity(pairs.len());
                for (name, item) in pairs {
                    if !entries.iter().any(|(seen, _)| seen == name) {
                        entries.push((name.clone(), Self::of(item)));
                    }
                }
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                Self::Map(entries)
            }
        }
    }
}

/// Comparison family of a defined, non-boolean value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueFamily {
    /// Integers, non-NaN floats and dates.
    Numeric,
    /// Text.
    Text,
    /// Everything compared by string form only.
    Other,
}

impl ValueFamily {
    /// Family of a value, or `None` for missing, null and booleans, which
    /// order consistently against everything.
    pub fn of(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Null | Value::Bool(_) => None,
            Value::Integer(_) | Value::Date(_) => Some(Self::Numeric),
            Value::Float(f) if !f.is_nan() => Some(Self::Numeric),
            Value::Text(_) => Some(Self::Text),
            _ => Some(Self::Other),
        }
    }
}

/// Number of indexed entries per family.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyCounts {
    numeric: usize,
    text: usize,
    other: usize,
}

impl FamilyCounts {
    fn slot(&mut self, family: ValueFamily) -> &mut usize {
        match family {
            ValueFamily::Numeric => &mut self.numeric,
            ValueFamily::Text => &mut self.text,
            ValueFamily::Other => &mut self.other,
        }
    }

    /// Records an inserted value.
    pub fn add(&mut self, value: Option<&Value>) {
        if let Some(family) = ValueFamily::of(value) {
            *self.slot(family) += 1;
        }
    }

    /// Records a removed value.
    pub fn remove(&mut self, value: Option<&Value>) {
        if let Some(family) = ValueFamily::of(value) {
            let slot = self.slot(family);
            *slot = slot.saturating_sub(1);
        }
    }

    /// Resets all counts.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true if ordered lookups for `probe` agree with a full scan.
    ///
    /// Missing, null and boolean probes only compare by rank, so they are
    /// always served.
    pub fn serves(&self, probe: &Value) -> bool {
        match ValueFamily::of(Some(probe)) {
            None => true,
            Some(ValueFamily::Other) => false,
            Some(ValueFamily::Numeric) => self.text == 0 && self.other == 0,
            Some(ValueFamily::Text) => self.numeric == 0 && self.other == 0,
        }
    }
}

/// Totally ordered wrapper used as a tree key.
#[derive(Debug, Clone)]
pub struct OrderedKey(pub Option<Value>);

impl OrderedKey {
    fn rank(&self) -> (u8, Option<ValueFamily>) {
        match &self.0 {
            None | Some(Value::Null) => (0, None),
            Some(Value::Bool(false)) => (1, None),
            Some(Value::Bool(true)) => (3, None),
            value => (2, ValueFamily::of(value.as_ref())),
        }
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let (rank_a, family_a) = self.rank();
        let (rank_b, family_b) = other.rank();
        rank_a
            .cmp(&rank_b)
            .then(family_a.cmp(&family_b))
            .then_with(|| match family_a {
                Some(ValueFamily::Other) => {
                    let a = self.0.as_ref().map(ToString::to_string);
                    let b = other.0.as_ref().map(ToString::to_string);
                    a.cmp(&b)
                }
                _ => compare_values(self.0.as_ref(), other.0.as_ref()),
            })
    }
}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedKey {}
