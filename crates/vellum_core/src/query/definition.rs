//! Parsing of JSON query definitions.
//!
//! Accepted shapes:
//!
//! ```text
//! {}                                        match everything
//! {"and": [def, ...]}  {"or": [def, ...]}   query-level combinators
//! {"eq": {"name": "Thomas"}}                operator keyed, field shorthand
//! {"gt": {"age": {"gt": 5}}}                operator keyed, explicit operator
//! {"name": "Thomas"}                        field keyed, shorthand eq
//! {"age": {"gte": 5, "lt": 9}}              field keyed, explicit operators
//! ```
//!
//! Several keys in one map, or several fields under one operator, form an
//! implicit `and`. A leading `$` on operator and combinator names is
//! accepted and ignored.

use crate::error::{CoreError, CoreResult};
use crate::operators::OperatorKind;
use std::fmt::Write;

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Parsed query definition, before operands are compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// The empty definition.
    MatchAll,
    /// Every child must match.
    And(Vec<Definition>),
    /// At least one child must match.
    Or(Vec<Definition>),
    /// One operator applied to one field.
    Leaf {
        /// Operator.
        kind: OperatorKind,
        /// Dotted field path.
        path: String,
        /// Raw operand.
        operand: serde_json::Value,
    },
}

enum Combinator {
    And,
    Or,
}

fn combinator(key: &str) -> Option<Combinator> {
    match key.strip_prefix('$').unwrap_or(key) {
        "and" => Some(Combinator::And),
        "or" => Some(Combinator::Or),
        _ => None,
    }
}

fn operator(key: &str) -> Option<OperatorKind> {
    key.parse().ok()
}

/// Operators whose operand is itself a condition map.
fn takes_condition(kind: OperatorKind) -> bool {
    matches!(
        kind,
        OperatorKind::Not
            | OperatorKind::And
            | OperatorKind::Or
            | OperatorKind::Type
            | OperatorKind::Size
            | OperatorKind::Len
    )
}

fn all_operators(map: &JsonMap) -> bool {
    !map.is_empty() && map.keys().all(|key| operator(key).is_some())
}

fn conjunction(mut parts: Vec<Definition>) -> Definition {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Definition::And(parts)
    }
}

impl Definition {
    /// Parses a JSON definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] naming the offending key for
    /// unknown operators or combinators and malformed shapes.
    pub fn parse(json: &serde_json::Value) -> CoreResult<Self> {
        let map = json
            .as_object()
            .ok_or_else(|| CoreError::compilation(format!("query definition must be an object, got `{json}`")))?;
        if map.is_empty() {
            return Ok(Self::MatchAll);
        }
        let parts = map
            .iter()
            .map(|(key, value)| Self::parse_entry(key, value))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(conjunction(parts))
    }

    fn parse_child(json: &serde_json::Value, key: &str) -> CoreResult<Self> {
        match Self::parse(json)? {
            Self::MatchAll => Err(CoreError::compilation(format!("empty sub-query in `{key}`"))),
            child => Ok(child),
        }
    }

    fn parse_entry(key: &str, value: &serde_json::Value) -> CoreResult<Self> {
        if let serde_json::Value::Array(children) = value {
            let combinator = combinator(key)
                .ok_or_else(|| CoreError::compilation(format!("unknown combinator `{key}`")))?;
            let children = children
                .iter()
                .map(|child| Self::parse_child(child, key))
                .collect::<CoreResult<Vec<_>>>()?;
            return Ok(match combinator {
                Combinator::And => Self::And(children),
                Combinator::Or => Self::Or(children),
            });
        }
        if let Some(kind) = operator(key) {
            return Self::parse_operator(kind, key, value);
        }
        if key.starts_with('$') {
            return Err(CoreError::compilation(format!("unknown operator `{key}`")));
        }
        Self::parse_field(key, value)
    }

    /// `{op: {field: operand, ...}}`
    fn parse_operator(kind: OperatorKind, key: &str, value: &serde_json::Value) -> CoreResult<Self> {
        let fields = value
            .as_object()
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| CoreError::compilation(format!("`{key}` expects a map of fields")))?;
        let parts = fields
            .iter()
            .map(|(path, operand)| match operand.as_object() {
                Some(inner) if !takes_condition(kind) && all_operators(inner) => {
                    Self::parse_field(path, operand)
                }
                _ => Ok(Self::Leaf {
                    kind,
                    path: path.clone(),
                    operand: operand.clone(),
                }),
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(conjunction(parts))
    }

    /// `{field: literal}` or `{field: {op: operand, ...}}`
    fn parse_field(path: &str, value: &serde_json::Value) -> CoreResult<Self> {
        let Some(ops) = value.as_object() else {
            return Ok(Self::Leaf {
                kind: OperatorKind::Eq,
                path: path.to_string(),
                operand: value.clone(),
            });
        };
        if ops.is_empty() {
            return Err(CoreError::compilation(format!("no operator given for `{path}`")));
        }
        let parts = ops
            .iter()
            .map(|(name, operand)| {
                Ok(Self::Leaf {
                    kind: name.parse()?,
                    path: path.to_string(),
                    operand: operand.clone(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(conjunction(parts))
    }

    /// Leaves in evaluation order.
    pub fn leaves(&self) -> Vec<(OperatorKind, &str, &serde_json::Value)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(OperatorKind, &'a str, &'a serde_json::Value)>) {
        match self {
            Self::MatchAll => {}
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Self::Leaf { kind, path, operand } => out.push((*kind, path, operand)),
        }
    }

    /// Shape of the definition without literal values, e.g.
    /// `and(eq:name,eq:surname)`.
    pub fn structure_signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out, false);
        out
    }

    /// Shape including literal values.
    pub fn value_signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out, true);
        out
    }

    fn write_signature(&self, out: &mut String, values: bool) {
        match self {
            Self::MatchAll => out.push('*'),
            Self::And(children) | Self::Or(children) => {
                out.push_str(if matches!(self, Self::And(_)) { "and(" } else { "or(" });
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    child.write_signature(out, values);
                }
                out.push(')');
            }
            Self::Leaf { kind, path, operand } => {
                let _ = write!(out, "{kind}:{path}");
                if values {
                    let _ = write!(out, "={operand}");
                }
            }
        }
    }
}
