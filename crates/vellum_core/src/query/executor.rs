//! Operation graph evaluation.
//!
//! `and` threads the narrowing intermediate result through its children
//! left to right. `or` evaluates every child against its own input and
//! keeps each input document once, in input order. Leaves answer through
//! a clean index when one can serve them and scan otherwise; index
//! candidates are always re-checked with the operator.

use crate::accessor::Accessor;
use crate::document::Document;
use crate::index::IndexManager;
use crate::operators::{evaluate, OperatorKind};
use crate::query::compiler::OperatorData;
use crate::types::DocId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{trace, warn};

/// Node of a compiled query.
#[derive(Debug)]
pub enum Operation {
    /// Progressive narrowing through every child.
    And(Vec<Operation>),
    /// Union of the children's results.
    Or(Vec<Operation>),
    /// One operator applied to one field.
    Operator {
        /// Operator to apply.
        kind: OperatorKind,
        /// Compiled accessor for the field path.
        accessor: Arc<Accessor>,
        /// Slot in the operator data table.
        slot: usize,
    },
}

/// Resources available while resolving.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext<'m> {
    /// Indices of the collection the documents belong to.
    pub indices: Option<&'m IndexManager>,
    /// Scans over more documents than this log a warning.
    pub scan_warning_threshold: usize,
}

impl Default for ExecContext<'_> {
    fn default() -> Self {
        Self {
            indices: None,
            scan_warning_threshold: usize::MAX,
        }
    }
}

impl<'m> ExecContext<'m> {
    /// Context resolving through `indices`.
    pub fn with_indices(indices: &'m IndexManager, scan_warning_threshold: usize) -> Self {
        Self {
            indices: Some(indices),
            scan_warning_threshold,
        }
    }
}

impl Operation {
    /// Filters `input` down to the matching documents.
    pub fn resolve<'d>(
        &self,
        data: &[OperatorData],
        input: Vec<&'d Document>,
        ctx: &ExecContext<'_>,
    ) -> Vec<&'d Document> {
        if input.is_empty() {
            return input;
        }
        match self {
            Self::And(children) => {
                let mut current = input;
                for child in children {
                    if current.is_empty() {
                        break;
                    }
                    current = child.resolve(data, current, ctx);
                }
                current
            }
            Self::Or(children) => {
                let mut matched: HashSet<*const Document> = HashSet::new();
                for child in children {
                    matched.extend(
                        child
                            .resolve(data, input.clone(), ctx)
                            .into_iter()
                            .map(|doc| doc as *const Document),
                    );
                }
                input
                    .into_iter()
                    .filter(|doc| matched.contains(&(*doc as *const Document)))
                    .collect()
            }
            Self::Operator {
                kind,
                accessor,
                slot,
            } => resolve_leaf(*kind, accessor, &data[*slot], input, ctx),
        }
    }

    /// Tests one document without touching indices.
    pub fn matches(&self, data: &[OperatorData], doc: &Document) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(data, doc)),
            Self::Or(children) => children.iter().any(|c| c.matches(data, doc)),
            Self::Operator {
                kind,
                accessor,
                slot,
            } => evaluate(*kind, accessor.get(doc), &data[*slot].operand),
        }
    }
}

fn resolve_leaf<'d>(
    kind: OperatorKind,
    accessor: &Accessor,
    data: &OperatorData,
    input: Vec<&'d Document>,
    ctx: &ExecContext<'_>,
) -> Vec<&'d Document> {
    let test = |doc: &&'d Document| evaluate(kind, accessor.get(doc), &data.operand);

    if let Some(candidates) = index_candidates(kind, accessor.path(), data, ctx) {
        return input
            .into_iter()
            .filter(|doc| doc.id().is_some_and(|id| candidates.contains(&id)))
            .filter(test)
            .collect();
    }

    if input.len() > ctx.scan_warning_threshold {
        warn!(
            path = accessor.path(),
            operator = %kind,
            documents = input.len(),
            "linear scan over large input"
        );
    }
    input.into_iter().filter(test).collect()
}

fn index_candidates(
    kind: OperatorKind,
    path: &str,
    data: &OperatorData,
    ctx: &ExecContext<'_>,
) -> Option<HashSet<DocId>> {
    let probe = data.operand.as_literal()?;
    let (index, ids) = ctx.indices?.probe(path, kind, probe)?;
    trace!(path, operator = %kind, %index, candidates = ids.len(), "index lookup");
    Some(ids.into_iter().collect())
}
