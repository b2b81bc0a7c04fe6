//! Query compiler.
//!
//! Compilation walks a [`Definition`] once and produces an operation
//! graph plus an operator data table. Leaves refer to the table by slot,
//! so the graph depends only on the structure of the definition: two
//! definitions that differ only in literal values share one graph, and
//! [`Query::fork`] swaps literals without recompiling.

use crate::accessor::AccessorCache;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::operators::{Operand, OperatorKind, Predicates};
use crate::query::definition::Definition;
use crate::query::executor::{ExecContext, Operation};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Literal and compiled operand of one leaf.
#[derive(Debug, Clone)]
pub struct OperatorData {
    /// Operator applied by the leaf.
    pub kind: OperatorKind,
    /// Field path the leaf reads.
    pub path: String,
    /// Raw operand as written in the definition.
    pub value: serde_json::Value,
    /// Compiled operand.
    pub operand: Operand,
}

/// A compiled query.
#[derive(Debug, Clone)]
pub struct Query {
    root: Option<Arc<Operation>>,
    data: Vec<OperatorData>,
    pointers: BTreeMap<String, usize>,
    structure: String,
}

impl Query {
    /// Compiles a JSON definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for unknown operators or
    /// combinators, malformed shapes and invalid operands.
    pub fn compile(definition: &serde_json::Value) -> CoreResult<Self> {
        Self::compile_with(definition, &Predicates::new(), &AccessorCache::new())
    }

    /// Compiles with host predicates for `where` and a shared accessor cache.
    ///
    /// # Errors
    ///
    /// See [`Query::compile`].
    pub fn compile_with(
        definition: &serde_json::Value,
        predicates: &Predicates,
        accessors: &AccessorCache,
    ) -> CoreResult<Self> {
        Self::from_definition(&Definition::parse(definition)?, predicates, accessors)
    }

    /// Compiles an already parsed definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Compilation`] for invalid operands.
    pub fn from_definition(
        definition: &Definition,
        predicates: &Predicates,
        accessors: &AccessorCache,
    ) -> CoreResult<Self> {
        let mut builder = Builder {
            predicates,
            accessors,
            data: Vec::new(),
            pointers: BTreeMap::new(),
        };
        let root = builder.build(definition, "")?.map(Arc::new);
        let structure = definition.structure_signature();
        trace!(structure = %structure, leaves = builder.data.len(), "compiled query");
        Ok(Self {
            root,
            data: builder.data,
            pointers: builder.pointers,
            structure,
        })
    }

    /// Reuses this query's graph with the literals of `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `definition` has a
    /// different structure, or a compilation error for its operands.
    pub fn rebind(&self, definition: &Definition, predicates: &Predicates) -> CoreResult<Self> {
        if definition.structure_signature() != self.structure {
            return Err(CoreError::invalid_operation(format!(
                "cannot rebind `{}` to `{}`",
                self.structure,
                definition.structure_signature()
            )));
        }
        let mut data = self.data.clone();
        for (slot, (kind, _, value)) in data.iter_mut().zip(definition.leaves()) {
            slot.operand = Operand::compile(kind, value, predicates)?;
            slot.value = value.clone();
        }
        Ok(Self {
            root: self.root.clone(),
            data,
            pointers: self.pointers.clone(),
            structure: self.structure.clone(),
        })
    }

    /// Returns a copy with some literals replaced.
    ///
    /// `bindings` is a map whose keys are pointer keys (`/and/1/eq/surname`)
    /// or field paths; a field path must name exactly one leaf.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] for unknown or ambiguous
    /// keys and a compilation error for invalid operands.
    pub fn fork(&self, bindings: &serde_json::Value) -> CoreResult<Self> {
        self.fork_with(bindings, &Predicates::new())
    }

    /// [`fork`](Self::fork) with host predicates for `where` leaves.
    ///
    /// # Errors
    ///
    /// See [`Query::fork`].
    pub fn fork_with(&self, bindings: &serde_json::Value, predicates: &Predicates) -> CoreResult<Self> {
        let bindings = bindings
            .as_object()
            .ok_or_else(|| CoreError::invalid_operation("fork bindings must be a map"))?;
        let mut forked = self.clone();
        for (key, value) in bindings {
            let slot = self.slot_for(key)?;
            let data = &mut forked.data[slot];
            data.operand = Operand::compile(data.kind, value, predicates)?;
            data.value = value.clone();
        }
        Ok(forked)
    }

    fn slot_for(&self, key: &str) -> CoreResult<usize> {
        if let Some(slot) = self.pointers.get(key) {
            return Ok(*slot);
        }
        let mut matching = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, data)| data.path == key)
            .map(|(slot, _)| slot);
        match (matching.next(), matching.next()) {
            (Some(slot), None) => Ok(slot),
            (Some(_), Some(_)) => Err(CoreError::invalid_operation(format!(
                "binding `{key}` matches several leaves, use a pointer key"
            ))),
            (None, _) => Err(CoreError::invalid_operation(format!("no leaf bound to `{key}`"))),
        }
    }

    /// Returns true if the definition was empty.
    pub fn is_match_all(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the operation graph root.
    pub fn root(&self) -> Option<&Operation> {
        self.root.as_deref()
    }

    /// Returns the operator data table.
    pub fn operator_data(&self) -> &[OperatorData] {
        &self.data
    }

    /// Returns the pointer map from leaf path to data slot.
    pub fn pointers(&self) -> &BTreeMap<String, usize> {
        &self.pointers
    }

    /// Signature of the query shape without literal values.
    pub fn structure_signature(&self) -> &str {
        &self.structure
    }

    /// Signature including the current literal values.
    pub fn value_signature(&self) -> String {
        let mut signature = self.structure.clone();
        for data in &self.data {
            signature.push('|');
            signature.push_str(&data.value.to_string());
        }
        signature
    }

    /// Returns true if the two queries share one compiled graph.
    pub fn shares_graph(&self, other: &Query) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Filters `docs` down to the matching ones, preserving order.
    pub fn resolve<'d>(&self, docs: &[&'d Document]) -> Vec<&'d Document> {
        self.resolve_with(docs, &ExecContext::default())
    }

    /// Filters `docs` with access to indices.
    pub fn resolve_with<'d>(&self, docs: &[&'d Document], ctx: &ExecContext<'_>) -> Vec<&'d Document> {
        match &self.root {
            None => docs.to_vec(),
            Some(root) => root.resolve(&self.data, docs.to_vec(), ctx),
        }
    }

    /// Tests a single document.
    pub fn object_matches(&self, doc: &Document) -> bool {
        self.root
            .as_ref()
            .map_or(true, |root| root.matches(&self.data, doc))
    }
}

struct Builder<'c> {
    predicates: &'c Predicates,
    accessors: &'c AccessorCache,
    data: Vec<OperatorData>,
    pointers: BTreeMap<String, usize>,
}

impl Builder<'_> {
    fn build(&mut self, definition: &Definition, prefix: &str) -> CoreResult<Option<Operation>> {
        let operation = match definition {
            Definition::MatchAll => return Ok(None),
            Definition::And(children) => Operation::And(self.children(children, &format!("{prefix}/and"))?),
            Definition::Or(children) => Operation::Or(self.children(children, &format!("{prefix}/or"))?),
            Definition::Leaf { kind, path, operand } => {
                let slot = self.data.len();
                self.data.push(OperatorData {
                    kind: *kind,
                    path: path.clone(),
                    value: operand.clone(),
                    operand: Operand::compile(*kind, operand, self.predicates)?,
                });
                self.pointers.insert(format!("{prefix}/{kind}/{path}"), slot);
                Operation::Operator {
                    kind: *kind,
                    accessor: self.accessors.get_or_compile(path),
                    slot,
                }
            }
        };
        Ok(Some(operation))
    }

    fn children(&mut self, children: &[Definition], prefix: &str) -> CoreResult<Vec<Operation>> {
        let mut out = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            if let Some(operation) = self.build(child, &format!("{prefix}/{i}"))? {
                out.push(operation);
            }
        }
        Ok(out)
    }
}
