// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Expression programs.
//!
//! An [`ExprProgram`] describes the projections and the filter of a single
//! relational operator. Every distinct sub-expression is defined once, in a
//! local slot, and referenced from later slots with [`ExprNode::LocalRef`].
//! The projection and the condition name slots, not trees.
//!
//! Programs are built and optimized elsewhere and are immutable here. Before a
//! tree is analyzed it is expanded: every local reference is replaced by the
//! (expanded) definition of its slot.

use serde::{Deserialize, Serialize};

use crate::node::ExprNode;
use crate::relation::RelationDesc;
use crate::stack::{CheckedRecursion, RecursionGuard, RecursionLimitError};
use crate::visit::Visitor;
use crate::RECURSION_LIMIT;

/// The projections and filter condition of one operator, over a shared list
/// of local definitions.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ExprProgram {
    input: RelationDesc,
    expressions: Vec<ExprNode>,
    projection: Vec<usize>,
    condition: Option<usize>,
}

/// A program violates its structural contract.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ProgramError {
    /// A local reference, projection or condition names a missing slot.
    #[error("local slot $t{index} does not exist, program has {len} slots")]
    LocalOutOfRange {
        /// The missing slot.
        index: usize,
        /// The number of slots the program has.
        len: usize,
    },
    /// A slot refers to itself or to a later slot.
    #[error("local slot $t{slot} refers to $t{target}, which is not defined before it")]
    ForwardLocalRef {
        /// The slot holding the reference.
        slot: usize,
        /// The slot it refers to.
        target: usize,
    },
    /// Expanding a tree nested deeper than the recursion limit.
    #[error(transparent)]
    RecursionLimit(#[from] RecursionLimitError),
}

impl ExprProgram {
    /// Assembles a program, checking that every slot only refers to earlier
    /// slots and that the projection and condition name existing slots.
    pub fn new(
        input: RelationDesc,
        expressions: Vec<ExprNode>,
        projection: Vec<usize>,
        condition: Option<usize>,
    ) -> Result<Self, ProgramError> {
        let len = expressions.len();
        let visitor = Visitor::new();
        for (slot, expr) in expressions.iter().enumerate() {
            visitor.try_visit_pre(expr, &mut |e: &ExprNode| match e {
                ExprNode::LocalRef(target) if *target >= slot => {
                    Err(ProgramError::ForwardLocalRef {
                        slot,
                        target: *target,
                    })
                }
                _ => Ok(()),
            })?;
        }
        for index in projection.iter().chain(condition.iter()) {
            if *index >= len {
                return Err(ProgramError::LocalOutOfRange { index: *index, len });
            }
        }
        Ok(ExprProgram {
            input,
            expressions,
            projection,
            condition,
        })
    }

    /// The schema of the program's input row.
    pub fn input(&self) -> &RelationDesc {
        &self.input
    }

    /// The local definitions, in slot order.
    pub fn expressions(&self) -> &[ExprNode] {
        &self.expressions
    }

    /// The slots that produce each output column.
    pub fn projection(&self) -> &[usize] {
        &self.projection
    }

    /// The slot holding the filter condition, if the program filters.
    pub fn condition(&self) -> Option<usize> {
        self.condition
    }

    /// The number of output columns.
    pub fn arity(&self) -> usize {
        self.projection.len()
    }

    /// Returns the fully expanded definition of the local slot `slot`.
    pub fn expand_local(&self, slot: usize) -> Result<ExprNode, ProgramError> {
        self.expand(&ExprNode::LocalRef(slot))
    }

    /// Replaces every local reference in `expr` by its expanded definition.
    pub fn expand(&self, expr: &ExprNode) -> Result<ExprNode, ProgramError> {
        self.expand_with_limit(expr, RECURSION_LIMIT)
    }

    /// Like [`ExprProgram::expand`], but with an explicit recursion limit.
    pub fn expand_with_limit(
        &self,
        expr: &ExprNode,
        limit: usize,
    ) -> Result<ExprNode, ProgramError> {
        Expander {
            expressions: &self.expressions,
            recursion_guard: RecursionGuard::with_limit(limit),
        }
        .expand(expr)
    }

    /// The expanded projections followed by the expanded condition, if any.
    ///
    /// This is the order in which the analyses visit a program.
    pub fn expanded_roots(&self, limit: usize) -> Result<Vec<ExprNode>, ProgramError> {
        self.projection
            .iter()
            .chain(self.condition.iter())
            .map(|slot| self.expand_with_limit(&ExprNode::LocalRef(*slot), limit))
            .collect()
    }
}

struct Expander<'a> {
    expressions: &'a [ExprNode],
    recursion_guard: RecursionGuard,
}

impl CheckedRecursion for Expander<'_> {
    fn recursion_guard(&self) -> &RecursionGuard {
        &self.recursion_guard
    }
}

impl Expander<'_> {
    /// Follows `expr` through local slots until it reaches a definition that
    /// is not itself a local reference.
    fn resolve<'b>(&'b self, mut expr: &'b ExprNode) -> Result<&'b ExprNode, ProgramError> {
        while let ExprNode::LocalRef(index) = expr {
            expr = self
                .expressions
                .get(*index)
                .ok_or_else(|| ProgramError::LocalOutOfRange {
                    index: *index,
                    len: self.expressions.len(),
                })?;
        }
        Ok(expr)
    }

    fn expand(&self, expr: &ExprNode) -> Result<ExprNode, ProgramError> {
        self.checked_recur(|this| {
            let expr = this.resolve(expr)?;
            match expr {
                ExprNode::Call { op, operands } => Ok(ExprNode::Call {
                    op: op.clone(),
                    operands: operands
                        .iter()
                        .map(|operand| this.expand(operand))
                        .collect::<Result<_, _>>()?,
                }),
                ExprNode::FieldAccess { base, field } => Ok(ExprNode::FieldAccess {
                    base: Box::new(this.expand(base)?),
                    field: field.clone(),
                }),
                ExprNode::LocalRef(_)
                | ExprNode::InputRef(_)
                | ExprNode::Literal(..)
                | ExprNode::Opaque(_) => Ok(expr.clone()),
            }
        })
    }
}
