// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation of program trees into portable expressions.

use std::fmt;

use rexa_expr::stack::{CheckedRecursion, RecursionGuard};
use rexa_expr::{ExprNode, PortableExpr, RelationDesc, RECURSION_LIMIT};
use tracing::trace;

use crate::catalog::{normalize_function_name, FunctionCatalog};
use crate::ExtractError;

/// Translates expanded program trees into [`PortableExpr`]s.
///
/// Input columns are named after the input schema and calls are resolved
/// through a [`FunctionCatalog`]. A tree that cannot be expressed in the
/// portable form translates to `None`: field accesses, opaque nodes, calls
/// the catalog does not resolve, and every call with such an operand.
pub struct ExprTranslator<'a> {
    input: &'a RelationDesc,
    catalog: &'a dyn FunctionCatalog,
    recursion_guard: RecursionGuard,
}

impl fmt::Debug for ExprTranslator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExprTranslator")
            .field("input", &self.input)
            .field("recursion_guard", &self.recursion_guard)
            .finish_non_exhaustive()
    }
}

impl CheckedRecursion for ExprTranslator<'_> {
    fn recursion_guard(&self) -> &RecursionGuard {
        &self.recursion_guard
    }
}

impl<'a> ExprTranslator<'a> {
    /// A translator over rows of `input` that resolves calls with `catalog`.
    pub fn new(input: &'a RelationDesc, catalog: &'a dyn FunctionCatalog) -> Self {
        ExprTranslator {
            input,
            catalog,
            recursion_guard: RecursionGuard::with_limit(RECURSION_LIMIT),
        }
    }

    /// Replaces the recursion limit of the translator.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_guard = RecursionGuard::with_limit(limit);
        self
    }

    /// Translates `expr`, returning `Ok(None)` if it has no portable form.
    ///
    /// `expr` must be expanded and refer only to columns of the input; both
    /// violations are reported as errors.
    pub fn translate(&self, expr: &ExprNode) -> Result<Option<PortableExpr>, ExtractError> {
        self.checked_recur(|this| match expr {
            ExprNode::InputRef(index) => match this.input.get(*index) {
                Some((name, typ)) => Ok(Some(PortableExpr::field(name, typ.clone()))),
                None => Err(ExtractError::InputOutOfRange {
                    index: *index,
                    arity: this.input.arity(),
                }),
            },
            ExprNode::LocalRef(index) => Err(ExtractError::UnexpandedLocal(*index)),
            ExprNode::Literal(value, typ) => Ok(Some(PortableExpr::Literal {
                value: value.clone(),
                typ: typ.clone(),
            })),
            ExprNode::Call { op, operands } => {
                // Every operand is translated, so that broken operands are
                // reported even when an earlier one has no portable form.
                let translated = operands
                    .iter()
                    .map(|operand| this.translate(operand))
                    .collect::<Result<Vec<_>, _>>()?;
                let Some(args) = translated.into_iter().collect::<Option<Vec<_>>>() else {
                    return Ok(None);
                };
                let name = normalize_function_name(op.label());
                match this.catalog.lookup(&name, args) {
                    Ok(expr) => Ok(Some(expr)),
                    Err(err) => {
                        trace!(target: "optimizer", %err, "cannot translate call to {}", op);
                        Ok(None)
                    }
                }
            }
            ExprNode::FieldAccess { .. } | ExprNode::Opaque(_) => Ok(None),
        })
    }
}
