// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use rexa_expr::{ExprNode, ExprProgram, ProgramError, RelationDesc};

/// Builds [`ExprProgram`]s from expanded trees.
///
/// Every distinct sub-expression is stored in exactly one local slot;
/// repeated sub-expressions reuse the slot of their first occurrence.
#[derive(Debug)]
pub struct ProgramBuilder {
    input: RelationDesc,
    expressions: Vec<ExprNode>,
    memo: BTreeMap<ExprNode, usize>,
    projection: Vec<usize>,
    condition: Option<usize>,
}

impl ProgramBuilder {
    /// An empty program over `input`.
    pub fn new(input: RelationDesc) -> Self {
        ProgramBuilder {
            input,
            expressions: Vec::new(),
            memo: BTreeMap::new(),
            projection: Vec::new(),
            condition: None,
        }
    }

    /// Appends an output column computing `expr`.
    pub fn project(mut self, expr: &ExprNode) -> Self {
        let slot = self.memoize(expr);
        self.projection.push(slot);
        self
    }

    /// Sets the filter condition to `expr`.
    pub fn filter(mut self, expr: &ExprNode) -> Self {
        let slot = self.memoize(expr);
        self.condition = Some(slot);
        self
    }

    /// Assembles the program, validating it like [`ExprProgram::new`].
    pub fn build(self) -> Result<ExprProgram, ProgramError> {
        ExprProgram::new(self.input, self.expressions, self.projection, self.condition)
    }

    /// Returns the slot computing `expr`, allocating slots for it and its
    /// sub-expressions as needed.
    ///
    /// Local references in `expr` are kept as they are.
    fn memoize(&mut self, expr: &ExprNode) -> usize {
        let local = match expr {
            ExprNode::Call { op, operands } => ExprNode::Call {
                op: op.clone(),
                operands: operands
                    .iter()
                    .map(|operand| ExprNode::LocalRef(self.memoize(operand)))
                    .collect(),
            },
            ExprNode::FieldAccess { base, field } => ExprNode::FieldAccess {
                base: Box::new(ExprNode::LocalRef(self.memoize(base))),
                field: field.clone(),
            },
            ExprNode::InputRef(_)
            | ExprNode::LocalRef(_)
            | ExprNode::Literal(..)
            | ExprNode::Opaque(_) => expr.clone(),
        };
        if let Some(slot) = self.memo.get(&local) {
            return *slot;
        }
        let slot = self.expressions.len();
        self.expressions.push(local.clone());
        self.memo.insert(local, slot);
        slot
    }
}

#[cfg(test)]
mod tests {
    use rexa_expr::{ColumnType, OperatorKind, ScalarType};

    use super::*;

    #[test]
    fn test_shares_subexpressions() {
        let input = RelationDesc::empty()
            .with_column("a", ColumnType::new(ScalarType::Int64))
            .with_column("b", ColumnType::new(ScalarType::Int64));
        let sum = ExprNode::input(0).call_binary(ExprNode::input(1), OperatorKind::Plus);
        let program = ProgramBuilder::new(input)
            .project(&sum)
            .project(&ExprNode::input(1))
            .filter(&sum.clone().call_binary(sum.clone(), OperatorKind::Equals))
            .build()
            .unwrap();

        // $t0 = $0, $t1 = $1, $t2 = +($t0, $t1), $t3 = =($t2, $t2)
        assert_eq!(program.expressions().len(), 4);
        assert_eq!(program.projection(), &[2, 1]);
        assert_eq!(program.condition(), Some(3));
        assert_eq!(program.expressions()[3].to_string(), "=($t2, $t2)");
        assert_eq!(
            program.expand_local(3).unwrap().to_string(),
            "=(+($0, $1), +($0, $1))"
        );
    }
}
