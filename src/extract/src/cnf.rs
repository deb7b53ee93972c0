// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use rexa_expr::{Datum, ExprNode, Operator, OperatorKind};

/// Rewrites boolean trees into conjunctive normal form.
///
/// Normalization itself belongs to the expression library that builds
/// programs; the analyses only consume its result.
pub trait ConjunctiveNormalizer {
    /// Returns a tree logically equivalent to `expr` that is an `AND` of
    /// clauses containing no further `AND`.
    ///
    /// If the normal form would have more than `max_node_count` nodes, the
    /// implementation may return `expr` unchanged.
    fn to_cnf(&self, expr: ExprNode, max_node_count: Option<usize>) -> ExprNode;

    /// Splits a normalized tree into its top-level conjuncts, in order.
    fn conjuncts(&self, cnf: ExprNode) -> Vec<ExprNode> {
        split_conjuncts(cnf)
    }
}

/// Flattens nested `AND` calls into their operands, left to right.
///
/// Literal `true` conjuncts carry no information and are dropped.
pub fn split_conjuncts(expr: ExprNode) -> Vec<ExprNode> {
    let mut conjuncts = Vec::new();
    let mut todo = vec![expr];
    while let Some(expr) = todo.pop() {
        match expr {
            ExprNode::Call {
                op: Operator::Kind(OperatorKind::And),
                operands,
            } => todo.extend(operands.into_iter().rev()),
            ExprNode::Literal(Datum::Bool(true), _) => {}
            expr => conjuncts.push(expr),
        }
    }
    conjuncts
}

#[cfg(test)]
mod tests {
    use rexa_expr::{ColumnType, ScalarType};

    use super::*;

    #[test]
    fn test_split_conjuncts() {
        let bool_type = ColumnType::new(ScalarType::Bool);
        let a = ExprNode::input(0);
        let b = ExprNode::input(1).not();
        let c = ExprNode::input(2).or(ExprNode::input(3));
        let d = ExprNode::input(4).call_unary(OperatorKind::IsNull);
        let expr = a
            .clone()
            .and(b.clone().and(ExprNode::literal(true, bool_type)))
            .and(c.clone())
            .and(d.clone());
        assert_eq!(split_conjuncts(expr), vec![a, b, c, d]);
    }

    #[test]
    fn test_split_non_conjunction() {
        let expr = ExprNode::input(0).or(ExprNode::input(1).and(ExprNode::input(2)));
        assert_eq!(split_conjuncts(expr.clone()), vec![expr]);
    }
}
