// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use rexa_expr::visit::VisitChildren;
use rexa_expr::{ExprNode, OperatorKind};
use rexa_extract::ConjunctiveNormalizer;

/// A textbook CNF conversion.
///
/// Negations are pushed down to the leaves with De Morgan's laws, then `OR`
/// is distributed over `AND`. Calls of any other operator are treated as
/// atoms. If the result has more than `max_node_count` nodes the input is
/// returned unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestCnf;

impl ConjunctiveNormalizer for TestCnf {
    fn to_cnf(&self, expr: ExprNode, max_node_count: Option<usize>) -> ExprNode {
        let clauses = clauses(&negation_normal_form(&expr, false))
            .into_iter()
            .map(|clause| connect(OperatorKind::Or, clause))
            .collect();
        let cnf = connect(OperatorKind::And, clauses);
        match max_node_count {
            Some(max) if node_count(&cnf) > max => expr,
            _ => cnf,
        }
    }
}

/// The number of nodes in `expr`.
pub fn node_count(expr: &ExprNode) -> usize {
    let mut count = 1;
    expr.visit_children(|child| count += node_count(child));
    count
}

/// Returns the operands of `expr` if it is a well-formed `AND`, `OR` or `NOT`.
fn connective(expr: &ExprNode) -> Option<(OperatorKind, &[ExprNode])> {
    for kind in [OperatorKind::And, OperatorKind::Or] {
        match expr.as_call_kind(kind) {
            Some(operands) if operands.len() >= 2 => return Some((kind, operands)),
            _ => (),
        }
    }
    match expr.as_call_kind(OperatorKind::Not) {
        Some(operands) if operands.len() == 1 => Some((OperatorKind::Not, operands)),
        _ => None,
    }
}

fn negation_normal_form(expr: &ExprNode, negate: bool) -> ExprNode {
    match connective(expr) {
        Some((OperatorKind::Not, [operand])) => negation_normal_form(operand, !negate),
        Some((kind, operands)) => {
            let kind = match (kind, negate) {
                (OperatorKind::And, true) => OperatorKind::Or,
                (OperatorKind::Or, true) => OperatorKind::And,
                (kind, _) => kind,
            };
            let operands = operands
                .iter()
                .map(|operand| negation_normal_form(operand, negate))
                .collect();
            ExprNode::call_kind(kind, operands)
        }
        None if negate => expr.clone().not(),
        None => expr.clone(),
    }
}

/// The clauses of `expr`, which must be in negation normal form. Each clause
/// is a non-empty disjunction of atoms.
fn clauses(expr: &ExprNode) -> Vec<Vec<ExprNode>> {
    match connective(expr) {
        Some((OperatorKind::And, operands)) => operands.iter().flat_map(clauses).collect(),
        Some((OperatorKind::Or, operands)) => {
            operands
                .iter()
                .map(clauses)
                .fold(vec![Vec::new()], |acc, next| {
                    let mut product = Vec::with_capacity(acc.len() * next.len());
                    for left in &acc {
                        for right in &next {
                            product.push(left.iter().chain(right).cloned().collect::<Vec<_>>());
                        }
                    }
                    product
                })
        }
        _ => vec![vec![expr.clone()]],
    }
}

/// Joins `operands` with `kind`, or returns the single operand.
fn connect(kind: OperatorKind, mut operands: Vec<ExprNode>) -> ExprNode {
    if operands.len() == 1 {
        if let Some(operand) = operands.pop() {
            return operand;
        }
    }
    ExprNode::call_kind(kind, operands)
}
