// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Input columns referenced by a program.

use std::collections::BTreeSet;

use rexa_expr::visit::Visitor;
use rexa_expr::{ExprNode, ExprProgram};

use crate::{ExtractConfig, ExtractError};

/// Returns the input columns referenced by the projections and the condition
/// of `program`.
///
/// Each column appears once, in the order in which a pre-order walk of the
/// projections (in output order) and then the condition first reaches it.
#[tracing::instrument(target = "optimizer", level = "trace", skip_all)]
pub fn extract_ref_input_fields(
    program: &ExprProgram,
    config: &ExtractConfig,
) -> Result<Vec<usize>, ExtractError> {
    let roots = program.expanded_roots(config.recursion_limit)?;
    extract_ref_input_fields_from_exprs(&roots, config)
}

/// Like [`extract_ref_input_fields`], for already expanded trees.
pub fn extract_ref_input_fields_from_exprs<'a, I>(
    exprs: I,
    config: &ExtractConfig,
) -> Result<Vec<usize>, ExtractError>
where
    I: IntoIterator<Item = &'a ExprNode>,
{
    let visitor = Visitor::with_limit(config.recursion_limit);
    let mut seen = BTreeSet::new();
    let mut fields = Vec::new();
    for expr in exprs {
        visitor.visit_pre(expr, &mut |e: &ExprNode| {
            if let ExprNode::InputRef(index) = e {
                if seen.insert(*index) {
                    fields.push(*index);
                }
            }
        })?;
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use rexa_expr::{ColumnType, OperatorKind, RelationDesc, ScalarType};

    use super::*;

    fn input(arity: usize) -> RelationDesc {
        RelationDesc::new(
            (0..arity).map(|i| (format!("f{}", i), ColumnType::new(ScalarType::Int64))),
        )
    }

    #[test]
    fn test_first_visit_order() {
        // $t0 = $2, $t1 = $0, $t2 = +($t0, $t1), $t3 = $3.x, $t4 = =($t3, $t1)
        let program = ExprProgram::new(
            input(5),
            vec![
                ExprNode::input(2),
                ExprNode::input(0),
                ExprNode::local(0).call_binary(ExprNode::local(1), OperatorKind::Plus),
                ExprNode::input(3).field("x"),
                ExprNode::local(3).call_binary(ExprNode::local(1), OperatorKind::Equals),
            ],
            vec![1, 2],
            Some(4),
        )
        .unwrap();
        let fields = extract_ref_input_fields(&program, &ExtractConfig::default()).unwrap();
        assert_eq!(fields, vec![0, 2, 3]);
    }

    #[test]
    fn test_no_references() {
        let int = ColumnType::new(ScalarType::Int64);
        let program = ExprProgram::new(
            input(2),
            vec![ExprNode::literal(1i64, int)],
            vec![0, 0],
            None,
        )
        .unwrap();
        let fields = extract_ref_input_fields(&program, &ExtractConfig::default()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_from_exprs() {
        let exprs = vec![
            ExprNode::input(4).field("a").field("b"),
            ExprNode::input(1).and(ExprNode::input(4)),
        ];
        let fields =
            extract_ref_input_fields_from_exprs(&exprs, &ExtractConfig::default()).unwrap();
        assert_eq!(fields, vec![4, 1]);
    }
}
