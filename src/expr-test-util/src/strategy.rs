// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! `proptest` strategies for expression trees and programs.

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::strategy::Union;
use rexa_expr::{
    ColumnType, ExprNode, ExprProgram, OpaqueKind, Operator, OperatorKind, RelationDesc, ScalarType,
};

use crate::ProgramBuilder;

/// Generates an arbitrary column type. Records have the fields `a` and `b`,
/// the second of which is itself a record.
pub fn arb_column_type() -> BoxedStrategy<ColumnType> {
    let inner = ScalarType::Record {
        fields: vec![
            ("a".into(), ColumnType::new(ScalarType::String)),
            ("c".into(), ColumnType::new(ScalarType::Int64)),
        ],
    };
    let record = ScalarType::Record {
        fields: vec![
            ("a".into(), ColumnType::new(ScalarType::Int32)),
            ("b".into(), ColumnType::new(inner)),
        ],
    };
    let scalar = Union::new(vec![
        Just(ScalarType::Bool).boxed(),
        Just(ScalarType::Int32).boxed(),
        Just(ScalarType::Int64).boxed(),
        Just(ScalarType::String).boxed(),
        Just(record).boxed(),
    ]);
    (scalar, any::<bool>())
        .prop_map(|(scalar_type, nullable)| ColumnType::new(scalar_type).nullable(nullable))
        .boxed()
}

/// Generates an arbitrary literal.
pub fn arb_literal() -> BoxedStrategy<ExprNode> {
    Union::new(vec![
        any::<bool>()
            .prop_map(|b| ExprNode::literal(b, ColumnType::new(ScalarType::Bool)))
            .boxed(),
        any::<i32>()
            .prop_map(|i| ExprNode::literal(i, ColumnType::new(ScalarType::Int32)))
            .boxed(),
        any::<i64>()
            .prop_map(|i| ExprNode::literal(i, ColumnType::new(ScalarType::Int64)))
            .boxed(),
        "[a-z]{0,4}"
            .prop_map(|s| ExprNode::literal(s, ColumnType::new(ScalarType::String)))
            .boxed(),
        Just(ExprNode::literal_null(ColumnType::new(ScalarType::Int32))).boxed(),
    ])
    .boxed()
}

/// Generates an arbitrary operator: a built-in kind, a named function or a
/// postfix operator.
pub fn arb_operator() -> BoxedStrategy<Operator> {
    Union::new_weighted(vec![
        (6, any::<OperatorKind>().prop_map(Operator::Kind).boxed()),
        (
            2,
            prop::sample::select(vec!["UPPER", "LOWER", "SUBSTRING", "my_func"])
                .prop_map(Operator::function)
                .boxed(),
        ),
        (
            1,
            prop::sample::select(vec!["IS NULL", "IS NOT NULL"])
                .prop_map(Operator::postfix)
                .boxed(),
        ),
    ])
    .boxed()
}

/// Generates an arbitrary expanded tree over an input with `arity` columns.
///
/// Field names are drawn from `a`, `b` and `c`, so generated trees often
/// access fields that [`arb_column_type`] records have, and sometimes ones
/// they don't.
///
/// # Panics
///
/// Panics if `arity` is zero.
pub fn arb_expanded_expr(arity: usize) -> BoxedStrategy<ExprNode> {
    assert!(arity > 0, "expressions need at least one input column");
    let leaf = Union::new_weighted(vec![
        (6, (0..arity).prop_map(ExprNode::InputRef).boxed()),
        (3, arb_literal()),
        (1, any::<OpaqueKind>().prop_map(ExprNode::Opaque).boxed()),
    ]);
    leaf.prop_recursive(4, 32, 3, |inner| {
        Union::new_weighted(vec![
            (
                3,
                (arb_operator(), vec(inner.clone(), 1..=3))
                    .prop_map(|(op, operands)| ExprNode::call(op, operands))
                    .boxed(),
            ),
            (
                2,
                (inner, "[a-c]")
                    .prop_map(|(base, field)| base.field(field))
                    .boxed(),
            ),
        ])
    })
    .boxed()
}

/// Generates an arbitrary input relation with one to five columns.
pub fn arb_relation_desc() -> BoxedStrategy<RelationDesc> {
    vec(arb_column_type(), 1..6)
        .prop_map(|types| {
            RelationDesc::new(
                types
                    .into_iter()
                    .enumerate()
                    .map(|(i, typ)| (format!("c{}", i), typ)),
            )
        })
        .boxed()
}

/// Generates an arbitrary program with up to three projections and an
/// optional condition. Common sub-expressions share local slots.
pub fn arb_program() -> BoxedStrategy<ExprProgram> {
    arb_relation_desc()
        .prop_flat_map(|input| {
            let arity = input.arity();
            (
                Just(input),
                vec(arb_expanded_expr(arity), 0..4),
                proptest::option::of(arb_expanded_expr(arity)),
            )
        })
        .prop_filter_map("program must be well formed", |(input, projections, condition)| {
            let mut builder = ProgramBuilder::new(input);
            for projection in &projections {
                builder = builder.project(projection);
            }
            if let Some(condition) = &condition {
                builder = builder.filter(condition);
            }
            builder.build().ok()
        })
        .boxed()
}
