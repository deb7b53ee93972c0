// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Properties of the analyses over randomly generated programs.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use proptest::prelude::*;
use rexa_expr::{ExprNode, ExprProgram, RECURSION_LIMIT};
use rexa_expr_test_util::strategy::arb_program;
use rexa_expr_test_util::{TestCatalog, TestCnf};
use rexa_extract::{
    extract_conjunctive_conditions, extract_ref_input_fields, extract_ref_nested_input_fields,
    minimal_prefix_cover, split_conjuncts, ConjunctiveNormalizer, ExprTranslator, ExtractConfig,
    PathMatching, WILDCARD,
};

/// Input columns in the order a pre-order walk first reaches them.
fn first_visits(expr: &ExprNode, fields: &mut Vec<usize>) {
    match expr {
        ExprNode::InputRef(index) => {
            if !fields.contains(index) {
                fields.push(*index);
            }
        }
        ExprNode::Call { operands, .. } => {
            for operand in operands {
                first_visits(operand, fields);
            }
        }
        ExprNode::FieldAccess { base, .. } => first_visits(base, fields),
        ExprNode::LocalRef(_) | ExprNode::Literal(..) | ExprNode::Opaque(_) => {}
    }
}

/// Every path through which `expr` accesses an input column.
fn recorded_paths(expr: &ExprNode, paths: &mut BTreeMap<usize, BTreeSet<String>>) {
    match expr {
        ExprNode::InputRef(index) => {
            paths.entry(*index).or_default().insert(WILDCARD.to_string());
        }
        ExprNode::FieldAccess { .. } => {
            let mut fields = Vec::new();
            let mut base = expr;
            while let ExprNode::FieldAccess { base: inner, field } = base {
                fields.push(field.as_str());
                base = inner;
            }
            match base {
                ExprNode::InputRef(index) => {
                    let path = fields.into_iter().rev().join(".");
                    paths.entry(*index).or_default().insert(path);
                }
                base => recorded_paths(base, paths),
            }
        }
        ExprNode::Call { operands, .. } => {
            for operand in operands {
                recorded_paths(operand, paths);
            }
        }
        ExprNode::LocalRef(_) | ExprNode::Literal(..) | ExprNode::Opaque(_) => {}
    }
}

fn roots(program: &ExprProgram) -> Vec<ExprNode> {
    program.expanded_roots(RECURSION_LIMIT).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn ref_input_fields_in_first_visit_order(program in arb_program()) {
        let fields = extract_ref_input_fields(&program, &ExtractConfig::default()).unwrap();

        let mut expected = Vec::new();
        for root in roots(&program) {
            first_visits(&root, &mut expected);
        }
        prop_assert_eq!(&fields, &expected);
        prop_assert!(fields.iter().all(|f| *f < program.input().arity()));
        prop_assert!(fields.iter().all_unique());

        let again = extract_ref_input_fields(&program, &ExtractConfig::default()).unwrap();
        prop_assert_eq!(fields, again);
    }

    #[test]
    fn conjuncts_partition_in_order(program in arb_program()) {
        let config = ExtractConfig::default();
        let catalog = TestCatalog::default();
        let conditions =
            extract_conjunctive_conditions(&program, &TestCnf, &catalog, &config).unwrap();

        let conjuncts = match program.condition() {
            Some(condition) => {
                let expanded = program.expand_local(condition).unwrap();
                split_conjuncts(TestCnf.to_cnf(expanded, None))
            }
            None => Vec::new(),
        };
        prop_assert_eq!(conditions.len(), conjuncts.len());

        let translator = ExprTranslator::new(program.input(), &catalog);
        let mut converted = conditions.converted.iter();
        let mut unconverted = conditions.unconverted.iter();
        for conjunct in &conjuncts {
            match translator.translate(conjunct).unwrap() {
                Some(expr) => prop_assert_eq!(Some(&expr), converted.next()),
                None => prop_assert_eq!(Some(conjunct), unconverted.next()),
            }
        }

        let again = extract_conjunctive_conditions(&program, &TestCnf, &catalog, &config).unwrap();
        prop_assert_eq!(conditions, again);
    }

    #[test]
    fn nested_fields_are_a_minimal_cover(program in arb_program()) {
        let config = ExtractConfig::default();
        let used_fields = extract_ref_input_fields(&program, &config).unwrap();
        let nested = extract_ref_nested_input_fields(&program, &used_fields, &config).unwrap();
        prop_assert_eq!(nested.len(), used_fields.len());

        let mut recorded = BTreeMap::new();
        for root in roots(&program) {
            recorded_paths(&root, &mut recorded);
        }
        for (field, cover) in used_fields.iter().zip(&nested) {
            let paths = recorded.get(field).cloned().unwrap_or_default();
            let covers = |prefix: &String, path: &String| {
                prefix == WILDCARD || PathMatching::StringPrefix.covers(prefix, path)
            };

            prop_assert!(cover.iter().all(|p| paths.contains(p)));
            prop_assert!(paths.iter().all(|path| cover.iter().any(|p| covers(p, path))));
            for (a, b) in cover.iter().tuple_combinations() {
                prop_assert!(!covers(a, b) && !covers(b, a), "{} and {}", a, b);
            }
            prop_assert_eq!(
                cover.iter().any(|p| p == WILDCARD),
                paths.contains(WILDCARD)
            );
            if paths.contains(WILDCARD) {
                prop_assert_eq!(cover, &vec![WILDCARD.to_string()]);
            }
        }

        let again = extract_ref_nested_input_fields(&program, &used_fields, &config).unwrap();
        prop_assert_eq!(nested, again);
    }

    #[test]
    fn prefix_cover_is_idempotent(paths in proptest::collection::vec("[ab*](\\.[ab]){0,2}", 0..8)) {
        for matching in [PathMatching::StringPrefix, PathMatching::Segment] {
            let cover = minimal_prefix_cover(paths.clone(), matching);
            prop_assert_eq!(minimal_prefix_cover(cover.clone(), matching), cover.clone());
            prop_assert!(cover.windows(2).all(|w| w[0] < w[1]));
            for path in &paths {
                prop_assert!(
                    cover.iter().any(|p| p == WILDCARD || matching.covers(p, path)),
                    "{} is not covered by {:?}",
                    path,
                    cover
                );
            }
        }
    }
}
