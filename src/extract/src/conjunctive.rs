// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Conjuncts of a program's condition, in portable form where possible.

use rexa_expr::{ExprNode, ExprProgram, PortableExpr};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::FunctionCatalog;
use crate::cnf::ConjunctiveNormalizer;
use crate::translate::ExprTranslator;
use crate::{ExtractConfig, ExtractError};

/// The conjuncts of a condition, partitioned by whether they translate.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConjunctiveConditions {
    /// Translated conjuncts, in conjunct order.
    pub converted: Vec<PortableExpr>,
    /// Conjuncts without a portable form, in conjunct order. These must stay
    /// behind as a residual filter.
    pub unconverted: Vec<ExprNode>,
}

impl ConjunctiveConditions {
    /// The total number of conjuncts.
    pub fn len(&self) -> usize {
        self.converted.len() + self.unconverted.len()
    }

    /// True if the condition had no conjuncts (or there was no condition).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits the condition of `program` into conjuncts and translates each.
///
/// The condition is expanded, brought into conjunctive normal form by
/// `normalizer`, and split into its top-level conjuncts. Each conjunct is
/// translated on its own with `catalog`; one that fails to translate ends up
/// in [`ConjunctiveConditions::unconverted`] without affecting the others.
/// Programs without a condition produce no conjuncts.
#[tracing::instrument(target = "optimizer", level = "trace", skip_all)]
pub fn extract_conjunctive_conditions(
    program: &ExprProgram,
    normalizer: &dyn ConjunctiveNormalizer,
    catalog: &dyn FunctionCatalog,
    config: &ExtractConfig,
) -> Result<ConjunctiveConditions, ExtractError> {
    let mut conditions = ConjunctiveConditions::default();
    let Some(condition) = program.condition() else {
        return Ok(conditions);
    };

    let expanded =
        program.expand_with_limit(&ExprNode::LocalRef(condition), config.recursion_limit)?;
    let cnf = normalizer.to_cnf(expanded, config.max_cnf_node_count);
    let translator =
        ExprTranslator::new(program.input(), catalog).with_recursion_limit(config.recursion_limit);

    for conjunct in normalizer.conjuncts(cnf) {
        match translator.translate(&conjunct)? {
            Some(expr) => conditions.converted.push(expr),
            None => {
                debug!(target: "optimizer", %conjunct, "conjunct has no portable form");
                conditions.unconverted.push(conjunct);
            }
        }
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rexa_expr::{ColumnType, OpaqueKind, OperatorKind, RelationDesc, ScalarType};

    use crate::LookupError;

    use super::*;

    /// Treats every tree as already normalized.
    struct AlreadyCnf {
        calls: Cell<usize>,
    }

    impl ConjunctiveNormalizer for AlreadyCnf {
        fn to_cnf(&self, expr: ExprNode, _max_node_count: Option<usize>) -> ExprNode {
            self.calls.set(self.calls.get() + 1);
            expr
        }
    }

    fn comparisons(name: &str, args: Vec<PortableExpr>) -> Result<PortableExpr, LookupError> {
        match name {
            "GREATERTHAN" | "EQUALS" => Ok(PortableExpr::Call {
                func: name.to_string(),
                args,
                typ: ColumnType::new(ScalarType::Bool),
            }),
            _ => Err(LookupError::UnknownFunction(name.to_string())),
        }
    }

    fn extract(
        program: &ExprProgram,
        normalizer: &AlreadyCnf,
    ) -> Result<ConjunctiveConditions, ExtractError> {
        extract_conjunctive_conditions(program, normalizer, &comparisons, &ExtractConfig::default())
    }

    fn input() -> RelationDesc {
        RelationDesc::empty()
            .with_column("a", ColumnType::new(ScalarType::Int32))
            .with_column("b", ColumnType::new(ScalarType::Int32))
    }

    #[test]
    fn test_no_condition() {
        let program = ExprProgram::new(input(), vec![ExprNode::input(0)], vec![0], None).unwrap();
        let normalizer = AlreadyCnf { calls: Cell::new(0) };
        let conditions = extract(&program, &normalizer).unwrap();
        assert!(conditions.is_empty());
        assert_eq!(conditions, ConjunctiveConditions::default());
        assert_eq!(normalizer.calls.get(), 0);
    }

    #[test]
    fn test_partitions_conjuncts() {
        let int = ColumnType::new(ScalarType::Int32);
        // $t0 = $0, $t1 = >($t0, 5), $t2 = $1.f, $t3 = =($t2, 3), $t4 = =($0, ?0),
        // $t5 = AND($t1, $t3), $t6 = AND($t5, $t4), $t7 = =($1, 3), $t8 = AND($t6, $t7)
        let program = ExprProgram::new(
            input(),
            vec![
                ExprNode::input(0),
                ExprNode::local(0)
                    .call_binary(ExprNode::literal(5, int.clone()), OperatorKind::GreaterThan),
                ExprNode::input(1).field("f"),
                ExprNode::local(2)
                    .call_binary(ExprNode::literal(3, int.clone()), OperatorKind::Equals),
                ExprNode::local(0).call_binary(
                    ExprNode::Opaque(OpaqueKind::DynamicParam { index: 0 }),
                    OperatorKind::Equals,
                ),
                ExprNode::local(1).and(ExprNode::local(3)),
                ExprNode::local(5).and(ExprNode::local(4)),
                ExprNode::input(1).call_binary(ExprNode::literal(3, int), OperatorKind::Equals),
                ExprNode::local(6).and(ExprNode::local(7)),
            ],
            vec![0],
            Some(8),
        )
        .unwrap();
        let normalizer = AlreadyCnf { calls: Cell::new(0) };
        let conditions = extract(&program, &normalizer).unwrap();

        assert_eq!(normalizer.calls.get(), 1);
        assert_eq!(conditions.len(), 4);
        let converted: Vec<_> = conditions.converted.iter().map(|e| e.to_string()).collect();
        assert_eq!(converted, vec!["GREATERTHAN(a, 5)", "EQUALS(b, 3)"]);
        let unconverted: Vec<_> = conditions.unconverted.iter().map(|e| e.to_string()).collect();
        assert_eq!(unconverted, vec!["=($1.f, 3:integer)", "=($0, ?0)"]);
    }

    #[test]
    fn test_contract_violation_aborts() {
        let program = ExprProgram::new(
            input(),
            vec![ExprNode::input(0), ExprNode::input(7).call_unary(OperatorKind::IsNull)],
            vec![0],
            Some(1),
        )
        .unwrap();
        let normalizer = AlreadyCnf { calls: Cell::new(0) };
        let err = extract(&program, &normalizer).unwrap_err();
        assert_eq!(err, ExtractError::InputOutOfRange { index: 7, arity: 2 });
    }
}
