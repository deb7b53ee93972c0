// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! End-to-end runs of the analyses that need more than printed trees: custom
//! catalogs and normalizers, configuration and very deep programs.

use rexa_expr::{
    ColumnType, ExprNode, ExprProgram, Operator, OperatorKind, PortableExpr, RelationDesc,
    ScalarType,
};
use rexa_expr_test_util::{init_logging, ProgramBuilder, TestCatalog, TestCnf};
use rexa_extract::{
    extract_conjunctive_conditions, extract_ref_input_fields, extract_ref_nested_input_fields,
    ConjunctiveNormalizer, ExprTranslator, ExtractConfig, ExtractError, LookupError, PathMatching,
};

fn int() -> ColumnType {
    ColumnType::new(ScalarType::Int32)
}

/// Columns `a`, `b` and `c` of type integer.
fn abc() -> RelationDesc {
    RelationDesc::empty()
        .with_column("a", int())
        .with_column("b", int())
        .with_column("c", int().nullable(true))
}

/// Resolves comparisons without looking at argument types.
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

#[test]
fn test_record_projection_with_comparisons() {
    init_logging();
    let record = ScalarType::Record {
        fields: vec![("x".into(), int())],
    };
    let input = RelationDesc::empty()
        .with_column("a", int())
        .with_column("r", ColumnType::new(record));
    let condition = ExprNode::input(0)
        .call_binary(ExprNode::literal(5, int()), OperatorKind::GreaterThan)
        .and(ExprNode::input(1).call_binary(ExprNode::literal(3, int()), OperatorKind::Equals));
    let program = ProgramBuilder::new(input)
        .project(&ExprNode::input(0))
        .project(&ExprNode::input(1).field("x"))
        .filter(&condition)
        .build()
        .unwrap();

    let config = ExtractConfig::default();
    assert_eq!(extract_ref_input_fields(&program, &config).unwrap(), vec![0, 1]);
    let conditions =
        extract_conjunctive_conditions(&program, &TestCnf, &comparisons, &config).unwrap();
    let converted: Vec<_> = conditions.converted.iter().map(|e| e.to_string()).collect();
    assert_eq!(converted, vec!["GREATERTHAN(a, 5)", "EQUALS(r, 3)"]);
    assert!(conditions.unconverted.is_empty());
    let nested = extract_ref_nested_input_fields(&program, &[1], &config).unwrap();
    assert_eq!(nested, vec![vec!["*"]]);
}

#[test]
fn test_untranslatable_call() {
    init_logging();
    let input = abc();
    let catalog = TestCatalog::default();
    let translator = ExprTranslator::new(&input, &catalog);

    // Calls enclosing an untranslatable operand are never looked up.
    let call = ExprNode::call(Operator::function("my_func"), vec![ExprNode::input(0)]);
    assert_eq!(translator.translate(&call).unwrap(), None);
    let wrapped = call.call_unary(OperatorKind::IsNull);
    assert_eq!(translator.translate(&wrapped).unwrap(), None);
    assert_eq!(catalog.lookups(), vec!["myfunc", "myfunc"]);
}

#[test]
fn test_serialized_config() {
    let config: ExtractConfig = serde_json::from_str(
        r#"{"max_cnf_node_count": 100, "nested_path_matching": "segment"}"#,
    )
    .unwrap();
    assert_eq!(
        config,
        ExtractConfig {
            max_cnf_node_count: Some(100),
            nested_path_matching: PathMatching::Segment,
            ..Default::default()
        }
    );
}

#[test]
fn test_too_deep() {
    init_logging();
    let mut expr = ExprNode::input(0);
    for _ in 0..64 {
        expr = expr.not();
    }
    let program = ProgramBuilder::new(abc()).project(&expr).build().unwrap();
    let config = ExtractConfig {
        recursion_limit: 16,
        ..Default::default()
    };
    let err = extract_ref_input_fields(&program, &config).unwrap_err();
    assert!(matches!(err, ExtractError::Program(_)), "{}", err);
}

/// Keeps every tree as it is.
struct Unchanged;

impl ConjunctiveNormalizer for Unchanged {
    fn to_cnf(&self, expr: ExprNode, _max_node_count: Option<usize>) -> ExprNode {
        expr
    }
}

#[test]
fn test_long_chains() {
    init_logging();
    // $t0 = IS NULL($0), $t(i+1) = AND($ti, IS NULL($1))
    let mut expressions = vec![ExprNode::input(0).call_unary(OperatorKind::IsNull)];
    for i in 0..1000 {
        expressions
            .push(ExprNode::local(i).and(ExprNode::input(1).call_unary(OperatorKind::IsNull)));
    }
    let program = ExprProgram::new(abc(), expressions, vec![1000], Some(1000)).unwrap();
    let config = ExtractConfig::default();

    let fields = extract_ref_input_fields(&program, &config).unwrap();
    assert_eq!(fields, vec![0, 1]);

    let conditions =
        extract_conjunctive_conditions(&program, &Unchanged, &TestCatalog::default(), &config)
            .unwrap();
    assert_eq!(conditions.converted.len(), 1001);
    assert!(conditions.unconverted.is_empty());
    assert_eq!(conditions.converted[0].to_string(), "ISNULL(a)");
    assert_eq!(conditions.converted[1000].to_string(), "ISNULL(b)");

    let nested = extract_ref_nested_input_fields(&program, &fields, &config).unwrap();
    assert_eq!(nested, vec![vec!["*"], vec!["*"]]);
}
