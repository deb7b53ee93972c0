// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The native expression tree of an expression program.

use std::fmt;

use itertools::Itertools;
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::scalar::{ColumnType, Datum};
use crate::stack::RecursionLimitError;
use crate::visit::VisitChildren;

/// A node of an expression tree.
///
/// Trees stored in an [`ExprProgram`](crate::ExprProgram) share
/// sub-expressions through [`ExprNode::LocalRef`]; analyses only ever see
/// trees that have been expanded, which contain no local references.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ExprNode {
    /// A column of the input row.
    InputRef(usize),
    /// A slot of the enclosing program's local definitions.
    LocalRef(usize),
    /// A literal value.
    Literal(Datum, ColumnType),
    /// An operator or function applied to its operands.
    Call {
        /// The operator.
        op: Operator,
        /// The operands, in order.
        operands: Vec<ExprNode>,
    },
    /// Projection of the field `field` out of the record `base`.
    FieldAccess { base: Box<ExprNode>, field: String },
    /// A node kind that is never analyzed beyond its presence.
    Opaque(OpaqueKind),
}

impl ExprNode {
    /// A reference to input column `index`.
    pub fn input(index: usize) -> Self {
        ExprNode::InputRef(index)
    }

    /// A reference to local slot `index`.
    pub fn local(index: usize) -> Self {
        ExprNode::LocalRef(index)
    }

    /// A literal holding `value`.
    pub fn literal<D: Into<Datum>>(value: D, typ: ColumnType) -> Self {
        ExprNode::Literal(value.into(), typ)
    }

    /// A null literal of type `typ`, which is made nullable.
    pub fn literal_null(typ: ColumnType) -> Self {
        ExprNode::Literal(Datum::Null, typ.nullable(true))
    }

    /// Applies `op` to `operands`.
    pub fn call(op: Operator, operands: Vec<ExprNode>) -> Self {
        ExprNode::Call { op, operands }
    }

    /// Applies the built-in operator `kind` to `operands`.
    pub fn call_kind(kind: OperatorKind, operands: Vec<ExprNode>) -> Self {
        ExprNode::Call {
            op: Operator::Kind(kind),
            operands,
        }
    }

    /// Applies `kind` to `self`.
    pub fn call_unary(self, kind: OperatorKind) -> Self {
        ExprNode::call_kind(kind, vec![self])
    }

    /// Applies `kind` to `self` and `other`.
    pub fn call_binary(self, other: Self, kind: OperatorKind) -> Self {
        ExprNode::call_kind(kind, vec![self, other])
    }

    /// Projects the field `field` out of `self`.
    pub fn field<N: Into<String>>(self, field: N) -> Self {
        ExprNode::FieldAccess {
            base: Box::new(self),
            field: field.into(),
        }
    }

    /// `AND(self, other)`.
    pub fn and(self, other: Self) -> Self {
        self.call_binary(other, OperatorKind::And)
    }

    /// `OR(self, other)`.
    pub fn or(self, other: Self) -> Self {
        self.call_binary(other, OperatorKind::Or)
    }

    /// `NOT(self)`.
    pub fn not(self) -> Self {
        self.call_unary(OperatorKind::Not)
    }

    /// Returns the operands of `self` if it is a call of `kind`.
    pub fn as_call_kind(&self, kind: OperatorKind) -> Option<&[ExprNode]> {
        match self {
            ExprNode::Call {
                op: Operator::Kind(k),
                operands,
            } if *k == kind => Some(operands),
            _ => None,
        }
    }

    /// True if no [`ExprNode::LocalRef`] occurs anywhere in `self`.
    pub fn is_expanded(&self) -> bool {
        match self {
            ExprNode::LocalRef(_) => false,
            ExprNode::InputRef(_) | ExprNode::Literal(..) | ExprNode::Opaque(_) => true,
            ExprNode::Call { operands, .. } => operands.iter().all(|o| o.is_expanded()),
            ExprNode::FieldAccess { base, .. } => base.is_expanded(),
        }
    }
}

impl VisitChildren<Self> for ExprNode {
    fn visit_children<F>(&self, mut f: F)
    where
        F: FnMut(&Self),
    {
        match self {
            ExprNode::InputRef(_)
            | ExprNode::LocalRef(_)
            | ExprNode::Literal(..)
            | ExprNode::Opaque(_) => (),
            ExprNode::Call { operands, .. } => {
                for operand in operands {
                    f(operand);
                }
            }
            ExprNode::FieldAccess { base, .. } => f(base),
        }
    }

    fn try_visit_children<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Self) -> Result<(), E>,
        E: From<RecursionLimitError>,
    {
        match self {
            ExprNode::InputRef(_)
            | ExprNode::LocalRef(_)
            | ExprNode::Literal(..)
            | ExprNode::Opaque(_) => (),
            ExprNode::Call { operands, .. } => {
                for operand in operands {
                    f(operand)?;
                }
            }
            ExprNode::FieldAccess { base, .. } => f(base)?,
        }
        Ok(())
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprNode::InputRef(i) => write!(f, "${}", i),
            ExprNode::LocalRef(i) => write!(f, "$t{}", i),
            ExprNode::Literal(value, typ) => write!(f, "{}:{}", value, typ.scalar_type),
            ExprNode::Call { op, operands } => {
                write!(f, "{}({})", op, operands.iter().join(", "))
            }
            ExprNode::FieldAccess { base, field } => write!(f, "{}.{}", base, field),
            ExprNode::Opaque(kind) => write!(f, "{}", kind),
        }
    }
}

/// The operator of an [`ExprNode::Call`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// A named function, e.g. `UPPER`.
    Function(String),
    /// A named postfix operator, e.g. `IS NOT NULL`.
    Postfix(String),
    /// A built-in operator known only by its kind, e.g. `>`.
    Kind(OperatorKind),
}

impl Operator {
    /// A named function.
    pub fn function<N: Into<String>>(name: N) -> Self {
        Operator::Function(name.into())
    }

    /// A named postfix operator.
    pub fn postfix<N: Into<String>>(name: N) -> Self {
        Operator::Postfix(name.into())
    }

    /// The name under which this operator is resolved in a function catalog.
    ///
    /// Functions and postfix operators use their own name; everything else
    /// falls back to the label of its kind.
    pub fn label(&self) -> &str {
        match self {
            Operator::Function(name) | Operator::Postfix(name) => name,
            Operator::Kind(kind) => kind.label(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operator::Function(name) | Operator::Postfix(name) => f.write_str(name),
            Operator::Kind(kind) => f.write_str(kind.symbol()),
        }
    }
}

/// Kinds of built-in operators.
#[derive(
    Arbitrary, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum OperatorKind {
    And,
    Or,
    Not,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    IsNull,
    IsNotNull,
    Plus,
    Minus,
    Times,
    Divide,
    Mod,
    MinusPrefix,
    Like,
    Similar,
    In,
    Between,
    Cast,
    Case,
    Item,
}

impl OperatorKind {
    /// The generic textual label of the kind.
    pub fn label(&self) -> &'static str {
        match self {
            OperatorKind::And => "AND",
            OperatorKind::Or => "OR",
            OperatorKind::Not => "NOT",
            OperatorKind::Equals => "EQUALS",
            OperatorKind::NotEquals => "NOT_EQUALS",
            OperatorKind::GreaterThan => "GREATER_THAN",
            OperatorKind::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            OperatorKind::LessThan => "LESS_THAN",
            OperatorKind::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            OperatorKind::IsNull => "IS_NULL",
            OperatorKind::IsNotNull => "IS_NOT_NULL",
            OperatorKind::Plus => "PLUS",
            OperatorKind::Minus => "MINUS",
            OperatorKind::Times => "TIMES",
            OperatorKind::Divide => "DIVIDE",
            OperatorKind::Mod => "MOD",
            OperatorKind::MinusPrefix => "MINUS_PREFIX",
            OperatorKind::Like => "LIKE",
            OperatorKind::Similar => "SIMILAR",
            OperatorKind::In => "IN",
            OperatorKind::Between => "BETWEEN",
            OperatorKind::Cast => "CAST",
            OperatorKind::Case => "CASE",
            OperatorKind::Item => "ITEM",
        }
    }

    /// The symbol used when printing a call of this kind.
    pub fn symbol(&self) -> &'static str {
        match self {
            OperatorKind::Equals => "=",
            OperatorKind::NotEquals => "<>",
            OperatorKind::GreaterThan => ">",
            OperatorKind::GreaterThanOrEqual => ">=",
            OperatorKind::LessThan => "<",
            OperatorKind::LessThanOrEqual => "<=",
            OperatorKind::IsNull => "IS NULL",
            OperatorKind::IsNotNull => "IS NOT NULL",
            OperatorKind::Plus => "+",
            OperatorKind::Minus | OperatorKind::MinusPrefix => "-",
            OperatorKind::Times => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Mod
            | OperatorKind::And
            | OperatorKind::Or
            | OperatorKind::Not
            | OperatorKind::Like
            | OperatorKind::Similar
            | OperatorKind::In
            | OperatorKind::Between
            | OperatorKind::Cast
            | OperatorKind::Case
            | OperatorKind::Item => self.label(),
        }
    }
}

/// Node kinds that require context an expression program does not carry.
#[derive(Arbitrary, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum OpaqueKind {
    /// A reference to a row of an enclosing query.
    CorrelationVariable { name: String },
    /// A reference to a whole input of a join.
    RangeRef { offset: usize },
    /// A nested query.
    Subquery,
    /// A parameter bound at execution time.
    DynamicParam { index: usize },
    /// A windowed aggregation.
    Over { func: String },
    /// A field of a pattern variable in a `MATCH_RECOGNIZE` clause.
    PatternFieldRef { alpha: String, index: usize },
}

impl fmt::Display for OpaqueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpaqueKind::CorrelationVariable { name } => write!(f, "$cor({})", name),
            OpaqueKind::RangeRef { offset } => write!(f, "$range({})", offset),
            OpaqueKind::Subquery => f.write_str("$subquery"),
            OpaqueKind::DynamicParam { index } => write!(f, "?{}", index),
            OpaqueKind::Over { func } => write!(f, "{}() OVER (..)", func),
            OpaqueKind::PatternFieldRef { alpha, index } => write!(f, "{}.${}", alpha, index),
        }
    }
}
