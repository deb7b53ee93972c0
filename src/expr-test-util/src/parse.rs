// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Reads trees and types back from their printed form.
//!
//! The syntax is the one [`ExprNode`]'s `Display` impl produces: `$0` for an
//! input column, `$t1` for a local slot, `?0` for a dynamic parameter,
//! `5:integer` for a literal, `$0.x` for a field access and `op(a, b)` for a
//! call. Column types may carry a trailing `?` to mark them nullable.

use ordered_float::OrderedFloat;
use rexa_expr::{ColumnType, Datum, ExprNode, OpaqueKind, Operator, OperatorKind, ScalarType};

/// Kinds that print as something other than a plain name. `Minus` comes
/// before `MinusPrefix`, so `-` reads back as the binary operator.
const KINDS: [OperatorKind; 24] = [
    OperatorKind::And,
    OperatorKind::Or,
    OperatorKind::Not,
    OperatorKind::Equals,
    OperatorKind::NotEquals,
    OperatorKind::GreaterThan,
    OperatorKind::GreaterThanOrEqual,
    OperatorKind::LessThan,
    OperatorKind::LessThanOrEqual,
    OperatorKind::IsNull,
    OperatorKind::IsNotNull,
    OperatorKind::Plus,
    OperatorKind::Minus,
    OperatorKind::Times,
    OperatorKind::Divide,
    OperatorKind::Mod,
    OperatorKind::MinusPrefix,
    OperatorKind::Like,
    OperatorKind::Similar,
    OperatorKind::In,
    OperatorKind::Between,
    OperatorKind::Cast,
    OperatorKind::Case,
    OperatorKind::Item,
];

/// Builds an [`ExprNode`] from its printed form.
pub fn build_expr(s: &str) -> Result<ExprNode, String> {
    let mut parser = Parser { rest: s };
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

/// Builds a [`ColumnType`] from its printed form, e.g. `integer?` or
/// `record(x: integer, y: text?)`.
pub fn build_column_type(s: &str) -> Result<ColumnType, String> {
    let mut parser = Parser { rest: s };
    let typ = parser.column_type()?;
    parser.finish()?;
    Ok(typ)
}

fn operator(name: &str) -> Operator {
    match KINDS.iter().find(|kind| kind.symbol() == name) {
        Some(kind) => Operator::Kind(*kind),
        None => Operator::function(name),
    }
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser<'a> {
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, prefix: &str) -> Result<(), String> {
        self.skip_whitespace();
        if self.eat(prefix) {
            Ok(())
        } else {
            Err(format!("expected {:?} at {:?}", prefix, self.rest))
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c: char| !f(c)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn finish(&mut self) -> Result<(), String> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(format!("unexpected trailing input {:?}", self.rest))
        }
    }

    fn number(&mut self) -> Result<usize, String> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        digits
            .parse()
            .map_err(|_| format!("expected a number at {:?}", self.rest))
    }

    fn expr(&mut self) -> Result<ExprNode, String> {
        self.skip_whitespace();
        let mut expr = self.primary()?;
        while self.eat(".") {
            let field = self.take_while(is_ident);
            if field.is_empty() {
                return Err(format!("expected a field name at {:?}", self.rest));
            }
            expr = expr.field(field);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<ExprNode, String> {
        if self.eat("$t") {
            return Ok(ExprNode::local(self.number()?));
        }
        if self.eat("$") {
            return Ok(ExprNode::input(self.number()?));
        }
        if self.eat("?") {
            let index = self.number()?;
            return Ok(ExprNode::Opaque(OpaqueKind::DynamicParam { index }));
        }
        if let Some(literal) = self.literal()? {
            return Ok(literal);
        }

        let name = self.take_while(|c| c != '(').trim();
        if name.is_empty() || !self.eat("(") {
            return Err(format!("expected a call at {:?}", self.rest));
        }
        let mut operands = Vec::new();
        self.skip_whitespace();
        if !self.eat(")") {
            loop {
                operands.push(self.expr()?);
                self.skip_whitespace();
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        Ok(ExprNode::call(operator(name), operands))
    }

    /// Reads a `value:type` literal, or leaves the input alone and returns
    /// `None` if there is none.
    fn literal(&mut self) -> Result<Option<ExprNode>, String> {
        let start = self.rest;
        let value = if self.rest.starts_with('"') {
            let end = self.rest[1..]
                .find('"')
                .ok_or_else(|| format!("unterminated string at {:?}", self.rest))?;
            let (value, rest) = self.rest.split_at(end + 2);
            self.rest = rest;
            value
        } else {
            self.take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        };
        if value.is_empty() || !self.eat(":") {
            self.rest = start;
            return Ok(None);
        }

        let typ = self.column_type()?;
        if value == "null" {
            return Ok(Some(ExprNode::literal_null(typ)));
        }
        let invalid = || format!("invalid {} literal {}", typ.scalar_type, value);
        let datum = match &typ.scalar_type {
            ScalarType::Bool => Datum::Bool(value.parse().map_err(|_| invalid())?),
            ScalarType::Int32 => Datum::Int32(value.parse().map_err(|_| invalid())?),
            ScalarType::Int64 => Datum::Int64(value.parse().map_err(|_| invalid())?),
            ScalarType::Float64 => {
                Datum::Float64(OrderedFloat(value.parse().map_err(|_| invalid())?))
            }
            ScalarType::String => match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
                Some(s) => Datum::String(s.to_string()),
                None => return Err(invalid()),
            },
            other => return Err(format!("literals of type {} are not supported", other)),
        };
        Ok(Some(ExprNode::literal(datum, typ)))
    }

    fn column_type(&mut self) -> Result<ColumnType, String> {
        let scalar_type = self.scalar_type()?;
        let nullable = self.eat("?");
        Ok(ColumnType::new(scalar_type).nullable(nullable))
    }

    fn scalar_type(&mut self) -> Result<ScalarType, String> {
        self.skip_whitespace();
        let name = self.take_while(|c| c.is_ascii_alphabetic());
        let scalar_type = match name {
            "boolean" => ScalarType::Bool,
            "integer" => ScalarType::Int32,
            "bigint" => ScalarType::Int64,
            "double" => ScalarType::Float64,
            "text" => ScalarType::String,
            "date" => ScalarType::Date,
            "timestamp" => ScalarType::Timestamp,
            "interval" => ScalarType::Interval,
            "record" => {
                self.expect("(")?;
                let mut fields = Vec::new();
                loop {
                    self.skip_whitespace();
                    let field = self.take_while(is_ident);
                    if field.is_empty() {
                        return Err(format!("expected a field name at {:?}", self.rest));
                    }
                    self.expect(":")?;
                    fields.push((field.to_string(), self.column_type()?));
                    self.skip_whitespace();
                    if self.eat(")") {
                        break;
                    }
                    self.expect(",")?;
                }
                ScalarType::Record { fields }
            }
            other => return Err(format!("unknown type {:?}", other)),
        };
        Ok(scalar_type)
    }
}
