// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalar types and owned literal values.

use std::fmt;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The type of a single value, without nullability.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Float64,
    Decimal { precision: u8, scale: u8 },
    String,
    Date,
    Timestamp,
    Interval,
    /// A nested row with named fields, addressable through field access.
    Record { fields: Vec<(String, ColumnType)> },
    Array { element: Box<ScalarType> },
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("boolean"),
            ScalarType::Int32 => f.write_str("integer"),
            ScalarType::Int64 => f.write_str("bigint"),
            ScalarType::Float64 => f.write_str("double"),
            ScalarType::Decimal { precision, scale } => {
                write!(f, "numeric({}, {})", precision, scale)
            }
            ScalarType::String => f.write_str("text"),
            ScalarType::Date => f.write_str("date"),
            ScalarType::Timestamp => f.write_str("timestamp"),
            ScalarType::Interval => f.write_str("interval"),
            ScalarType::Record { fields } => write!(
                f,
                "record({})",
                fields
                    .iter()
                    .map(|(name, typ)| format!("{}: {}", name, typ.scalar_type))
                    .join(", ")
            ),
            ScalarType::Array { element } => write!(f, "{}[]", element),
        }
    }
}

/// The type of a column: a scalar type plus nullability.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    pub scalar_type: ScalarType,
    pub nullable: bool,
}

impl ColumnType {
    /// A non-nullable column of `scalar_type`.
    pub fn new(scalar_type: ScalarType) -> ColumnType {
        ColumnType {
            scalar_type,
            nullable: false,
        }
    }

    /// Consumes this `ColumnType` and returns a new one with the given nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// An owned literal value.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Datum {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    /// A decimal stored as its unscaled value.
    Decimal { unscaled: i128, scale: u8 },
    String(String),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    /// A duration in microseconds.
    Interval(i64),
}

impl From<bool> for Datum {
    fn from(b: bool) -> Datum {
        Datum::Bool(b)
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Datum {
        Datum::Int32(i)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Datum {
        Datum::Int64(i)
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Datum {
        Datum::Float64(OrderedFloat(f))
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Datum {
        Datum::String(s.to_owned())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Datum {
        Datum::String(s)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int32(i) => write!(f, "{}", i),
            Datum::Int64(i) => write!(f, "{}", i),
            Datum::Float64(n) => write!(f, "{}", n),
            Datum::Decimal { unscaled, scale } => {
                if *scale == 0 {
                    return write!(f, "{}", unscaled);
                }
                let Some(divisor) = 10u128.checked_pow(u32::from(*scale)) else {
                    return write!(f, "{}e-{}", unscaled, scale);
                };
                let sign = if *unscaled < 0 { "-" } else { "" };
                let magnitude = unscaled.unsigned_abs();
                write!(
                    f,
                    "{}{}.{:0width$}",
                    sign,
                    magnitude / divisor,
                    magnitude % divisor,
                    width = usize::from(*scale)
                )
            }
            Datum::String(s) => write!(f, "{:?}", s),
            Datum::Date(days) => write!(f, "DATE {}", days),
            Datum::Timestamp(micros) => write!(f, "TIMESTAMP {}", micros),
            Datum::Interval(micros) => write!(f, "INTERVAL {}", micros),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_display() {
        let d = |unscaled, scale| Datum::Decimal { unscaled, scale }.to_string();
        assert_eq!(d(12345, 2), "123.45");
        assert_eq!(d(-5, 3), "-0.005");
        assert_eq!(d(7, 0), "7");
    }

    #[test]
    fn record_display() {
        let typ = ScalarType::Record {
            fields: vec![
                ("x".into(), ColumnType::new(ScalarType::Int32)),
                ("y".into(), ColumnType::new(ScalarType::String).nullable(true)),
            ],
        };
        assert_eq!(typ.to_string(), "record(x: integer, y: text)");
    }
}
