// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::scalar::{ColumnType, Datum};

/// The optimizer's own expression representation, independent of the shape of
/// expression programs.
///
/// Only fields and literals are built directly from program nodes. Calls are
/// built by a function catalog when it resolves a function name against its
/// arguments.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum PortableExpr {
    /// A field of the input, resolved to its name and type.
    Field { name: String, typ: ColumnType },
    Literal { value: Datum, typ: ColumnType },
    /// A resolved function applied to its arguments.
    Call {
        func: String,
        args: Vec<PortableExpr>,
        typ: ColumnType,
    },
}

impl PortableExpr {
    pub fn field<N: Into<String>>(name: N, typ: ColumnType) -> Self {
        PortableExpr::Field {
            name: name.into(),
            typ,
        }
    }

    pub fn literal<D: Into<Datum>>(value: D, typ: ColumnType) -> Self {
        PortableExpr::Literal {
            value: value.into(),
            typ,
        }
    }

    /// The result type of the expression.
    pub fn typ(&self) -> &ColumnType {
        match self {
            PortableExpr::Field { typ, .. }
            | PortableExpr::Literal { typ, .. }
            | PortableExpr::Call { typ, .. } => typ,
        }
    }
}

impl fmt::Display for PortableExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PortableExpr::Field { name, .. } => f.write_str(name),
            PortableExpr::Literal { value, .. } => write!(f, "{}", value),
            PortableExpr::Call { func, args, .. } => {
                write!(f, "{}({})", func, args.iter().join(", "))
            }
        }
    }
}
