// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use rexa_expr::PortableExpr;

/// Resolves a function name and translated arguments to a portable expression.
///
/// Implementations may be stateful; the analyses call `lookup` synchronously
/// and never concurrently.
pub trait FunctionCatalog {
    /// Resolves `name`, already normalized with [`normalize_function_name`],
    /// applied to `args`.
    fn lookup(&self, name: &str, args: Vec<PortableExpr>) -> Result<PortableExpr, LookupError>;
}

impl<F> FunctionCatalog for F
where
    F: Fn(&str, Vec<PortableExpr>) -> Result<PortableExpr, LookupError>,
{
    fn lookup(&self, name: &str, args: Vec<PortableExpr>) -> Result<PortableExpr, LookupError> {
        self(name, args)
    }
}

/// A function could not be resolved.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum LookupError {
    /// No function is registered under the name.
    #[error("unknown function {0}")]
    UnknownFunction(String),
    /// The function exists but not with this many arguments.
    #[error("function {name} cannot take {actual} arguments")]
    ArityMismatch {
        /// The looked up name.
        name: String,
        /// The number of arguments supplied.
        actual: usize,
    },
    /// The function exists but not for these argument types.
    #[error("function {name} cannot be applied to ({args})")]
    TypeMismatch {
        /// The looked up name.
        name: String,
        /// The argument types, comma separated.
        args: String,
    },
}

/// Removes whitespace and underscores from an operator label.
///
/// Labels such as `IS NOT NULL` or `GREATER_THAN` are looked up as
/// `ISNOTNULL` and `GREATERTHAN`.
pub fn normalize_function_name(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}
