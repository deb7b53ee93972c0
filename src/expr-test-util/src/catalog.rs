// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::cell::RefCell;
use std::collections::BTreeMap;

use itertools::Itertools;
use rexa_expr::{ColumnType, PortableExpr, ScalarType};
use rexa_extract::{FunctionCatalog, LookupError};

/// What arguments a test function accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Args {
    /// Only booleans, at least this many.
    Booleans(usize),
    /// Two values of the same type, or two numbers.
    Comparable,
    /// Two numbers.
    Numeric,
    /// Exactly this many values of any type.
    Any(usize),
    /// Only strings, between the bounds (inclusive).
    Strings(usize, usize),
}

/// What a test function returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Returns {
    Bool,
    FirstArg,
    String,
}

/// A function catalog with a fixed set of functions, keyed by their
/// normalized names. Names resolve case-insensitively and resolved calls carry
/// the upper-case name.
///
/// Every lookup is recorded, so tests can check which names were resolved.
#[derive(Debug)]
pub struct TestCatalog {
    functions: BTreeMap<&'static str, (Args, Returns)>,
    lookups: RefCell<Vec<String>>,
}

impl Default for TestCatalog {
    fn default() -> Self {
        let functions = [
            ("AND", (Args::Booleans(2), Returns::Bool)),
            ("OR", (Args::Booleans(2), Returns::Bool)),
            ("NOT", (Args::Booleans(1), Returns::Bool)),
            ("EQUALS", (Args::Comparable, Returns::Bool)),
            ("NOTEQUALS", (Args::Comparable, Returns::Bool)),
            ("GREATERTHAN", (Args::Comparable, Returns::Bool)),
            ("GREATERTHANOREQUAL", (Args::Comparable, Returns::Bool)),
            ("LESSTHAN", (Args::Comparable, Returns::Bool)),
            ("LESSTHANOREQUAL", (Args::Comparable, Returns::Bool)),
            ("ISNULL", (Args::Any(1), Returns::Bool)),
            ("ISNOTNULL", (Args::Any(1), Returns::Bool)),
            ("PLUS", (Args::Numeric, Returns::FirstArg)),
            ("MINUS", (Args::Numeric, Returns::FirstArg)),
            ("TIMES", (Args::Numeric, Returns::FirstArg)),
            ("DIVIDE", (Args::Numeric, Returns::FirstArg)),
            ("LIKE", (Args::Strings(2, 2), Returns::Bool)),
            ("UPPER", (Args::Strings(1, 1), Returns::String)),
            ("LOWER", (Args::Strings(1, 1), Returns::String)),
            ("SUBSTRING", (Args::Any(3), Returns::String)),
        ];
        TestCatalog {
            functions: functions.into_iter().collect(),
            lookups: RefCell::new(Vec::new()),
        }
    }
}

impl TestCatalog {
    /// The names looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

fn is_numeric(typ: &ScalarType) -> bool {
    matches!(
        typ,
        ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float64 | ScalarType::Decimal { .. }
    )
}

impl FunctionCatalog for TestCatalog {
    fn lookup(&self, name: &str, args: Vec<PortableExpr>) -> Result<PortableExpr, LookupError> {
        self.lookups.borrow_mut().push(name.to_string());
        let func = name.to_uppercase();
        let (accepts, returns) = self
            .functions
            .get(func.as_str())
            .ok_or_else(|| LookupError::UnknownFunction(name.to_string()))?;

        let types = args.iter().map(|arg| &arg.typ().scalar_type).collect::<Vec<_>>();
        let arity_ok = match accepts {
            Args::Booleans(min) => types.len() >= *min,
            Args::Comparable | Args::Numeric => types.len() == 2,
            Args::Any(n) => types.len() == *n,
            Args::Strings(min, max) => (*min..=*max).contains(&types.len()),
        };
        if !arity_ok {
            return Err(LookupError::ArityMismatch {
                name: name.to_string(),
                actual: types.len(),
            });
        }
        let types_ok = match accepts {
            Args::Booleans(_) => types.iter().all(|t| **t == ScalarType::Bool),
            Args::Comparable => {
                types[0] == types[1] || (is_numeric(types[0]) && is_numeric(types[1]))
            }
            Args::Numeric => types.iter().all(|t| is_numeric(t)),
            Args::Any(_) => true,
            Args::Strings(..) => types.iter().all(|t| **t == ScalarType::String),
        };
        if !types_ok {
            return Err(LookupError::TypeMismatch {
                name: name.to_string(),
                args: types.iter().join(", "),
            });
        }

        let nullable = args.iter().any(|arg| arg.typ().nullable);
        let typ = match returns {
            Returns::Bool => ColumnType::new(ScalarType::Bool).nullable(nullable),
            Returns::FirstArg => args[0].typ().clone().nullable(nullable),
            Returns::String => ColumnType::new(ScalarType::String).nullable(nullable),
        };
        Ok(PortableExpr::Call { func, args, typ })
    }
}
