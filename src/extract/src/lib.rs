// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Analyses over expression programs.
//!
//! This crate extracts the facts that optimizer rules need from an
//! [`ExprProgram`](rexa_expr::ExprProgram):
//!
//!  * **[`extract_ref_input_fields`]**: the input columns a program
//!    references, in first-visit order.
//!  * **[`extract_conjunctive_conditions`]**: the conjuncts of the program's
//!    condition, translated into [`PortableExpr`](rexa_expr::PortableExpr)s
//!    where possible and kept as residual trees otherwise.
//!  * **[`extract_ref_nested_input_fields`]**: for each used input column, the
//!    minimal set of nested field paths that covers every access to it.
//!
//! The analyses do not decide what to push down; they only report. Function
//! resolution and CNF normalization are supplied by the caller through the
//! [`FunctionCatalog`] and [`ConjunctiveNormalizer`] traits.

#![forbid(missing_docs)]
#![deny(missing_debug_implementations)]

use rexa_expr::stack::RecursionLimitError;
use rexa_expr::ProgramError;

mod catalog;
mod cnf;
mod config;
mod conjunctive;
mod nested_fields;
mod ref_fields;
mod translate;

pub use catalog::{normalize_function_name, FunctionCatalog, LookupError};
pub use cnf::{split_conjuncts, ConjunctiveNormalizer};
pub use config::{ExtractConfig, PathMatching};
pub use conjunctive::{extract_conjunctive_conditions, ConjunctiveConditions};
pub use nested_fields::{
    extract_ref_nested_input_fields, extract_ref_nested_input_fields_from_exprs,
    minimal_prefix_cover, WILDCARD,
};
pub use ref_fields::{extract_ref_input_fields, extract_ref_input_fields_from_exprs};
pub use translate::ExprTranslator;

/// Errors that abort an analysis.
///
/// Every variant reports a broken contract between the analyses and whoever
/// built the program. Constructs that merely cannot be translated are not
/// errors; they surface as `None` or as residual conjuncts.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ExtractError {
    /// A local reference reached the translator without being expanded.
    #[error("internal error: local reference $t{0} was not expanded before translation")]
    UnexpandedLocal(usize),
    /// A tree referenced an input column the schema does not have.
    #[error("internal error: input column ${index} is out of range for an input of arity {arity}")]
    InputOutOfRange {
        /// The referenced column.
        index: usize,
        /// The number of columns in the input schema.
        arity: usize,
    },
    /// The program itself is malformed.
    #[error("internal error: {0}")]
    Program(#[from] ProgramError),
    /// A tree was too deep to walk.
    #[error("internal error: {0}")]
    RecursionLimit(#[from] RecursionLimitError),
}
