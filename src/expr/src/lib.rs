// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Core expression language of expression programs.
//!
//! An [`ExprProgram`] is the compact form in which the optimizer keeps the
//! projections and the filter of an operator. This crate defines the program,
//! its tree nodes ([`ExprNode`]), the input schema ([`RelationDesc`]), and the
//! optimizer's portable expression form ([`PortableExpr`]) that analyses
//! translate program trees into.

#![warn(missing_debug_implementations)]

mod node;
mod portable;
mod program;
mod relation;
mod scalar;

pub mod stack;
pub mod visit;

pub use node::{ExprNode, OpaqueKind, Operator, OperatorKind};
pub use portable::PortableExpr;
pub use program::{ExprProgram, ProgramError};
pub use relation::RelationDesc;
pub use scalar::{ColumnType, Datum, ScalarType};

/// Recursion limit for walks over expression trees.
pub const RECURSION_LIMIT: usize = 2048;
