// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Utilities for testing analyses over expression programs.
//!
//! Programs, function catalogs and CNF normalizers are supplied to the
//! analyses by the surrounding optimizer. This crate has small stand-ins for
//! each of them, plus `proptest` strategies that generate random programs and
//! a reader for the printed form of trees, used by the `datadriven` tests.

#![warn(missing_debug_implementations)]

mod builder;
mod catalog;
mod cnf;
mod parse;

pub mod strategy;

pub use builder::ProgramBuilder;
pub use catalog::TestCatalog;
pub use cnf::{node_count, TestCnf};
pub use parse::{build_column_type, build_expr};

/// Installs a `tracing` subscriber that writes to the test harness.
///
/// Filtered by `RUST_LOG`; safe to call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
