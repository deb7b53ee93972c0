// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Nested field accesses of input columns.
//!
//! For every used input column we record how it is accessed: as a whole
//! (recorded as [`WILDCARD`]) or through a chain of field accesses (recorded
//! as the dotted path, e.g. `address.city`). The recorded paths of a column
//! are then reduced to the minimal set of prefixes that covers all of them,
//! which is what a scan needs to read.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use rexa_expr::stack::{CheckedRecursion, RecursionGuard, RecursionLimitError};
use rexa_expr::{ExprNode, ExprProgram};

use crate::{ExtractConfig, ExtractError, PathMatching};

/// The path recorded for an access to a whole column.
pub const WILDCARD: &str = "*";

/// Returns, for each column in `used_fields`, the minimal set of nested paths
/// through which the projections and the condition of `program` access it.
///
/// The result has one entry per element of `used_fields`. Accesses to columns
/// not in `used_fields` are ignored.
#[tracing::instrument(
    target = "optimizer",
    level = "trace",
    skip_all,
    fields(used_fields = ?used_fields)
)]
pub fn extract_ref_nested_input_fields(
    program: &ExprProgram,
    used_fields: &[usize],
    config: &ExtractConfig,
) -> Result<Vec<Vec<String>>, ExtractError> {
    let roots = program.expanded_roots(config.recursion_limit)?;
    extract_ref_nested_input_fields_from_exprs(&roots, used_fields, config)
}

/// Like [`extract_ref_nested_input_fields`], for already expanded trees.
pub fn extract_ref_nested_input_fields_from_exprs<'a, I>(
    exprs: I,
    used_fields: &[usize],
    config: &ExtractConfig,
) -> Result<Vec<Vec<String>>, ExtractError>
where
    I: IntoIterator<Item = &'a ExprNode>,
{
    let mut collector = NestedFieldCollector::new(used_fields, config.recursion_limit);
    for expr in exprs {
        collector.collect(expr)?;
    }
    Ok(collector
        .accessed
        .into_iter()
        .map(|paths| minimal_prefix_cover(paths, config.nested_path_matching))
        .collect())
}

/// Reduces `paths` to the minimal, sorted set of paths that covers all of them.
///
/// The paths are sorted and folded, comparing each one against the most
/// recently accepted path:
///  * a [`WILDCARD`] covers everything and replaces all accepted paths;
///  * a path covered by the accepted one is dropped;
///  * any other path is accepted.
pub fn minimal_prefix_cover<I>(paths: I, matching: PathMatching) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut sorted = paths.into_iter().collect::<Vec<_>>();
    sorted.sort();
    let mut accepted: Vec<String> = Vec::new();
    for candidate in sorted {
        let Some(head) = accepted.last() else {
            accepted.push(candidate);
            continue;
        };
        if head == WILDCARD {
            continue;
        }
        if candidate == WILDCARD {
            accepted.clear();
            accepted.push(candidate);
            continue;
        }
        let covered = match matching {
            PathMatching::StringPrefix => matching.covers(head, &candidate),
            // Paths continuing a segment are not contiguous in sort order
            // (`a` < `a-b` < `a.b`), so check every accepted path.
            PathMatching::Segment => accepted.iter().any(|h| matching.covers(h, &candidate)),
        };
        if !covered {
            accepted.push(candidate);
        }
    }
    accepted
}

struct NestedFieldCollector {
    /// Input column to its position in `used_fields`.
    order: BTreeMap<usize, usize>,
    /// Recorded paths per position in `used_fields`.
    accessed: Vec<BTreeSet<String>>,
    recursion_guard: RecursionGuard,
}

impl CheckedRecursion for NestedFieldCollector {
    fn recursion_guard(&self) -> &RecursionGuard {
        &self.recursion_guard
    }
}

impl NestedFieldCollector {
    fn new(used_fields: &[usize], recursion_limit: usize) -> Self {
        let mut order = BTreeMap::new();
        for (position, field) in used_fields.iter().enumerate() {
            order.entry(*field).or_insert(position);
        }
        NestedFieldCollector {
            order,
            accessed: vec![BTreeSet::new(); used_fields.len()],
            recursion_guard: RecursionGuard::with_limit(recursion_limit),
        }
    }

    fn collect(&mut self, expr: &ExprNode) -> Result<(), RecursionLimitError> {
        self.checked_recur_mut(|this| {
            match expr {
                ExprNode::InputRef(index) => this.record(*index, WILDCARD.to_string()),
                ExprNode::FieldAccess { .. } => {
                    let (base, fields) = access_chain(expr);
                    match base {
                        ExprNode::InputRef(index) => {
                            this.record(*index, fields.into_iter().rev().join("."))
                        }
                        // The accessed record is computed; whatever it
                        // consumes is consumed whole.
                        base => this.collect(base)?,
                    }
                }
                ExprNode::Call { operands, .. } => {
                    for operand in operands {
                        this.collect(operand)?;
                    }
                }
                ExprNode::LocalRef(_) | ExprNode::Literal(..) | ExprNode::Opaque(_) => {}
            }
            Ok(())
        })
    }

    fn record(&mut self, index: usize, path: String) {
        if let Some(position) = self.order.get(&index) {
            self.accessed[*position].insert(path);
        }
    }
}

/// Splits a chain of field accesses into its innermost base and the accessed
/// field names, outermost first.
fn access_chain(mut expr: &ExprNode) -> (&ExprNode, Vec<&str>) {
    let mut fields = Vec::new();
    while let ExprNode::FieldAccess { base, field } = expr {
        fields.push(field.as_str());
        expr = base;
    }
    (expr, fields)
}
