// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::scalar::ColumnType;

/// The input row schema of an expression program.
///
/// Column `i` of the input is the `i`-th `(name, type)` pair.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RelationDesc {
    columns: Vec<(String, ColumnType)>,
}

impl RelationDesc {
    /// Constructs a new `RelationDesc` that represents the empty relation
    /// with no columns.
    pub fn empty() -> Self {
        RelationDesc::default()
    }

    /// Constructs a `RelationDesc` from `(name, type)` pairs.
    pub fn new<I, N>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, ColumnType)>,
        N: Into<String>,
    {
        RelationDesc {
            columns: columns
                .into_iter()
                .map(|(name, typ)| (name.into(), typ))
                .collect(),
        }
    }

    /// Appends a column with the specified name and type.
    pub fn with_column<N: Into<String>>(mut self, name: N, typ: ColumnType) -> Self {
        self.columns.push((name.into(), typ));
        self
    }

    /// The number of columns.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Returns the name and type of column `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<(&str, &ColumnType)> {
        self.columns.get(i).map(|(name, typ)| (name.as_str(), typ))
    }
}
