// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Visitor support for recursive data types.
//!
//! Recursive types can implement the [`VisitChildren`] trait, to
//! specify how their recursive entries can be accessed. A [`Visitor`]
//! then walks instances of those types in pre-order, under a recursion
//! limit.
//!
//! The `try`-prefix specifies whether the visitor callback is fallible
//! (prefix present) or infallible (prefix omitted). Only immutable
//! traversals exist: expression programs are never rewritten in place.

use std::marker::PhantomData;

use crate::stack::{CheckedRecursion, RecursionGuard, RecursionLimitError};
use crate::RECURSION_LIMIT;

/// A trait for types that can visit their direct children of type `T`.
pub trait VisitChildren<T> {
    /// Apply an infallible immutable function `f` to each direct child.
    fn visit_children<F>(&self, f: F)
    where
        F: FnMut(&T);

    /// Apply a fallible immutable function `f` to each direct child.
    fn try_visit_children<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Result<(), E>,
        E: From<RecursionLimitError>;
}

/// A recursive traversal over values of type `T` with an explicit recursion limit.
#[derive(Debug)]
pub struct Visitor<T> {
    recursion_guard: RecursionGuard,
    _type: PhantomData<T>,
}

impl<T> CheckedRecursion for Visitor<T> {
    fn recursion_guard(&self) -> &RecursionGuard {
        &self.recursion_guard
    }
}

impl<T: VisitChildren<T>> Visitor<T> {
    /// A visitor limited to [`RECURSION_LIMIT`] nested frames.
    pub fn new() -> Self {
        Self::with_limit(RECURSION_LIMIT)
    }

    /// A visitor limited to `limit` nested frames.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            recursion_guard: RecursionGuard::with_limit(limit),
            _type: PhantomData,
        }
    }

    /// Applies `f` to `value` and then, recursively, to its children.
    pub fn visit_pre<F>(&self, value: &T, f: &mut F) -> Result<(), RecursionLimitError>
    where
        F: FnMut(&T),
    {
        self.checked_recur(move |_| {
            f(value);
            value.try_visit_children(|child| self.visit_pre(child, f))
        })
    }

    /// Like [`Visitor::visit_pre`], but stops at the first error `f` returns.
    pub fn try_visit_pre<F, E>(&self, value: &T, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&T) -> Result<(), E>,
        E: From<RecursionLimitError>,
    {
        self.checked_recur(move |_| {
            f(value)?;
            value.try_visit_children(|child| self.try_visit_pre(child, f))
        })
    }
}

impl<T: VisitChildren<T>> Default for Visitor<T> {
    fn default() -> Self {
        Self::new()
    }
}
