// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Recursion limits and stack growth for walks over expression trees.
//!
//! Expression trees handed to the analyses are built by other components and
//! can be arbitrarily deep. Every recursive walk in this workspace tracks its
//! depth through a [`RecursionGuard`] and fails with a
//! [`RecursionLimitError`] once the limit is exceeded. Below the limit, each
//! step runs through [`maybe_grow`], which moves the walk onto a fresh stack
//! segment when the current one runs low.

use std::cell::Cell;

/// The red zone: the minimum amount of stack that must remain before a
/// recursive step switches to a new segment.
pub const STACK_RED_ZONE: usize = 32 << 10; // 32KiB

/// The size of each stack segment allocated by [`maybe_grow`].
pub const STACK_SIZE: usize = 2 << 20; // 2MiB

/// Grows the stack if less than [`STACK_RED_ZONE`] bytes remain, then runs `f`.
#[inline(always)]
pub fn maybe_grow<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SIZE, f)
}

/// A depth counter shared by the frames of one recursive walk.
#[derive(Debug)]
pub struct RecursionGuard {
    depth: Cell<usize>,
    limit: usize,
}

impl RecursionGuard {
    /// Constructs a new guard that permits at most `limit` nested frames.
    pub fn with_limit(limit: usize) -> RecursionGuard {
        RecursionGuard {
            depth: Cell::new(0),
            limit,
        }
    }

    /// The current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    fn descend(&self) -> Result<(), RecursionLimitError> {
        let depth = self.depth.get();
        if depth >= self.limit {
            return Err(RecursionLimitError { limit: self.limit });
        }
        self.depth.set(depth + 1);
        Ok(())
    }

    fn ascend(&self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// A type that performs recursion that must be bounded by a [`RecursionGuard`].
pub trait CheckedRecursion {
    /// Extracts the guard that tracks this walk's depth.
    fn recursion_guard(&self) -> &RecursionGuard;

    /// Runs `f` one level deeper, failing if the limit has been reached and
    /// growing the stack if it is about to run out.
    fn checked_recur<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RecursionLimitError>,
    {
        self.recursion_guard().descend()?;
        let out = maybe_grow(|| f(self));
        self.recursion_guard().ascend();
        out
    }

    /// Like [`CheckedRecursion::checked_recur`], but for walks that mutate `self`.
    fn checked_recur_mut<F, T, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<RecursionLimitError>,
    {
        self.recursion_guard().descend()?;
        let out = maybe_grow(|| f(self));
        self.recursion_guard().ascend();
        out
    }
}

/// A [`CheckedRecursion`] walk went deeper than its limit.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("exceeded recursion limit of {limit}")]
pub struct RecursionLimitError {
    limit: usize,
}

impl RecursionLimitError {
    /// The limit that was exceeded.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
