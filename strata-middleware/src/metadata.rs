/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Per-call response metadata.

use crate::properties::PropertyBag;
use std::fmt;

/// Metadata accumulated over the course of one call.
///
/// Middleware deposit values here (request identifiers, tracing span ids,
/// attempt counts), keyed by a sentinel type each. Metadata is owned by the
/// per-call context, so values recorded before a failure are still available
/// to the caller alongside the error.
#[derive(Default)]
pub struct Metadata {
    values: PropertyBag,
}

impl Metadata {
    /// Creates an empty metadata container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value`, returning a previously recorded value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    /// Returns the recorded `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get()
    }

    /// Removes and returns the recorded `T`, if any.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values.remove()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("values", &self.values)
            .finish()
    }
}
