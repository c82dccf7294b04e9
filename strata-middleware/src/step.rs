/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A single phase of the stack: an ordered group of middleware plus the
//! machinery that drives them as one chain.

use crate::context::Context;
use crate::error::ClientError;
use crate::future::BoxFuture;
use crate::middleware::{Handler, Middleware, Next};
use crate::order::{OrderError, OrderedGroup, RelativePosition};
use std::fmt;
use std::sync::Arc;

/// One of the five fixed phases, typed over its phase-specific input/output pair.
///
/// Registration (`add`, `insert`, `swap`, `remove`, slots) must happen before
/// the stack's first call or under external synchronization; the step takes an
/// order snapshot when a call enters it and holds no locks.
pub struct Step<I, O> {
    name: &'static str,
    group: OrderedGroup<Arc<dyn Middleware<I, O>>>,
}

impl<I, O> fmt::Debug for Step<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("order", &self.group.list())
            .finish()
    }
}

impl<I, O> Step<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            group: OrderedGroup::new(),
        }
    }

    /// The phase name, e.g. `"Finalize"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adds `middleware` at the front or back of this step.
    ///
    /// Fills a same-named slot in place if one was reserved.
    pub fn add(
        &mut self,
        middleware: impl Middleware<I, O> + 'static,
        position: RelativePosition,
    ) -> Result<(), OrderError> {
        self.group.add(Arc::new(middleware), position)
    }

    /// Inserts `middleware` immediately before or after the middleware named
    /// `relative_to`.
    pub fn insert(
        &mut self,
        middleware: impl Middleware<I, O> + 'static,
        relative_to: &str,
        position: RelativePosition,
    ) -> Result<(), OrderError> {
        self.group.insert(Arc::new(middleware), relative_to, position)
    }

    /// Replaces the middleware at `id`, returning the one replaced.
    pub fn swap(
        &mut self,
        id: &str,
        middleware: impl Middleware<I, O> + 'static,
    ) -> Result<Option<Arc<dyn Middleware<I, O>>>, OrderError> {
        self.group.swap(id, Arc::new(middleware))
    }

    /// Removes the middleware (or slot) at `id`, returning the removed middleware.
    pub fn remove(&mut self, id: &str) -> Result<Option<Arc<dyn Middleware<I, O>>>, OrderError> {
        self.group.remove(id)
    }

    /// Returns the middleware registered under `id`, if present and filled.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Middleware<I, O>>> {
        self.group.get(id)
    }

    /// Removes every middleware and slot from this step.
    pub fn clear(&mut self) {
        self.group.clear()
    }

    /// Every registered identifier, slots included, in order.
    pub fn list(&self) -> Vec<&str> {
        self.group.list()
    }

    /// Reserves a named slot at the front or back of this step.
    pub fn add_slot(&mut self, id: &str, position: RelativePosition) -> Result<(), OrderError> {
        self.group.add_slot(id, position)
    }

    /// Reserves a named slot immediately before or after `relative_to`.
    pub fn insert_slot(
        &mut self,
        id: &str,
        relative_to: &str,
        position: RelativePosition,
    ) -> Result<(), OrderError> {
        self.group.insert_slot(id, relative_to, position)
    }

    /// Drives `input` through this step's middleware in effective order, with
    /// `terminal` as the innermost continuation.
    pub fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: I,
        terminal: &'a dyn Handler<I, O>,
    ) -> BoxFuture<'a, Result<O, ClientError>> {
        let chain: Arc<[Arc<dyn Middleware<I, O>>]> = self.group.snapshot().into();
        Next::new(chain, terminal).handle(ctx, input)
    }
}
