/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The per-call context threaded through every middleware.

use crate::metadata::Metadata;
use crate::properties::PropertyBag;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation signal shared between a caller and its in-flight call.
///
/// Cancellation is observed, never enforced: middleware that sees a cancelled
/// context should return a `Cancelled` error without invoking the rest of the
/// chain, and the stack checks the token at each step boundary.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every holder of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once [`cancel`](CancellationToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-call state passed through every `handle` invocation.
///
/// The context owns the call's [`PropertyBag`] (middleware-local values such as
/// the selected auth scheme or resolved identity), its [`Metadata`], the trail
/// of executed middleware identifiers, and the cancellation token.
pub struct Context {
    properties: PropertyBag,
    metadata: Metadata,
    trail: Vec<String>,
    cancellation: CancellationToken,
}

impl Context {
    /// Creates a fresh context with its own cancellation token.
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Creates a context observing an externally held cancellation token.
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            properties: PropertyBag::new(),
            metadata: Metadata::new(),
            trail: Vec::new(),
            cancellation,
        }
    }

    /// The call's property bag.
    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// The call's property bag, mutably.
    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// The metadata collected so far.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The metadata collected so far, mutably.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Consumes the context, yielding the collected metadata.
    ///
    /// Callers do this after the stack returns, on success and on error both,
    /// so metadata recorded before a failure is never lost.
    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }

    /// The identifiers of every middleware dispatched so far, in invocation order.
    pub fn invocation_trail(&self) -> &[String] {
        &self.trail
    }

    pub(crate) fn record_invocation(&mut self, id: &str) {
        self.trail.push(id.to_string());
    }

    /// The cancellation token for this call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// True if the call has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("properties", &self.properties)
            .field("trail", &self.trail)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared() {
        let ctx = Context::new();
        let token = ctx.cancellation_token();
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn metadata_survives_into_metadata() {
        #[derive(Debug, PartialEq)]
        struct RequestId(&'static str);

        let mut ctx = Context::new();
        ctx.metadata_mut().insert(RequestId("amzn-1"));
        let metadata = ctx.into_metadata();
        assert_eq!(Some(&RequestId("amzn-1")), metadata.get());
    }
}
