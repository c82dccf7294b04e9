/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The middleware and handler abstractions every step is built from.

use crate::context::Context;
use crate::error::ClientError;
use crate::future::BoxFuture;
use crate::order::Identified;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A single transformation in a step's invocation chain.
///
/// A middleware receives the step input, the per-call [`Context`], and the
/// [`Next`] continuation. It may run logic before and after delegating, may
/// invoke `next` zero times (short-circuit) or more than once (retry), and
/// must otherwise pass the input through unchanged in meaning.
pub trait Middleware<I, O>: Send + Sync + fmt::Debug {
    /// The identifier of this middleware, unique within its step.
    fn id(&self) -> &str;

    /// Handles the step input, delegating to `next` for the rest of the chain.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: I,
        next: Next<'a, I, O>,
    ) -> BoxFuture<'a, Result<O, ClientError>>;
}

impl<I, O> Identified for Arc<dyn Middleware<I, O>> {
    fn id(&self) -> &str {
        (**self).id()
    }
}

/// A terminal continuation: whatever sits behind a step's middleware chain.
///
/// For the innermost step this is the transport itself; for the outer steps it
/// is the dispatch adapter that enters the next step.
pub trait Handler<I, O>: Send + Sync + fmt::Debug {
    /// Handles `input`, producing the step output.
    fn call<'a>(&'a self, ctx: &'a mut Context, input: I) -> BoxFuture<'a, Result<O, ClientError>>;
}

/// The remainder of a step's invocation chain.
///
/// `Next` is a cursor over the order snapshot taken when the step was entered,
/// so an in-flight call never observes registrations made after it started.
/// Cloning is cheap, which is what lets retry middleware drive the downstream
/// chain more than once.
pub struct Next<'h, I, O> {
    chain: Arc<[Arc<dyn Middleware<I, O>>]>,
    position: usize,
    terminal: &'h dyn Handler<I, O>,
}

impl<'h, I, O> Clone for Next<'h, I, O> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            position: self.position,
            terminal: self.terminal,
        }
    }
}

impl<'h, I, O> fmt::Debug for Next<'h, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining: Vec<&str> = self.chain[self.position..]
            .iter()
            .map(|middleware| middleware.id())
            .collect();
        f.debug_struct("Next").field("remaining", &remaining).finish()
    }
}

impl<'h, I, O> Next<'h, I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(
        chain: Arc<[Arc<dyn Middleware<I, O>>]>,
        terminal: &'h dyn Handler<I, O>,
    ) -> Self {
        Self {
            chain,
            position: 0,
            terminal,
        }
    }

    /// Dispatches `input` to the next middleware in the chain, or to the
    /// terminal handler once the chain is exhausted.
    ///
    /// The identifier of each dispatched middleware is recorded on the context
    /// before its body runs, so the terminal handler observes the full trail.
    pub fn handle<'a>(
        mut self,
        ctx: &'a mut Context,
        input: I,
    ) -> BoxFuture<'a, Result<O, ClientError>>
    where
        'h: 'a,
    {
        match self.chain.get(self.position).cloned() {
            Some(middleware) => {
                self.position += 1;
                ctx.record_invocation(middleware.id());
                Box::pin(async move { middleware.handle(ctx, input, self).await })
            }
            None => self.terminal.call(ctx, input),
        }
    }
}

/// A [`Middleware`] built from a plain function, for transformations with no
/// per-instance state.
pub struct MiddlewareFn<F> {
    id: Cow<'static, str>,
    f: F,
}

impl<F> MiddlewareFn<F> {
    /// Wraps `f` as a middleware identified by `id`.
    pub fn new(id: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<F> fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn").field("id", &self.id).finish()
    }
}

impl<I, O, F> Middleware<I, O> for MiddlewareFn<F>
where
    F: for<'a> Fn(
            &'a mut Context,
            I,
            Next<'a, I, O>,
        ) -> BoxFuture<'a, Result<O, ClientError>>
        + Send
        + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: I,
        next: Next<'a, I, O>,
    ) -> BoxFuture<'a, Result<O, ClientError>> {
        (self.f)(ctx, input, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Terminal;

    impl Handler<u32, u32> for Terminal {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut Context,
            input: u32,
        ) -> BoxFuture<'a, Result<u32, ClientError>> {
            Box::pin(async move { Ok(input + 1) })
        }
    }

    fn double<'a>(
        ctx: &'a mut Context,
        input: u32,
        next: Next<'a, u32, u32>,
    ) -> BoxFuture<'a, Result<u32, ClientError>> {
        next.handle(ctx, input * 2)
    }

    #[tokio::test]
    async fn middleware_fn_wraps_a_plain_function() {
        let middleware = MiddlewareFn::new("Double", double);
        assert_eq!("Double", middleware.id());

        let chain: Arc<[Arc<dyn Middleware<u32, u32>>]> =
            vec![Arc::new(middleware) as Arc<dyn Middleware<u32, u32>>].into();
        let mut ctx = Context::new();
        let result = Next::new(chain, &Terminal)
            .handle(&mut ctx, 10)
            .await
            .unwrap();
        assert_eq!(21, result);
        assert_eq!(vec!["Double".to_string()], ctx.invocation_trail());
    }
}
