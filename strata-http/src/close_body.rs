/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Response-body lifecycle middleware.
//!
//! The framework guarantees the response body is released on both paths out of
//! the Deserialize step. On the error path the guarantee needs no middleware:
//! the raw response is an owned value inside the chain, so an error unwinding
//! past the deserializer drops the body with it. On the success path the raw
//! response may outlive the call (callers can stash it in metadata), so
//! [`CloseResponseBody`] releases the body eagerly once the deserializers
//! below it are done. The [`ErrorCloseResponseBody`](crate::ids::ERROR_CLOSE_RESPONSE_BODY)
//! identifier stays reserved for transports whose responses hold resources
//! ownership alone cannot release.

use crate::ids;
use crate::response::HttpResponse;
use strata_middleware::context::Context;
use strata_middleware::error::ClientError;
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{DeserializeInput, DeserializeOutput};

/// Deserialize-step middleware that releases the response body on success.
///
/// Registered ahead of the operation deserializer so it runs after it on the
/// way back out: the response keeps its status and headers, but the body
/// source is dropped before the call returns.
#[derive(Debug, Default)]
pub struct CloseResponseBody;

impl CloseResponseBody {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware<DeserializeInput, DeserializeOutput> for CloseResponseBody {
    fn id(&self) -> &str {
        ids::CLOSE_RESPONSE_BODY
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: DeserializeInput,
        next: Next<'a, DeserializeInput, DeserializeOutput>,
    ) -> BoxFuture<'a, Result<DeserializeOutput, ClientError>> {
        Box::pin(async move {
            let mut output = next.handle(ctx, input).await?;
            if let Some(raw) = output.raw_response.as_mut() {
                if let Some(response) = raw.downcast_mut::<HttpResponse>() {
                    drop(response.take_body());
                }
            }
            Ok(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::request::HttpRequest;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use strata_middleware::middleware::Handler;
    use strata_middleware::order::RelativePosition;
    use strata_middleware::stack::Stack;
    use strata_middleware::value::DynValue;

    #[derive(Debug)]
    struct BodyTransport;

    impl Handler<DeserializeInput, DeserializeOutput> for BodyTransport {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut Context,
            _input: DeserializeInput,
        ) -> BoxFuture<'a, Result<DeserializeOutput, ClientError>> {
            Box::pin(async move {
                let mut response = HttpResponse::new(StatusCode::OK);
                response.replace_body(Body::from_bytes("payload"));
                Ok(DeserializeOutput {
                    raw_response: Some(DynValue::new(response)),
                    result: None,
                })
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct BodyReleased(bool);

    /// Sits outside the close middleware and records whether the body was
    /// already empty when the output passed back through.
    #[derive(Debug)]
    struct ReleaseObserver;

    impl Middleware<DeserializeInput, DeserializeOutput> for ReleaseObserver {
        fn id(&self) -> &str {
            "ReleaseObserver"
        }

        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            input: DeserializeInput,
            next: Next<'a, DeserializeInput, DeserializeOutput>,
        ) -> BoxFuture<'a, Result<DeserializeOutput, ClientError>> {
            Box::pin(async move {
                let output = next.handle(ctx, input).await?;
                let released = output
                    .raw_response
                    .as_ref()
                    .and_then(|raw| raw.downcast_ref::<HttpResponse>())
                    .map(|response| response.body().is_empty())
                    .unwrap_or(false);
                ctx.metadata_mut().insert(BodyReleased(released));
                Ok(output)
            })
        }
    }

    #[tokio::test]
    async fn body_is_released_before_the_step_returns() {
        let mut stack = Stack::new("close-test", || DynValue::new(HttpRequest::new()));
        stack
            .deserialize_mut()
            .add(ReleaseObserver, RelativePosition::After)
            .unwrap();
        stack
            .deserialize_mut()
            .add(CloseResponseBody::new(), RelativePosition::After)
            .unwrap();

        let mut ctx = Context::new();
        stack
            .handle(&mut ctx, DynValue::new(()), &BodyTransport)
            .await
            .unwrap();
        assert_eq!(Some(&BodyReleased(true)), ctx.metadata().get());
    }
}
