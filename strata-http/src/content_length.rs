/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Content-length derivation.

use crate::ids;
use crate::request::HttpRequest;
use http::header::CONTENT_LENGTH;
use http::HeaderValue;
use strata_middleware::context::Context;
use strata_middleware::error::ClientError;
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{BuildInput, BuildOutput};
use strata_middleware::value::DynValue;

/// Build-step middleware that sets the `Content-Length` header.
///
/// An explicit content-length override on the request wins; otherwise the
/// length is taken from the body when it is knowable without I/O. Streaming
/// bodies of unknown length get no header. A zero-length body only gets the
/// header when an override forced it.
#[derive(Debug, Default)]
pub struct ComputeContentLength;

impl ComputeContentLength {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware<BuildInput, BuildOutput> for ComputeContentLength {
    fn id(&self) -> &str {
        ids::COMPUTE_CONTENT_LENGTH
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: BuildInput,
        next: Next<'a, BuildInput, BuildOutput>,
    ) -> BoxFuture<'a, Result<BuildOutput, ClientError>> {
        Box::pin(async move {
            let mut request = HttpRequest::from_dyn(input.request)?;
            let length = match request.content_length_override() {
                Some(length) => Some(length),
                None => request.body().content_length().filter(|length| *length > 0),
            };
            if let Some(length) = length {
                request
                    .headers_mut()
                    .insert(CONTENT_LENGTH, HeaderValue::from(length));
            }
            next.handle(
                ctx,
                BuildInput {
                    request: DynValue::new(request),
                },
            )
            .await
        })
    }
}
