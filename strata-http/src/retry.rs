/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Transport-error retry.
//!
//! Retry sits in the Finalize step, registered ahead of auth resolution and
//! signing, so every replay re-resolves identity and re-signs with a fresh
//! timestamp. A replay uses a rewound clone of the request; calls whose body
//! cannot be replayed run exactly once.

use crate::ids;
use crate::request::HttpRequest;
use strata_middleware::context::Context;
use strata_middleware::error::{ClientError, ErrorKind};
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{FinalizeInput, FinalizeOutput};
use strata_middleware::value::DynValue;

/// The number of attempts a call consumed, recorded in the call metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttempts {
    attempts: u32,
}

impl RequestAttempts {
    fn new(attempts: u32) -> Self {
        Self { attempts }
    }

    /// How many attempts were made, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Finalize-step middleware that replays the downstream chain on transport errors.
#[derive(Debug)]
pub struct RetryMiddleware {
    max_attempts: u32,
}

impl RetryMiddleware {
    /// Creates a retry middleware making at most `max_attempts` attempts.
    ///
    /// Zero is treated as one: the call always runs.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Middleware<FinalizeInput, FinalizeOutput> for RetryMiddleware {
    fn id(&self) -> &str {
        ids::RETRY
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
        next: Next<'a, FinalizeInput, FinalizeOutput>,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            let request = HttpRequest::from_dyn(input.request)?;

            if self.max_attempts <= 1 || !request.body().is_replayable() {
                if self.max_attempts > 1 {
                    tracing::debug!("request body is not replayable; retry disabled for this call");
                }
                ctx.metadata_mut().insert(RequestAttempts::new(1));
                return next
                    .handle(
                        ctx,
                        FinalizeInput {
                            request: DynValue::new(request),
                        },
                    )
                    .await;
            }

            let mut attempt = 1;
            loop {
                let mut attempt_request = request
                    .try_clone()
                    .expect("body replayability checked above");
                attempt_request
                    .body_mut()
                    .rewind()
                    .map_err(ClientError::transport)?;

                ctx.metadata_mut().insert(RequestAttempts::new(attempt));
                let result = next
                    .clone()
                    .handle(
                        ctx,
                        FinalizeInput {
                            request: DynValue::new(attempt_request),
                        },
                    )
                    .await;

                match result {
                    Ok(output) => return Ok(output),
                    Err(err) if err.kind() == ErrorKind::Transport => {
                        if attempt >= self.max_attempts {
                            tracing::debug!(attempt, "retry attempts exhausted");
                            return Err(ClientError::with_source(ErrorKind::RetryExhausted, err));
                        }
                        tracing::debug!(attempt, "transport error; retrying");
                        attempt += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        })
    }
}
