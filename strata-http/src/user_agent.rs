/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! User-agent assembly.
//!
//! The user agent is an append-only sequence of tokens, each either a bare
//! `key` or a `key#value` pair, joined by single spaces in insertion order.
//! Values are sanitized so the rendered header is always well-formed; keys are
//! taken verbatim (callers control them, and slashes are part of the grammar,
//! e.g. `lib/1.2.3`).

use crate::ids;
use crate::request::HttpRequest;
use http::header::USER_AGENT;
use http::HeaderValue;
use strata_middleware::context::Context;
use strata_middleware::error::{ClientError, ErrorKind};
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{BuildInput, BuildOutput};
use strata_middleware::value::DynValue;

/// Characters preserved verbatim in token values, beyond ASCII alphanumerics.
const VALID_VALUE_PUNCTUATION: &[char] = &[
    '!', '#', '$', '%', '&', '\'', '*', '+', '-', '.', '^', '_', '`', '|', '~',
];

fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || VALID_VALUE_PUNCTUATION.contains(&c) {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Append-only accumulator of user-agent tokens.
#[derive(Debug, Clone, Default)]
pub struct UserAgentBuilder {
    tokens: Vec<String>,
}

impl UserAgentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bare `key` token.
    pub fn add_key(&mut self, key: impl Into<String>) {
        self.tokens.push(key.into());
    }

    /// Appends a `key#value` token; the value is sanitized.
    pub fn add_key_value(&mut self, key: impl Into<String>, value: &str) {
        let mut token = key.into();
        token.push('#');
        token.push_str(&sanitize_value(value));
        self.tokens.push(token);
    }

    /// Renders the accumulated tokens.
    pub fn build(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Build-step middleware that renders the accumulated tokens into the
/// `User-Agent` header.
#[derive(Debug)]
pub struct UserAgentMiddleware {
    user_agent: String,
}

impl UserAgentMiddleware {
    /// Creates the middleware from a finished builder.
    pub fn new(builder: &UserAgentBuilder) -> Self {
        Self {
            user_agent: builder.build(),
        }
    }
}

impl Middleware<BuildInput, BuildOutput> for UserAgentMiddleware {
    fn id(&self) -> &str {
        ids::USER_AGENT
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: BuildInput,
        next: Next<'a, BuildInput, BuildOutput>,
    ) -> BoxFuture<'a, Result<BuildOutput, ClientError>> {
        Box::pin(async move {
            let mut request = HttpRequest::from_dyn(input.request)?;
            let value = HeaderValue::from_str(&self.user_agent)
                .map_err(|err| ClientError::with_source(ErrorKind::InvalidConfiguration, err))?;
            request.headers_mut().insert(USER_AGENT, value);
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokens_join_in_insertion_order() {
        let mut builder = UserAgentBuilder::new();
        builder.add_key_value("baz/ba", "1(2)3");
        builder.add_key("zab");
        assert_eq!("baz/ba#1-2-3 zab", builder.build());
    }

    #[test]
    fn values_keep_the_allowed_punctuation() {
        let mut builder = UserAgentBuilder::new();
        builder.add_key_value("lang/rust", "1.74_x86-64");
        builder.add_key_value("os", "linux kernel");
        assert_eq!("lang/rust#1.74_x86-64 os#linux-kernel", builder.build());
    }

    #[test]
    fn non_ascii_code_points_become_dashes() {
        let mut builder = UserAgentBuilder::new();
        builder.add_key_value("app", "café");
        assert_eq!("app#caf-", builder.build());
    }
}
