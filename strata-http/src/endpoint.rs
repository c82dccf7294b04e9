/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Endpoint application.
//!
//! Rule-engine endpoint *resolution* happens outside this crate; what lives
//! here is the resolved [`Endpoint`] and the Finalize-step middleware that
//! grafts it onto the in-flight request. The signing middleware anchors
//! immediately after this one.

use crate::ids;
use crate::request::HttpRequest;
use http::uri::{Authority, Scheme};
use http::Uri;
use strata_middleware::context::Context;
use strata_middleware::error::{ClientError, ErrorKind};
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{FinalizeInput, FinalizeOutput};
use strata_middleware::value::DynValue;
use thiserror::Error;

/// An error constructing or applying an [`Endpoint`].
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint URI carried no scheme.
    #[error("endpoint URI must have a scheme")]
    MissingScheme,
    /// The endpoint URI carried no authority.
    #[error("endpoint URI must have an authority")]
    MissingAuthority,
    /// Merging the endpoint into the request produced an invalid URI.
    #[error("failed to apply the endpoint to the request URI")]
    InvalidUri(#[from] http::Error),
}

/// A resolved service endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    scheme: Scheme,
    authority: Authority,
    path_prefix: String,
}

impl Endpoint {
    /// Creates an endpoint from a URI with a scheme and authority.
    ///
    /// Any path on the URI becomes a prefix prepended to request paths.
    pub fn new(uri: Uri) -> Result<Self, EndpointError> {
        let scheme = uri.scheme().cloned().ok_or(EndpointError::MissingScheme)?;
        let authority = uri
            .authority()
            .cloned()
            .ok_or(EndpointError::MissingAuthority)?;
        let path_prefix = uri.path().trim_end_matches('/').to_string();
        Ok(Self {
            scheme,
            authority,
            path_prefix,
        })
    }

    /// The endpoint authority, e.g. `service.region.amazonaws.com`.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Rewrites `request` to target this endpoint, preserving its path and query.
    pub fn apply_to(&self, request: &mut HttpRequest) -> Result<(), EndpointError> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let merged = if self.path_prefix.is_empty() {
            path_and_query.to_string()
        } else {
            format!("{}{}", self.path_prefix, path_and_query)
        };
        let uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(merged.as_str())
            .build()?;
        request.set_uri(uri);
        Ok(())
    }
}

/// Finalize-step middleware that applies a resolved endpoint to the request.
#[derive(Debug)]
pub struct ResolveEndpoint {
    endpoint: Endpoint,
}

impl ResolveEndpoint {
    /// Creates the middleware for a fixed, already-resolved endpoint.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl Middleware<FinalizeInput, FinalizeOutput> for ResolveEndpoint {
    fn id(&self) -> &str {
        ids::RESOLVE_ENDPOINT
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
        next: Next<'a, FinalizeInput, FinalizeOutput>,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            let mut request = HttpRequest::from_dyn(input.request)?;
            self.endpoint
                .apply_to(&mut request)
                .map_err(|err| ClientError::with_source(ErrorKind::InvalidConfiguration, err))?;
            tracing::trace!(authority = %self.endpoint.authority(), "applied endpoint");
            next.handle(
                ctx,
                FinalizeInput {
                    request: DynValue::new(request),
                },
            )
            .await
        })
    }
}
