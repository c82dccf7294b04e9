/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The transport request carried through the stack.

use crate::body::Body;
use http::{HeaderMap, Method, Uri};
use strata_middleware::error::ClientError;
use strata_middleware::value::DynValue;

/// An HTTP request under construction by the pipeline.
///
/// Header lookup is case-insensitive and multi-valued; the URI path is stored
/// already percent-encoded, and the raw query string is a sequence of
/// `key=value` pairs whose sides are already percent-encoded. An explicit host
/// override, when present, wins over the URI authority everywhere the host is
/// consulted (signing included).
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
    host: Option<String>,
    content_length: Option<u64>,
}

impl HttpRequest {
    /// Creates an empty `GET /` request for the Serialize step to fill in.
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Body::empty(),
            host: None,
            content_length: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the request method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Replaces the request URI.
    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request headers, mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The request body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The request body, mutably.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replaces the body, returning the previous one.
    pub fn replace_body(&mut self, body: Body) -> Body {
        std::mem::replace(&mut self.body, body)
    }

    /// The explicit host override, if one was set.
    pub fn host_override(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Sets the explicit host override.
    pub fn set_host_override(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    /// The effective host: the override when present, else the URI authority.
    pub fn host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .or_else(|| self.uri.authority().map(|authority| authority.as_str()))
    }

    /// The explicit content-length override, if one was set.
    pub fn content_length_override(&self) -> Option<u64> {
        self.content_length
    }

    /// Sets the explicit content-length override.
    pub fn set_content_length_override(&mut self, length: u64) {
        self.content_length = Some(length);
    }

    /// Erases this request for the stack's cross-step carrier.
    pub fn into_dyn(self) -> DynValue {
        DynValue::new(self)
    }

    /// Recovers the concrete request from the stack's type-erased carrier.
    ///
    /// Middleware in this crate fail the call with an invalid-configuration
    /// error when the stack was assembled over some other transport type.
    pub fn from_dyn(value: DynValue) -> Result<HttpRequest, ClientError> {
        value.downcast::<HttpRequest>().map_err(|value| {
            ClientError::invalid_configuration(format!(
                "unexpected transport request type `{}`",
                value.type_name()
            ))
        })
    }

    /// Clones the request for a replay.
    ///
    /// Returns `None` when the body is not replayable.
    pub fn try_clone(&self) -> Option<HttpRequest> {
        Some(HttpRequest {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
            host: self.host.clone(),
            content_length: self.content_length,
        })
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_override_wins_over_authority() {
        let mut request = HttpRequest::new();
        request.set_uri(Uri::from_static("https://service.region.amazonaws.com/path"));
        assert_eq!(Some("service.region.amazonaws.com"), request.host());

        request.set_host_override("override.example.com");
        assert_eq!(Some("override.example.com"), request.host());
    }

    #[test]
    fn try_clone_requires_replayable_body() {
        let mut request = HttpRequest::new();
        request.replace_body(Body::from_bytes("payload"));
        assert!(request.try_clone().is_some());

        request.replace_body(Body::from_streaming(std::io::Cursor::new(vec![0u8; 4])));
        assert!(request.try_clone().is_none());
    }
}
