/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! HTTP transport types and protocol middleware for the Strata client runtime.
//!
//! This crate supplies the concrete transport request/response pair carried
//! (type-erased) through the [`strata_middleware`] stack, the body stream
//! classification the signer and retry middleware depend on, and the protocol
//! middleware the framework registers around generated serializers: endpoint
//! resolution, content length, user agent, retry, and response-body cleanup.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod body;
pub mod close_body;
pub mod content_length;
pub mod endpoint;
pub mod query_writer;
pub mod request;
pub mod response;
pub mod retry;
pub mod user_agent;

/// Reserved middleware identifiers at the protocol layer.
///
/// Generated code anchors its own registrations against these with
/// `insert(.., relative_to, ..)`, and fills the ones it implements
/// (serializers, validators) into pre-reserved slots.
pub mod ids {
    /// Build-step middleware deriving the `Content-Length` header.
    pub const COMPUTE_CONTENT_LENGTH: &str = "ComputeContentLength";
    /// Build-step slot for checksum middleware.
    pub const CONTENT_CHECKSUM: &str = "ContentChecksum";
    /// Deserialize-step middleware releasing the response body on success.
    pub const CLOSE_RESPONSE_BODY: &str = "CloseResponseBody";
    /// Deserialize-step slot reserved for error-path response cleanup.
    ///
    /// This runtime's error path releases the body by ownership when the
    /// chain unwinds, so no middleware ships under this identifier; it is
    /// reserved for transports whose responses hold more than memory.
    pub const ERROR_CLOSE_RESPONSE_BODY: &str = "ErrorCloseResponseBody";
    /// Deserialize-step slot for the generated response deserializer.
    pub const OPERATION_DESERIALIZER: &str = "OperationDeserializer";
    /// Initialize-step slot for idempotency token auto-fill.
    pub const OPERATION_IDEMPOTENCY_TOKEN_AUTO_FILL: &str = "OperationIdempotencyTokenAutoFill";
    /// Initialize-step slot for generated input validation.
    pub const OPERATION_INPUT_VALIDATION: &str = "OperationInputValidation";
    /// Serialize-step slot for the generated request serializer.
    pub const OPERATION_SERIALIZER: &str = "OperationSerializer";
    /// Deserialize-step slot for response content-length validation.
    pub const VALIDATE_CONTENT_LENGTH: &str = "ValidateContentLength";
    /// Finalize-step middleware applying the resolved endpoint; the signing
    /// middleware anchors immediately after this.
    pub const RESOLVE_ENDPOINT: &str = "ResolveEndpoint";
    /// Finalize-step retry middleware, registered ahead of auth resolution so
    /// a replay re-signs.
    pub const RETRY: &str = "Retry";
    /// Build-step middleware rendering the `User-Agent` header.
    pub const USER_AGENT: &str = "UserAgent";
}
