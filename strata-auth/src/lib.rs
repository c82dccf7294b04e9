/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Request authentication for the Strata client runtime.
//!
//! Three Finalize-step middleware carry a call from "which auth scheme?" to a
//! signed request: [`ResolveAuthScheme`](middleware::ResolveAuthScheme) walks
//! the resolver's candidates and selects the first scheme the client supports,
//! [`GetIdentity`](middleware::GetIdentity) obtains an
//! [`Identity`](identity::Identity) from the scheme's resolver, and
//! [`Signing`](middleware::Signing) hands the in-flight request to the
//! scheme's [`SignRequest`](scheme::SignRequest) implementation.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod credentials;
pub mod identity;
pub mod middleware;
pub mod scheme;

/// Reserved middleware identifiers at the auth layer.
pub mod ids {
    /// Finalize-step middleware selecting the auth scheme for the call.
    pub const RESOLVE_AUTH_SCHEME: &str = "ResolveAuthScheme";
    /// Finalize-step middleware obtaining the identity for the selected scheme.
    pub const GET_IDENTITY: &str = "GetIdentity";
    /// Finalize-step middleware signing the in-flight request.
    pub const SIGNING: &str = "Signing";
}
