/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! AWS Signature Version 4 signing for the Strata client runtime.
//!
//! # Example: signing a request directly
//!
//! ```rust
//! use std::time::SystemTime;
//! use strata_auth::credentials::Credentials;
//! use strata_http::request::HttpRequest;
//! use strata_sigv4::settings::{SigningParams, SigningSettings};
//! use strata_sigv4::sign::RequestSigner;
//!
//! # fn main() -> Result<(), strata_sigv4::error::SigningError> {
//! let credentials = Credentials::new("AKIDEXAMPLE", "secret", None);
//! let params = SigningParams::builder()
//!     .credentials(&credentials)
//!     .region("us-east-1")
//!     .name("exampleservice")
//!     .time(SystemTime::now())
//!     .settings(SigningSettings::default())
//!     .build()
//!     .expect("all required fields are set");
//!
//! let mut request = HttpRequest::new();
//! request.set_uri(http::Uri::from_static(
//!     "https://some-endpoint.some-region.amazonaws.com",
//! ));
//! let _signature = RequestSigner::new(&mut request, params).sign()?;
//! # Ok(())
//! # }
//! ```
//!
//! Inside a client the same flow runs as the Finalize-step `Signing`
//! middleware: register [`SigV4AuthScheme`](scheme::SigV4AuthScheme) with the
//! client's auth scheme registry and the generic auth middleware drive it.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod canonical;
mod date_time;
pub mod error;
pub mod payload;
pub mod scheme;
pub mod settings;
pub mod sign;
mod url_escape;
pub mod v4;
