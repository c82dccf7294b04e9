/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Settings and parameters that alter signing behavior.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use strata_auth::credentials::Credentials;

/// Settings that alter how a request is canonicalized and where the signature
/// is emitted.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SigningSettings {
    /// Whether the already-escaped URI path is percent-encoded a second time
    /// when building the canonical path.
    ///
    /// Some services compare signatures against the undecoded path and require
    /// clients to double-encode; that is the default. Services that decode
    /// first (S3-style) disable it.
    pub percent_encoding_mode: PercentEncodingMode,

    /// Whether the resolved payload hash is also emitted as the
    /// `x-amz-content-sha256` header.
    pub payload_checksum_kind: PayloadChecksumKind,

    /// Where the signature lands: request headers or query parameters.
    pub signature_location: SignatureLocation,

    /// Which request headers participate in the signature.
    pub header_rules: SignedHeaderRules,

    /// When true, a seekable body is NOT hashed implicitly; the unsigned
    /// payload policy applies instead.
    pub disable_implicit_payload_hashing: bool,

    /// When true and no payload hash could be resolved, the hash field is
    /// omitted entirely instead of carrying the `UNSIGNED-PAYLOAD` sentinel.
    pub disable_unsigned_payload_sentinel: bool,

    /// Presigning lifetime, emitted as `X-Amz-Expires` under query signing.
    pub expires_in: Option<Duration>,

    /// Override for the timestamp format used in `X-Amz-Date` and the
    /// string-to-sign. A `time` crate format description; the default is
    /// `YYYYMMDDThhmmssZ`. The rendered string is passed through unvalidated.
    pub canonical_time_format: Option<Cow<'static, str>>,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            percent_encoding_mode: PercentEncodingMode::Double,
            payload_checksum_kind: PayloadChecksumKind::NoHeader,
            signature_location: SignatureLocation::Headers,
            header_rules: SignedHeaderRules::default(),
            disable_implicit_payload_hashing: false,
            disable_unsigned_payload_sentinel: false,
            expires_in: None,
            canonical_time_format: None,
        }
    }
}

/// Whether the canonical path is percent-encoded a second time.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PercentEncodingMode {
    /// Re-encode the already-escaped path (e.g. `%20` becomes `%2520`).
    Double,

    /// Take the already-escaped path as-is.
    Single,
}

/// Whether to add an `x-amz-content-sha256` header with the payload hash.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PayloadChecksumKind {
    /// Add the header, mirroring the canonical request's payload hash field.
    ///
    /// This setting is required for S3.
    XContentSha256,

    /// Do not add the header.
    NoHeader,
}

/// Where to place the signature.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SignatureLocation {
    /// In the `authorization` header, alongside `x-amz-date`.
    Headers,

    /// In `X-Amz-*` query parameters (presigned requests).
    QueryParams,
}

/// Predicate deciding which headers are signed, by lowercased name.
#[derive(Clone)]
pub struct SignedHeaderRules {
    inner: RulesInner,
}

#[derive(Clone)]
enum RulesInner {
    Default,
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl SignedHeaderRules {
    /// Rules from a custom predicate over the lowercased header name.
    pub fn custom(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner: RulesInner::Custom(Arc::new(predicate)),
        }
    }

    /// True when the header named `lowercased_name` participates in the signature.
    ///
    /// The default rules accept `host` and anything prefixed `x-amz-`.
    pub fn is_signed(&self, lowercased_name: &str) -> bool {
        match &self.inner {
            RulesInner::Default => {
                lowercased_name == "host" || lowercased_name.starts_with("x-amz-")
            }
            RulesInner::Custom(predicate) => predicate(lowercased_name),
        }
    }
}

impl Default for SignedHeaderRules {
    fn default() -> Self {
        Self {
            inner: RulesInner::Default,
        }
    }
}

impl fmt::Debug for SignedHeaderRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            RulesInner::Default => f.write_str("SignedHeaderRules::Default"),
            RulesInner::Custom(_) => f.write_str("SignedHeaderRules::Custom"),
        }
    }
}

/// Parameters for one signing invocation.
#[derive(Debug)]
pub struct SigningParams<'a> {
    pub(crate) credentials: &'a Credentials,
    pub(crate) region: &'a str,
    pub(crate) name: &'a str,
    pub(crate) time: SystemTime,
    pub(crate) settings: SigningSettings,
}

impl<'a> SigningParams<'a> {
    /// Returns a builder for `SigningParams`.
    pub fn builder() -> signing_params::Builder<'a> {
        Default::default()
    }

    /// The region being signed for.
    pub fn region(&self) -> &str {
        self.region
    }

    /// The signing name (usually the service name; endpoint rules may differ).
    pub fn name(&self) -> &str {
        self.name
    }

    /// The timestamp baked into the signature.
    pub fn time(&self) -> SystemTime {
        self.time
    }

    /// The signing settings.
    pub fn settings(&self) -> &SigningSettings {
        &self.settings
    }
}

/// Builder and error for creating [`SigningParams`].
pub mod signing_params {
    use super::{SigningParams, SigningSettings};
    use std::error::Error;
    use std::fmt;
    use std::time::SystemTime;
    use strata_auth::credentials::Credentials;

    /// [`SigningParams`] builder error.
    #[derive(Debug)]
    pub struct BuildError {
        reason: &'static str,
    }

    impl BuildError {
        fn new(reason: &'static str) -> Self {
            Self { reason }
        }
    }

    impl fmt::Display for BuildError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.reason)
        }
    }

    impl Error for BuildError {}

    /// Builder that can create new [`SigningParams`].
    #[derive(Debug, Default)]
    pub struct Builder<'a> {
        credentials: Option<&'a Credentials>,
        region: Option<&'a str>,
        name: Option<&'a str>,
        time: Option<SystemTime>,
        settings: Option<SigningSettings>,
    }

    impl<'a> Builder<'a> {
        /// Sets the credentials (required).
        pub fn credentials(mut self, credentials: &'a Credentials) -> Self {
            self.credentials = Some(credentials);
            self
        }

        /// Sets the region (required).
        pub fn region(mut self, region: &'a str) -> Self {
            self.region = Some(region);
            self
        }

        /// Sets the signing name (required).
        pub fn name(mut self, name: &'a str) -> Self {
            self.name = Some(name);
            self
        }

        /// Sets the time to be used in the signature (required).
        pub fn time(mut self, time: SystemTime) -> Self {
            self.time = Some(time);
            self
        }

        /// Sets additional signing settings (required).
        pub fn settings(mut self, settings: SigningSettings) -> Self {
            self.settings = Some(settings);
            self
        }

        /// Builds an instance of [`SigningParams`]; yields a [`BuildError`] if
        /// a required argument was not given.
        pub fn build(self) -> Result<SigningParams<'a>, BuildError> {
            Ok(SigningParams {
                credentials: self
                    .credentials
                    .ok_or_else(|| BuildError::new("credentials are required"))?,
                region: self
                    .region
                    .ok_or_else(|| BuildError::new("region is required"))?,
                name: self
                    .name
                    .ok_or_else(|| BuildError::new("name is required"))?,
                time: self
                    .time
                    .ok_or_else(|| BuildError::new("time is required"))?,
                settings: self
                    .settings
                    .ok_or_else(|| BuildError::new("settings are required"))?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_accept_host_and_amz_headers() {
        let rules = SignedHeaderRules::default();
        assert!(rules.is_signed("host"));
        assert!(rules.is_signed("x-amz-date"));
        assert!(rules.is_signed("x-amz-security-token"));
        assert!(!rules.is_signed("user-agent"));
        assert!(!rules.is_signed("content-type"));
    }

    #[test]
    fn custom_rules_take_over_entirely() {
        let rules = SignedHeaderRules::custom(|name| name == "content-type");
        assert!(rules.is_signed("content-type"));
        assert!(!rules.is_signed("host"));
    }

    #[test]
    fn builder_requires_every_field() {
        let credentials = Credentials::for_tests();
        let err = SigningParams::builder()
            .credentials(&credentials)
            .region("us-east-1")
            .build()
            .unwrap_err();
        assert_eq!("name is required", format!("{err}"));
    }
}
