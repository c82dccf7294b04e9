/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The SigV4 auth scheme.
//!
//! Registered in a client's auth scheme registry, this is what the generic
//! Finalize-step `Signing` middleware dispatches to once `ResolveAuthScheme`
//! has selected `sigv4` and `GetIdentity` has produced a credentials identity.

use crate::settings::SigningSettings;
use crate::sign::RequestSigner;
use strata_auth::credentials::Credentials;
use strata_auth::identity::Identity;
use strata_auth::scheme::{
    AuthScheme, AuthSchemeId, SignRequest, SigningName, SigningRegion, UnsignedPayload,
};
use strata_http::request::HttpRequest;
use strata_middleware::error::{ClientError, ErrorKind};
use strata_middleware::properties::PropertyBag;
use strata_middleware::time::{SharedTimeSource, TimeSource};

/// The auth scheme ID for Signature Version 4.
pub const SCHEME_ID: AuthSchemeId = AuthSchemeId::new("sigv4");

/// Signature Version 4 as a client auth scheme.
#[derive(Debug)]
pub struct SigV4AuthScheme {
    signer: SigV4Signer,
}

impl SigV4AuthScheme {
    /// Creates the scheme with the given base settings and time source.
    pub fn new(settings: SigningSettings, time_source: SharedTimeSource) -> Self {
        Self {
            signer: SigV4Signer {
                settings,
                time_source,
            },
        }
    }
}

impl Default for SigV4AuthScheme {
    fn default() -> Self {
        Self::new(SigningSettings::default(), SharedTimeSource::default())
    }
}

impl AuthScheme for SigV4AuthScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        SCHEME_ID
    }

    fn signer(&self) -> &dyn SignRequest {
        &self.signer
    }
}

/// The [`SignRequest`] implementation behind [`SigV4AuthScheme`].
#[derive(Debug)]
pub struct SigV4Signer {
    settings: SigningSettings,
    time_source: SharedTimeSource,
}

impl SignRequest for SigV4Signer {
    fn sign_request(
        &self,
        request: &mut HttpRequest,
        identity: &Identity,
        signer_properties: &PropertyBag,
    ) -> Result<(), ClientError> {
        // An identity with no credentials (anonymous included) is sent unsigned.
        let credentials: &Credentials = match identity.data() {
            Some(credentials) => credentials,
            None => {
                tracing::debug!("identity carries no credentials; skipping signing");
                return Ok(());
            }
        };

        let name = signer_properties.get::<SigningName>().ok_or_else(|| {
            ClientError::invalid_configuration("sigv4 signing requires a signing name")
        })?;
        let region = signer_properties.get::<SigningRegion>().ok_or_else(|| {
            ClientError::invalid_configuration("sigv4 signing requires a signing region")
        })?;

        let mut settings = self.settings.clone();
        if let Some(unsigned) = signer_properties.get::<UnsignedPayload>() {
            if unsigned.is_unsigned() {
                settings.disable_implicit_payload_hashing = true;
            }
        }

        let params = crate::settings::SigningParams::builder()
            .credentials(credentials)
            .region(region.as_str())
            .name(name.as_str())
            .time(self.time_source.now())
            .settings(settings)
            .build()
            .map_err(|err| ClientError::with_source(ErrorKind::InvalidConfiguration, err))?;

        RequestSigner::new(request, params).sign().map_err(|err| {
            let kind = if err.is_payload_hashing() {
                ErrorKind::PayloadHashing
            } else {
                ErrorKind::Signing
            };
            ClientError::with_source(kind, err)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_time::test_parsers::parse_date_time;
    use http::Uri;
    use pretty_assertions::assert_eq;
    use strata_middleware::time::StaticTimeSource;

    fn scheme_at_test_time() -> SigV4AuthScheme {
        SigV4AuthScheme::new(
            SigningSettings::default(),
            SharedTimeSource::new(StaticTimeSource::new(parse_date_time("20150830T123600Z"))),
        )
    }

    fn signer_properties() -> PropertyBag {
        let mut properties = PropertyBag::new();
        properties.insert(SigningName::new("service"));
        properties.insert(SigningRegion::new("us-east-1"));
        properties
    }

    fn test_request() -> HttpRequest {
        let mut request = HttpRequest::new();
        request.set_uri(Uri::from_static("https://service.region.amazonaws.com/"));
        request
    }

    #[test]
    fn credentials_identity_is_signed() {
        let scheme = scheme_at_test_time();
        let mut request = test_request();
        scheme
            .signer()
            .sign_request(
                &mut request,
                &Credentials::for_tests().into(),
                &signer_properties(),
            )
            .unwrap();
        assert!(request.headers().contains_key("authorization"));
        assert_eq!(
            Some("20150830T123600Z"),
            request
                .headers()
                .get("x-amz-date")
                .and_then(|value| value.to_str().ok())
        );
    }

    #[test]
    fn credential_less_identity_skips_signing() {
        let scheme = scheme_at_test_time();
        let mut request = test_request();
        scheme
            .signer()
            .sign_request(
                &mut request,
                &Identity::new(strata_auth::identity::AnonymousIdentity, None),
                &signer_properties(),
            )
            .unwrap();
        assert!(request.headers().is_empty());
    }

    #[test]
    fn missing_signing_name_is_a_configuration_error() {
        let scheme = scheme_at_test_time();
        let mut request = test_request();
        let mut properties = PropertyBag::new();
        properties.insert(SigningRegion::new("us-east-1"));
        let err = scheme
            .signer()
            .sign_request(&mut request, &Credentials::for_tests().into(), &properties)
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidConfiguration, err.kind());
    }

    #[test]
    fn unsigned_payload_property_overrides_hashing() {
        let scheme = scheme_at_test_time();
        let mut request = test_request();
        request.replace_body(strata_http::body::Body::from_bytes("data"));
        let mut properties = signer_properties();
        properties.insert(UnsignedPayload::new(true));
        scheme
            .signer()
            .sign_request(
                &mut request,
                &Credentials::for_tests().into(),
                &properties,
            )
            .unwrap();
        // Hashing was skipped, so the canonical request used the sentinel;
        // the signature is still attached.
        assert!(request.headers().contains_key("authorization"));
    }
}
