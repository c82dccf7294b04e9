/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The request signer.
//!
//! A [`RequestSigner`] is created per signing invocation and consumed by
//! [`sign`](RequestSigner::sign), which mutates the request in place:
//! under header signing it sets `host`, `x-amz-date`, the optional security
//! token and payload hash headers, then attaches `authorization`; under query
//! signing it strips the date/token *headers* and attaches the `X-Amz-*`
//! parameter set plus `X-Amz-Signature` to the query string instead.

use crate::canonical::{
    header, param, CanonicalRequest, QueryParamValues, SignatureValues, SigningScope, StringToSign,
};
use crate::date_time::{format_date_time, format_with};
use crate::error::{CanonicalRequestError, SigningError};
use crate::payload::{resolve_payload_hash, PayloadHash};
use crate::settings::{PayloadChecksumKind, SignatureLocation, SigningParams};
use crate::v4::{sha256_hex_string, SigV4Finalizer, SignatureFinalizer};
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, HOST};
use std::sync::Arc;
use strata_http::query_writer::QueryWriter;
use strata_http::request::HttpRequest;

/// Signs one request, once.
///
/// The signer owns its borrow of the request for the duration of signing and
/// is consumed by [`sign`](RequestSigner::sign); the type system makes a
/// second invocation on the same state unrepresentable.
#[derive(Debug)]
pub struct RequestSigner<'a> {
    request: &'a mut HttpRequest,
    params: SigningParams<'a>,
    payload_hash: Option<&'a [u8]>,
    finalizer: Arc<dyn SignatureFinalizer>,
}

impl<'a> RequestSigner<'a> {
    /// Creates a signer over `request` with the symmetric SigV4 finalizer.
    pub fn new(request: &'a mut HttpRequest, params: SigningParams<'a>) -> Self {
        Self {
            request,
            params,
            payload_hash: None,
            finalizer: Arc::new(SigV4Finalizer::new()),
        }
    }

    /// Provides the payload hash instead of letting the signer resolve one.
    ///
    /// The sentinel bytes `UNSIGNED-PAYLOAD` pass through verbatim; any other
    /// bytes are hex-encoded.
    pub fn payload_hash(mut self, hash: &'a [u8]) -> Self {
        self.payload_hash = Some(hash);
        self
    }

    /// Replaces the signature finalizer (e.g. for asymmetric signing).
    pub fn finalizer(mut self, finalizer: Arc<dyn SignatureFinalizer>) -> Self {
        self.finalizer = finalizer;
        self
    }

    /// Signs the request in place, returning the hex signature.
    pub fn sign(self) -> Result<String, SigningError> {
        let payload_hash = resolve_payload_hash(
            self.payload_hash,
            self.request.body_mut(),
            &self.params.settings,
        )?;
        let date_time = match &self.params.settings.canonical_time_format {
            Some(pattern) => format_with(self.params.time, pattern)?,
            None => format_date_time(self.params.time),
        };
        match self.params.settings.signature_location {
            SignatureLocation::Headers => self.sign_headers(&payload_hash, &date_time),
            SignatureLocation::QueryParams => self.sign_query(&payload_hash, &date_time),
        }
    }

    fn host_header(&self) -> Result<HeaderValue, SigningError> {
        let host = self
            .request
            .host()
            .ok_or_else(SigningError::no_signable_host)?;
        Ok(HeaderValue::from_str(host).map_err(CanonicalRequestError::from)?)
    }

    /// Sets the headers that participate in the signature before anything is
    /// hashed.
    fn set_required_headers(
        &mut self,
        payload_hash: &PayloadHash,
        date_time: &str,
    ) -> Result<(), SigningError> {
        let host = self.host_header()?;
        self.request.headers_mut().insert(HOST, host);

        let date_header =
            HeaderValue::from_str(date_time).map_err(CanonicalRequestError::from)?;
        self.request
            .headers_mut()
            .insert(HeaderName::from_static(header::X_AMZ_DATE), date_header);

        if let Some(token) = self.params.credentials.session_token() {
            let mut token_header =
                HeaderValue::from_str(token).map_err(CanonicalRequestError::from)?;
            token_header.set_sensitive(true);
            self.request.headers_mut().insert(
                HeaderName::from_static(header::X_AMZ_SECURITY_TOKEN),
                token_header,
            );
        }

        if self.params.settings.payload_checksum_kind == PayloadChecksumKind::XContentSha256
            && *payload_hash != PayloadHash::Omitted
        {
            let hash_header =
                HeaderValue::from_str(payload_hash.as_str()).map_err(CanonicalRequestError::from)?;
            self.request.headers_mut().insert(
                HeaderName::from_static(header::X_AMZ_CONTENT_SHA_256),
                hash_header,
            );
        }
        Ok(())
    }

    fn sign_headers(
        mut self,
        payload_hash: &PayloadHash,
        date_time: &str,
    ) -> Result<String, SigningError> {
        self.set_required_headers(payload_hash, date_time)?;

        let creq = CanonicalRequest::from(
            self.request,
            payload_hash,
            &self.params,
            &SignatureValues::Headers,
        )?;
        tracing::trace!(canonical_request = %creq, "calculated canonical request");
        let signed_headers = creq.signed_headers().as_str().to_string();
        let hashed_creq = sha256_hex_string(creq.to_string());

        let scope = SigningScope::new(self.params.time, self.params.region, self.params.name);
        let string_to_sign = StringToSign {
            algorithm: self.finalizer.algorithm(),
            date_time,
            scope: scope.clone(),
            hashed_creq: &hashed_creq,
        }
        .to_string();
        tracing::trace!(string_to_sign = %string_to_sign, "calculated string to sign");

        let signature = self.finalizer.finalize(
            string_to_sign.as_bytes(),
            self.params.credentials,
            self.params.time,
            self.params.region,
            self.params.name,
        )?;

        // authorization: algorithm Credential=key/scope, SignedHeaders=list, Signature=hex
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            self.finalizer.algorithm(),
            self.params.credentials.access_key_id(),
            scope,
            signed_headers,
            signature
        );
        let authorization =
            HeaderValue::from_str(&authorization).map_err(CanonicalRequestError::from)?;
        self.request
            .headers_mut()
            .insert(AUTHORIZATION, authorization);
        Ok(signature)
    }

    fn sign_query(
        self,
        payload_hash: &PayloadHash,
        date_time: &str,
    ) -> Result<String, SigningError> {
        // Under query signing the date and token must NOT also be headers;
        // remove them if earlier middleware set them.
        self.request.headers_mut().remove(header::X_AMZ_DATE);
        self.request
            .headers_mut()
            .remove(header::X_AMZ_SECURITY_TOKEN);
        let host = self.host_header()?;
        self.request.headers_mut().insert(HOST, host);

        let scope = SigningScope::new(self.params.time, self.params.region, self.params.name);
        let credential = format!("{}/{}", self.params.credentials.access_key_id(), scope);
        let expires = self
            .params
            .settings
            .expires_in
            .map(|expires| expires.as_secs().to_string());

        let values = QueryParamValues {
            algorithm: self.finalizer.algorithm(),
            credential: credential.clone(),
            date_time,
            expires: expires.clone(),
            security_token: self.params.credentials.session_token(),
        };
        let creq = CanonicalRequest::from(
            self.request,
            payload_hash,
            &self.params,
            &SignatureValues::QueryParams(values),
        )?;
        tracing::trace!(canonical_request = %creq, "calculated canonical request");
        let signed_headers = creq.signed_headers().as_str().to_string();
        let hashed_creq = sha256_hex_string(creq.to_string());

        let string_to_sign = StringToSign {
            algorithm: self.finalizer.algorithm(),
            date_time,
            scope,
            hashed_creq: &hashed_creq,
        }
        .to_string();
        tracing::trace!(string_to_sign = %string_to_sign, "calculated string to sign");

        let signature = self.finalizer.finalize(
            string_to_sign.as_bytes(),
            self.params.credentials,
            self.params.time,
            self.params.region,
            self.params.name,
        )?;

        let mut writer = QueryWriter::new(self.request.uri());
        writer.insert(param::X_AMZ_ALGORITHM, self.finalizer.algorithm());
        writer.insert(param::X_AMZ_CREDENTIAL, &credential);
        writer.insert(param::X_AMZ_DATE, date_time);
        if let Some(expires) = &expires {
            writer.insert(param::X_AMZ_EXPIRES, expires);
        }
        writer.insert(param::X_AMZ_SIGNED_HEADERS, &signed_headers);
        if let Some(token) = self.params.credentials.session_token() {
            writer.insert(param::X_AMZ_SECURITY_TOKEN, token);
        }
        writer.insert(param::X_AMZ_SIGNATURE, &signature);
        self.request.set_uri(writer.build_uri());
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_time::test_parsers::parse_date_time;
    use crate::payload::UNSIGNED_PAYLOAD;
    use crate::settings::SigningSettings;
    use http::{Method, Uri};
    use pretty_assertions::assert_eq;
    use std::time::SystemTime;
    use strata_auth::credentials::Credentials;

    fn test_request() -> HttpRequest {
        let mut request = HttpRequest::new();
        request.set_method(Method::POST);
        request.set_uri(Uri::from_static(
            "https://service.region.amazonaws.com/operation?existing=param",
        ));
        request
    }

    fn params<'a>(
        credentials: &'a Credentials,
        time: SystemTime,
        settings: SigningSettings,
    ) -> SigningParams<'a> {
        SigningParams::builder()
            .credentials(credentials)
            .region("us-east-1")
            .name("service")
            .time(time)
            .settings(settings)
            .build()
            .unwrap()
    }

    fn header_str<'r>(request: &'r HttpRequest, name: &str) -> Option<&'r str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn required_headers_at_the_unix_epoch() {
        let credentials = Credentials::for_tests();
        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XContentSha256;
        let params = params(&credentials, SystemTime::UNIX_EPOCH, settings);

        let mut request = test_request();
        RequestSigner::new(&mut request, params)
            .payload_hash(&[0x00, 0x01, 0x02, 0x03])
            .sign()
            .unwrap();

        assert_eq!(
            Some("service.region.amazonaws.com"),
            header_str(&request, "host")
        );
        assert_eq!(Some("19700101T000000Z"), header_str(&request, "x-amz-date"));
        assert_eq!(
            Some("00010203"),
            header_str(&request, "x-amz-content-sha256")
        );
    }

    #[test]
    fn authorization_header_shape() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let params = params(&credentials, time, SigningSettings::default());

        let mut request = test_request();
        request.replace_body(strata_http::body::Body::from_bytes("{}"));
        let signature = RequestSigner::new(&mut request, params).sign().unwrap();

        let authorization = header_str(&request, "authorization").unwrap().to_string();
        assert!(
            authorization.starts_with(
                "AWS4-HMAC-SHA256 \
                 Credential=ANOTREAL/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, "
            ),
            "{authorization}"
        );
        assert!(authorization.ends_with(&format!("Signature={signature}")));
        assert_eq!(64, signature.len());
        assert!(signature.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn signing_is_deterministic() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");

        let mut first = test_request();
        let mut second = test_request();
        let first_signature = RequestSigner::new(
            &mut first,
            params(&credentials, time, SigningSettings::default()),
        )
        .sign()
        .unwrap();
        let second_signature = RequestSigner::new(
            &mut second,
            params(&credentials, time, SigningSettings::default()),
        )
        .sign()
        .unwrap();
        assert_eq!(first_signature, second_signature);
    }

    #[test]
    fn session_token_rides_headers_under_header_signing() {
        let credentials = Credentials::for_tests_with_session_token();
        let time = parse_date_time("20150830T123600Z");
        let params = params(&credentials, time, SigningSettings::default());

        let mut request = test_request();
        RequestSigner::new(&mut request, params).sign().unwrap();

        assert_eq!(
            Some("notarealsessiontoken"),
            header_str(&request, "x-amz-security-token")
        );
        assert!(!request
            .uri()
            .query()
            .unwrap_or_default()
            .contains("X-Amz-Security-Token"));
        // The token header participates in the signature.
        assert!(header_str(&request, "authorization")
            .unwrap()
            .contains("SignedHeaders=host;x-amz-date;x-amz-security-token,"));
    }

    #[test]
    fn query_signing_preserves_existing_parameters_and_adds_the_set() {
        let credentials = Credentials::for_tests_with_session_token();
        let time = parse_date_time("20150830T123600Z");
        let mut settings = SigningSettings::default();
        settings.signature_location = SignatureLocation::QueryParams;
        let params = params(&credentials, time, settings);

        let mut request = test_request();
        // Simulate earlier middleware having set the headers that must move.
        request
            .headers_mut()
            .insert("x-amz-date", HeaderValue::from_static("20150830T123600Z"));
        request.headers_mut().insert(
            "x-amz-security-token",
            HeaderValue::from_static("stale-token"),
        );
        RequestSigner::new(&mut request, params).sign().unwrap();

        let query = request.uri().query().unwrap();
        assert!(query.contains("existing=param"), "{query}");
        for required in [
            "X-Amz-Algorithm=AWS4-HMAC-SHA256",
            "X-Amz-Credential=",
            "X-Amz-Date=20150830T123600Z",
            "X-Amz-SignedHeaders=host",
            "X-Amz-Security-Token=",
            "X-Amz-Signature=",
        ] {
            assert!(query.contains(required), "missing {required} in {query}");
        }

        // Mutual exclusion: the date and token are query parameters now.
        assert!(header_str(&request, "x-amz-date").is_none());
        assert!(header_str(&request, "x-amz-security-token").is_none());
        assert!(header_str(&request, "authorization").is_none());
    }

    #[test]
    fn header_signing_adds_no_query_parameters() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let params = params(&credentials, time, SigningSettings::default());

        let mut request = test_request();
        RequestSigner::new(&mut request, params).sign().unwrap();

        assert_eq!(Some("existing=param"), request.uri().query());
        assert!(header_str(&request, "x-amz-date").is_some());
    }

    #[test]
    fn unsigned_payload_sentinel_is_copied_verbatim_into_the_header() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XContentSha256;
        let params = params(&credentials, time, settings);

        let mut request = test_request();
        RequestSigner::new(&mut request, params)
            .payload_hash(UNSIGNED_PAYLOAD.as_bytes())
            .sign()
            .unwrap();

        assert_eq!(
            Some("UNSIGNED-PAYLOAD"),
            header_str(&request, "x-amz-content-sha256")
        );
    }

    #[test]
    fn custom_time_format_reaches_the_date_header() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let mut settings = SigningSettings::default();
        settings.canonical_time_format =
            Some("[year]-[month]-[day]T[hour]:[minute]:[second]Z".into());
        let params = params(&credentials, time, settings);

        let mut request = test_request();
        RequestSigner::new(&mut request, params).sign().unwrap();
        assert_eq!(
            Some("2015-08-30T12:36:00Z"),
            header_str(&request, "x-amz-date")
        );
    }

    #[test]
    fn missing_host_fails_signing() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let params = params(&credentials, time, SigningSettings::default());

        let mut request = HttpRequest::new();
        request.set_uri(Uri::from_static("/relative-only"));
        let err = RequestSigner::new(&mut request, params).sign().unwrap_err();
        assert!(format!("{err}").contains("host"));
    }

    #[test]
    fn host_override_wins_in_the_signed_host_header() {
        let credentials = Credentials::for_tests();
        let time = parse_date_time("20150830T123600Z");
        let params = params(&credentials, time, SigningSettings::default());

        let mut request = test_request();
        request.set_host_override("override.example.com");
        RequestSigner::new(&mut request, params).sign().unwrap();
        assert_eq!(Some("override.example.com"), header_str(&request, "host"));
    }
}
