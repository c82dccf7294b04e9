/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Canonical request and string-to-sign construction.
//!
//! The canonical request is a deterministic, bit-exact textual summary of the
//! request: method, canonical path, canonical query, the signed headers with
//! their canonical values, the signed-header name list, and the payload hash.
//! Its SHA-256 is the last line of the string-to-sign.

use crate::date_time::format_date;
use crate::error::CanonicalRequestError;
use crate::payload::PayloadHash;
use crate::settings::{PercentEncodingMode, SignedHeaderRules, SigningParams};
use crate::url_escape::{percent_encode, percent_encode_path};
use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;
use strata_http::request::HttpRequest;

pub(crate) mod header {
    pub(crate) const X_AMZ_CONTENT_SHA_256: &str = "x-amz-content-sha256";
    pub(crate) const X_AMZ_DATE: &str = "x-amz-date";
    pub(crate) const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
}

pub(crate) mod param {
    pub(crate) const X_AMZ_ALGORITHM: &str = "X-Amz-Algorithm";
    pub(crate) const X_AMZ_CREDENTIAL: &str = "X-Amz-Credential";
    pub(crate) const X_AMZ_DATE: &str = "X-Amz-Date";
    pub(crate) const X_AMZ_EXPIRES: &str = "X-Amz-Expires";
    pub(crate) const X_AMZ_SECURITY_TOKEN: &str = "X-Amz-Security-Token";
    pub(crate) const X_AMZ_SIGNED_HEADERS: &str = "X-Amz-SignedHeaders";
    pub(crate) const X_AMZ_SIGNATURE: &str = "X-Amz-Signature";
}

/// Query-signing values that participate in the canonical query string.
#[derive(Debug)]
pub(crate) struct QueryParamValues<'a> {
    pub(crate) algorithm: &'static str,
    pub(crate) credential: String,
    pub(crate) date_time: &'a str,
    pub(crate) expires: Option<String>,
    pub(crate) security_token: Option<&'a str>,
}

/// What rides alongside the signature: nothing extra for header signing, the
/// `X-Amz-*` parameter set for query signing.
#[derive(Debug)]
pub(crate) enum SignatureValues<'a> {
    Headers,
    QueryParams(QueryParamValues<'a>),
}

#[derive(Debug)]
pub(crate) struct CanonicalRequest<'a> {
    method: &'a http::Method,
    path: Cow<'a, str>,
    params: Option<String>,
    headers: Vec<(String, String)>,
    signed_headers: SignedHeaders,
    content_sha256: &'a str,
}

impl<'a> CanonicalRequest<'a> {
    /// Builds the canonical request for `req`.
    ///
    /// Only headers accepted by the settings' header rules participate; the
    /// required headers (`host`, `x-amz-date`, the security token, the payload
    /// hash header) must already be on the request when header signing, which
    /// is the signer's job before it calls this.
    pub(crate) fn from(
        req: &'a HttpRequest,
        payload_hash: &'a PayloadHash,
        params: &SigningParams<'_>,
        values: &SignatureValues<'a>,
    ) -> Result<CanonicalRequest<'a>, CanonicalRequestError> {
        let settings = &params.settings;

        let path = req.uri().path();
        let path = if path.is_empty() { "/" } else { path };
        let path = match settings.percent_encoding_mode {
            // The stored path is already URI encoded; double encoding re-escapes `%`.
            PercentEncodingMode::Double => Cow::Owned(percent_encode_path(path)),
            PercentEncodingMode::Single => Cow::Borrowed(path),
        };

        let (headers, signed_headers) = Self::headers(req, &settings.header_rules)?;
        let params_string = Self::params(req.uri().query(), &signed_headers, values);

        Ok(CanonicalRequest {
            method: req.method(),
            path,
            params: params_string,
            headers,
            signed_headers,
            content_sha256: payload_hash.as_str(),
        })
    }

    /// The signed-header name list, `;`-joined in canonical order.
    pub(crate) fn signed_headers(&self) -> &SignedHeaders {
        &self.signed_headers
    }

    fn headers(
        req: &HttpRequest,
        rules: &SignedHeaderRules,
    ) -> Result<(Vec<(String, String)>, SignedHeaders), CanonicalRequestError> {
        let mut canonical = Vec::with_capacity(req.headers().keys_len());
        for name in req.headers().keys() {
            // Header names are already lowercased by the header map.
            if !rules.is_signed(name.as_str()) {
                continue;
            }
            let mut values = Vec::new();
            for value in req.headers().get_all(name) {
                let text = std::str::from_utf8(value.as_bytes())
                    .map_err(CanonicalRequestError::invalid_utf8_in_header_value)?;
                values.push(trim_ascii_whitespace(text));
            }
            canonical.push((name.as_str().to_string(), values.join(",")));
        }
        canonical.sort_by(|a, b| a.0.cmp(&b.0));
        let signed_headers =
            SignedHeaders::new(canonical.iter().map(|(name, _)| name.as_str()));
        Ok((canonical, signed_headers))
    }

    fn params(
        query: Option<&str>,
        signed_headers: &SignedHeaders,
        values: &SignatureValues<'_>,
    ) -> Option<String> {
        let mut pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
            form_urlencoded::parse(query.unwrap_or_default().as_bytes()).collect();

        if let SignatureValues::QueryParams(values) = values {
            let mut add = |key: &'static str, value: &str| {
                pairs.push((Cow::Borrowed(key), Cow::Owned(value.to_string())))
            };
            add(param::X_AMZ_ALGORITHM, values.algorithm);
            add(param::X_AMZ_CREDENTIAL, &values.credential);
            add(param::X_AMZ_DATE, values.date_time);
            if let Some(expires) = &values.expires {
                add(param::X_AMZ_EXPIRES, expires);
            }
            add(param::X_AMZ_SIGNED_HEADERS, signed_headers.as_str());
            if let Some(token) = values.security_token {
                add(param::X_AMZ_SECURITY_TOKEN, token);
            }
        }

        if pairs.is_empty() {
            return None;
        }

        // Sort by param name, then by param value.
        pairs.sort();

        let mut out = String::new();
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&percent_encode(key));
            out.push('=');
            out.push_str(&percent_encode(value));
        }
        Some(out)
    }
}

impl fmt::Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.path)?;
        writeln!(f, "{}", self.params.as_deref().unwrap_or(""))?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}:{value}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.content_sha256)?;
        Ok(())
    }
}

fn trim_ascii_whitespace(text: &str) -> &str {
    // ASCII whitespace only; non-ASCII whitespace is left where it is, and
    // interior runs are preserved verbatim.
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// The `;`-joined, canonically ordered signed-header name list.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct SignedHeaders {
    formatted: String,
}

impl SignedHeaders {
    fn new<'n>(sorted_names: impl Iterator<Item = &'n str>) -> Self {
        let mut formatted = String::new();
        for name in sorted_names {
            if !formatted.is_empty() {
                formatted.push(';');
            }
            formatted.push_str(name);
        }
        SignedHeaders { formatted }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.formatted
    }
}

impl fmt::Display for SignedHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted)
    }
}

/// The `date/region/service/aws4_request` scope that binds a signature.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SigningScope<'a> {
    date: String,
    region: &'a str,
    name: &'a str,
}

impl<'a> SigningScope<'a> {
    pub(crate) fn new(time: SystemTime, region: &'a str, name: &'a str) -> Self {
        Self {
            date: format_date(time),
            region,
            name,
        }
    }
}

impl fmt::Display for SigningScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/aws4_request", self.date, self.region, self.name)
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct StringToSign<'a> {
    pub(crate) algorithm: &'static str,
    pub(crate) date_time: &'a str,
    pub(crate) scope: SigningScope<'a>,
    pub(crate) hashed_creq: &'a str,
}

impl fmt::Display for StringToSign<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}",
            self.algorithm, self.date_time, self.scope, self.hashed_creq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_time::test_parsers::parse_date_time;
    use crate::settings::SigningSettings;
    use crate::v4::sha256_hex_string;
    use http::{HeaderValue, Method, Uri};
    use pretty_assertions::assert_eq;
    use strata_auth::credentials::Credentials;

    fn test_params(settings: SigningSettings) -> SigningParams<'static> {
        // The canonical request doesn't read the credentials; a static
        // reference keeps the test params simple.
        static CREDENTIALS: std::sync::OnceLock<Credentials> = std::sync::OnceLock::new();
        let credentials = CREDENTIALS.get_or_init(Credentials::for_tests);
        SigningParams::builder()
            .credentials(credentials)
            .region("us-east-1")
            .name("service")
            .time(parse_date_time("20150830T123600Z"))
            .settings(settings)
            .build()
            .unwrap()
    }

    fn test_request(uri: &'static str) -> HttpRequest {
        let mut request = HttpRequest::new();
        request.set_method(Method::POST);
        request.set_uri(Uri::from_static(uri));
        request.headers_mut().insert(
            http::header::HOST,
            HeaderValue::from_static("service.region.amazonaws.com"),
        );
        request
            .headers_mut()
            .insert("x-amz-foo", HeaderValue::from_str("\t \tbar ").unwrap());
        request
    }

    #[test]
    fn canonical_request_with_signed_payload() {
        let request = test_request("https://service.region.amazonaws.com/path1/path%202?a=b");
        let payload_hash = PayloadHash::Digest(sha256_hex_string(b"{}"));
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();

        let expected = "POST\n\
                        /path1/path%25202\n\
                        a=b\n\
                        host:service.region.amazonaws.com\n\
                        x-amz-foo:bar\n\
                        \n\
                        host;x-amz-foo\n\
                        44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a";
        assert_eq!(expected, creq.to_string());
    }

    #[test]
    fn canonical_request_with_unsigned_payload_and_empty_path() {
        let request = test_request("https://service.region.amazonaws.com?a=b");
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();

        let text = creq.to_string();
        let mut lines = text.lines();
        lines.next();
        assert_eq!(Some("/"), lines.next());
        assert_eq!("host;x-amz-foo", creq.signed_headers().as_str());
        assert!(text.ends_with("UNSIGNED-PAYLOAD"));
    }

    #[test]
    fn single_encoding_keeps_the_stored_path() {
        let request = test_request("https://service.region.amazonaws.com/path1/path%202");
        let payload_hash = PayloadHash::Unsigned;
        let mut settings = SigningSettings::default();
        settings.percent_encoding_mode = PercentEncodingMode::Single;
        let params = test_params(settings);
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert_eq!(Some("/path1/path%202"), creq.to_string().lines().nth(1));
    }

    #[test]
    fn query_values_sort_and_spaces_encode_as_percent_20() {
        let request = test_request("https://service.region.amazonaws.com/?a=b&%20b=c");
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert_eq!(Some("%20b=c&a=b"), creq.to_string().lines().nth(2));
    }

    #[test]
    fn bare_query_key_serializes_with_an_equals_sign() {
        let request = test_request("https://service.region.amazonaws.com/?foo");
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert_eq!(Some("foo="), creq.to_string().lines().nth(2));
    }

    #[test]
    fn multi_value_headers_trim_and_join_with_commas() {
        let mut request = test_request("https://service.region.amazonaws.com/");
        request
            .headers_mut()
            .append("x-amz-foo", HeaderValue::from_str("\t \tbaz ").unwrap());
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert!(creq.to_string().contains("x-amz-foo:bar,baz\n"));
    }

    #[test]
    fn interior_whitespace_is_preserved_verbatim() {
        let mut request = HttpRequest::new();
        request.set_uri(Uri::from_static("https://service.region.amazonaws.com/"));
        request.headers_mut().insert(
            "x-amz-note",
            HeaderValue::from_str("  test  test   ").unwrap(),
        );
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert!(creq.to_string().contains("x-amz-note:test  test\n"));
    }

    #[test]
    fn unsigned_headers_are_excluded() {
        let mut request = test_request("https://service.region.amazonaws.com/");
        request
            .headers_mut()
            .insert("user-agent", HeaderValue::from_static("strata"));
        request
            .headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert_eq!("host;x-amz-foo", creq.signed_headers().as_str());
    }

    #[test]
    fn unreserved_query_characters_stay_literal() {
        let request = test_request(
            "https://service.region.amazonaws.com/?list-type=2&prefix=~objprefix&single&k=&unreserved=-_.~",
        );
        let payload_hash = PayloadHash::Unsigned;
        let params = test_params(SigningSettings::default());
        let creq =
            CanonicalRequest::from(&request, &payload_hash, &params, &SignatureValues::Headers)
                .unwrap();
        assert_eq!(
            Some("k=&list-type=2&prefix=~objprefix&single=&unreserved=-_.~"),
            creq.to_string().lines().nth(2)
        );
    }

    #[test]
    fn scope_and_string_to_sign_shape() {
        let time = parse_date_time("20150830T123600Z");
        let scope = SigningScope::new(time, "us-east-1", "iam");
        assert_eq!("20150830/us-east-1/iam/aws4_request", scope.to_string());

        let sts = StringToSign {
            algorithm: "AWS4-HMAC-SHA256",
            date_time: "20150830T123600Z",
            scope,
            hashed_creq: "816cd5b414d056048ba4f7c5386d6e0533120fb1fcfa93762cf0fc39e2cf19e0",
        };
        assert_eq!(
            "AWS4-HMAC-SHA256\n\
             20150830T123600Z\n\
             20150830/us-east-1/iam/aws4_request\n\
             816cd5b414d056048ba4f7c5386d6e0533120fb1fcfa93762cf0fc39e2cf19e0",
            sts.to_string()
        );
    }
}
