/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Signing errors.

use http::header::InvalidHeaderValue;
use std::error::Error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

#[derive(Debug)]
enum SigningErrorKind {
    FailedToCreateCanonicalRequest { source: CanonicalRequestError },
    PayloadHashing { source: io::Error },
    InvalidTimeFormat { source: time::error::InvalidFormatDescription },
    FormattingTimestamp { source: time::error::Format },
    NoSignableHost,
}

/// Error signing a request.
#[derive(Debug)]
pub struct SigningError {
    kind: SigningErrorKind,
}

impl SigningError {
    pub(crate) fn payload_hashing(source: io::Error) -> Self {
        Self {
            kind: SigningErrorKind::PayloadHashing { source },
        }
    }

    pub(crate) fn invalid_time_format(source: time::error::InvalidFormatDescription) -> Self {
        Self {
            kind: SigningErrorKind::InvalidTimeFormat { source },
        }
    }

    pub(crate) fn time_formatting(source: time::error::Format) -> Self {
        Self {
            kind: SigningErrorKind::FormattingTimestamp { source },
        }
    }

    pub(crate) fn no_signable_host() -> Self {
        Self {
            kind: SigningErrorKind::NoSignableHost,
        }
    }

    /// True when the failure happened while hashing the payload, a distinct
    /// category so callers can keep hashing failures apart from signature
    /// derivation failures.
    pub fn is_payload_hashing(&self) -> bool {
        matches!(self.kind, SigningErrorKind::PayloadHashing { .. })
    }
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SigningErrorKind::*;
        match self.kind {
            FailedToCreateCanonicalRequest { .. } => {
                write!(f, "failed to create canonical request")
            }
            PayloadHashing { .. } => write!(f, "failed to hash the request payload"),
            InvalidTimeFormat { .. } => {
                write!(f, "the configured canonical time format is not a valid format description")
            }
            FormattingTimestamp { .. } => write!(f, "failed to format the signing timestamp"),
            NoSignableHost => write!(
                f,
                "the request has neither a host override nor a URI authority to sign"
            ),
        }
    }
}

impl Error for SigningError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use SigningErrorKind::*;
        match &self.kind {
            FailedToCreateCanonicalRequest { source } => Some(source),
            PayloadHashing { source } => Some(source),
            InvalidTimeFormat { source } => Some(source),
            FormattingTimestamp { source } => Some(source),
            NoSignableHost => None,
        }
    }
}

impl From<CanonicalRequestError> for SigningError {
    fn from(source: CanonicalRequestError) -> Self {
        Self {
            kind: SigningErrorKind::FailedToCreateCanonicalRequest { source },
        }
    }
}

#[derive(Debug)]
enum CanonicalRequestErrorKind {
    InvalidHeaderValue { source: InvalidHeaderValue },
    InvalidUtf8InHeaderValue { source: Utf8Error },
}

#[derive(Debug)]
pub(crate) struct CanonicalRequestError {
    kind: CanonicalRequestErrorKind,
}

impl CanonicalRequestError {
    pub(crate) fn invalid_utf8_in_header_value(source: Utf8Error) -> Self {
        Self {
            kind: CanonicalRequestErrorKind::InvalidUtf8InHeaderValue { source },
        }
    }
}

impl fmt::Display for CanonicalRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CanonicalRequestErrorKind::*;
        match self.kind {
            InvalidHeaderValue { .. } => write!(f, "invalid header value"),
            InvalidUtf8InHeaderValue { .. } => write!(f, "invalid UTF-8 in header value"),
        }
    }
}

impl Error for CanonicalRequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use CanonicalRequestErrorKind::*;
        match &self.kind {
            InvalidHeaderValue { source } => Some(source),
            InvalidUtf8InHeaderValue { source } => Some(source),
        }
    }
}

impl From<InvalidHeaderValue> for CanonicalRequestError {
    fn from(source: InvalidHeaderValue) -> Self {
        Self {
            kind: CanonicalRequestErrorKind::InvalidHeaderValue { source },
        }
    }
}
