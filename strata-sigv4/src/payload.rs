/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Payload hash resolution.
//!
//! Resolution order: an explicit caller-provided hash wins; otherwise a
//! seekable body is streamed through SHA-256 with its position restored
//! afterwards (unless implicit hashing is disabled); otherwise the
//! `UNSIGNED-PAYLOAD` sentinel stands in, unless that too is disabled, in
//! which case the hash field is omitted.

use crate::error::SigningError;
use crate::settings::SigningSettings;
use crate::v4::sha256_hex_string;
use sha2::{Digest, Sha256};
use std::io::SeekFrom;
use strata_http::body::Body;

/// The literal sentinel that stands in for the digest of an unsigned payload.
///
/// Never hex-encoded: it is emitted verbatim in the canonical request and in
/// the `x-amz-content-sha256` header.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// A resolved payload hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHash {
    /// A lowercase hex SHA-256 digest of the payload.
    Digest(String),
    /// The payload is deliberately unsigned; the sentinel is emitted verbatim.
    Unsigned,
    /// No hash at all; the canonical hash field is the empty string.
    Omitted,
}

impl PayloadHash {
    /// The exact text emitted in the canonical request's payload field.
    pub fn as_str(&self) -> &str {
        match self {
            PayloadHash::Digest(digest) => digest,
            PayloadHash::Unsigned => UNSIGNED_PAYLOAD,
            PayloadHash::Omitted => "",
        }
    }
}

/// Resolves the payload hash for `body` under `settings`.
///
/// `explicit` is the caller-provided hash: the sentinel bytes pass through
/// verbatim, anything else is hex-encoded. A seek failure while hashing is
/// fatal and distinct from signature derivation failures.
pub fn resolve_payload_hash(
    explicit: Option<&[u8]>,
    body: &mut Body,
    settings: &SigningSettings,
) -> Result<PayloadHash, SigningError> {
    if let Some(bytes) = explicit {
        if bytes == UNSIGNED_PAYLOAD.as_bytes() {
            return Ok(PayloadHash::Unsigned);
        }
        return Ok(PayloadHash::Digest(hex::encode(bytes)));
    }

    if !settings.disable_implicit_payload_hashing {
        if let Some(bytes) = body.bytes() {
            return Ok(PayloadHash::Digest(sha256_hex_string(bytes)));
        }
        if let Some(source) = body.as_seekable() {
            let start = source
                .stream_position()
                .map_err(SigningError::payload_hashing)?;
            let mut hasher = Sha256::new();
            let mut chunk = [0u8; 4096];
            loop {
                let read = source.read(&mut chunk).map_err(SigningError::payload_hashing)?;
                if read == 0 {
                    break;
                }
                hasher.update(&chunk[..read]);
            }
            source
                .seek(SeekFrom::Start(start))
                .map_err(SigningError::payload_hashing)?;
            return Ok(PayloadHash::Digest(hex::encode(hasher.finalize())));
        }
    }

    if settings.disable_unsigned_payload_sentinel {
        Ok(PayloadHash::Omitted)
    } else {
        Ok(PayloadHash::Unsigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fmt;
    use std::io::{self, Seek};

    const FOO_SHA256: &str = "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae";

    #[test]
    fn explicit_hash_wins() {
        let mut body = Body::from_bytes("ignored");
        let hash = resolve_payload_hash(
            Some(&[0x00, 0x01, 0x02, 0x03]),
            &mut body,
            &SigningSettings::default(),
        )
        .unwrap();
        assert_eq!(PayloadHash::Digest("00010203".to_string()), hash);
    }

    #[test]
    fn explicit_sentinel_is_never_hex_encoded() {
        let mut body = Body::from_bytes("ignored");
        let hash = resolve_payload_hash(
            Some(UNSIGNED_PAYLOAD.as_bytes()),
            &mut body,
            &SigningSettings::default(),
        )
        .unwrap();
        assert_eq!(PayloadHash::Unsigned, hash);
        assert_eq!("UNSIGNED-PAYLOAD", hash.as_str());
    }

    #[test]
    fn seekable_body_is_hashed_with_position_restored() {
        let mut body = Body::from_seekable(io::Cursor::new(b"foo".to_vec()));
        let hash =
            resolve_payload_hash(None, &mut body, &SigningSettings::default()).unwrap();
        assert_eq!(PayloadHash::Digest(FOO_SHA256.to_string()), hash);
        assert_eq!(0, body.as_seekable().unwrap().stream_position().unwrap());
    }

    #[test]
    fn hashing_starts_from_the_current_position() {
        let mut body = Body::from_seekable(io::Cursor::new(b"XXfoo".to_vec()));
        body.as_seekable()
            .unwrap()
            .seek(SeekFrom::Start(2))
            .unwrap();
        let hash =
            resolve_payload_hash(None, &mut body, &SigningSettings::default()).unwrap();
        assert_eq!(PayloadHash::Digest(FOO_SHA256.to_string()), hash);
        assert_eq!(2, body.as_seekable().unwrap().stream_position().unwrap());
    }

    #[test]
    fn disabled_implicit_hashing_falls_back_to_the_sentinel() {
        let mut settings = SigningSettings::default();
        settings.disable_implicit_payload_hashing = true;
        let mut body = Body::from_bytes("foo");
        let hash = resolve_payload_hash(None, &mut body, &settings).unwrap();
        assert_eq!(PayloadHash::Unsigned, hash);
    }

    #[test]
    fn disabled_sentinel_omits_the_hash() {
        let mut settings = SigningSettings::default();
        settings.disable_implicit_payload_hashing = true;
        settings.disable_unsigned_payload_sentinel = true;
        let mut body = Body::from_bytes("foo");
        let hash = resolve_payload_hash(None, &mut body, &settings).unwrap();
        assert_eq!(PayloadHash::Omitted, hash);
        assert_eq!("", hash.as_str());
    }

    #[test]
    fn streaming_body_uses_the_sentinel() {
        let mut body = Body::from_streaming(io::Cursor::new(b"stream".to_vec()));
        let hash =
            resolve_payload_hash(None, &mut body, &SigningSettings::default()).unwrap();
        assert_eq!(PayloadHash::Unsigned, hash);
    }

    /// A source whose seeks always fail.
    struct BrokenSeek;

    impl fmt::Debug for BrokenSeek {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("BrokenSeek")
        }
    }

    impl io::Read for BrokenSeek {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl io::Seek for BrokenSeek {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Other, "seek is broken"))
        }
    }

    #[test]
    fn seek_failure_is_a_payload_hashing_error() {
        let mut body = Body::from_seekable(BrokenSeek);
        let err =
            resolve_payload_hash(None, &mut body, &SigningSettings::default()).unwrap_err();
        assert!(err.is_payload_hashing());
    }
}
