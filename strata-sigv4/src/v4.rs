/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Signature derivation.
//!
//! The canonicalization pipeline is identical for symmetric and asymmetric
//! SigV4 up to the final step; the [`SignatureFinalizer`] capability is that
//! final step. The symmetric finalizer here derives an HMAC chain over
//! `secret | date | region | service | "aws4_request"`; an elliptic-curve
//! variant plugs in behind the same trait.

use crate::date_time::format_date;
use crate::error::SigningError;
use hmac::{digest::FixedOutput, Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::SystemTime;
use strata_auth::credentials::Credentials;

/// `HashedPayload = Lowercase(HexEncode(Hash(requestPayload)))`
pub(crate) fn sha256_hex_string(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize_fixed())
}

/// Calculates a SigV4 signature from a derived key and a string-to-sign.
pub fn calculate_signature(signing_key: impl AsRef<[u8]>, string_to_sign: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_key.as_ref())
        .expect("HMAC can take key of any size");
    mac.update(string_to_sign);
    hex::encode(mac.finalize_fixed())
}

/// Generates the SigV4 signing key.
pub fn generate_signing_key(
    secret: &str,
    time: SystemTime,
    region: &str,
    service: &str,
) -> impl AsRef<[u8]> {
    // kSecret = your secret access key
    // kDate = HMAC("AWS4" + kSecret, Date)
    // kRegion = HMAC(kDate, Region)
    // kService = HMAC(kRegion, Service)
    // kSigning = HMAC(kService, "aws4_request")

    let secret = format!("AWS4{}", secret);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_ref()).expect("HMAC can take key of any size");
    mac.update(format_date(time).as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take key of any size");
    mac.update(region.as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take key of any size");
    mac.update(service.as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take key of any size");
    mac.update("aws4_request".as_bytes());
    mac.finalize_fixed()
}

/// Maps a string-to-sign to a hex signature under scheme-specific key material.
pub trait SignatureFinalizer: Send + Sync + fmt::Debug {
    /// The algorithm label emitted in the string-to-sign and the
    /// `authorization` header, e.g. `AWS4-HMAC-SHA256`.
    fn algorithm(&self) -> &'static str;

    /// Produces the hex signature for `string_to_sign`.
    fn finalize(
        &self,
        string_to_sign: &[u8],
        credentials: &Credentials,
        time: SystemTime,
        region: &str,
        name: &str,
    ) -> Result<String, SigningError>;
}

/// The symmetric (HMAC-SHA256) SigV4 finalizer.
#[derive(Debug, Clone, Default)]
pub struct SigV4Finalizer;

impl SigV4Finalizer {
    /// Creates the finalizer.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureFinalizer for SigV4Finalizer {
    fn algorithm(&self) -> &'static str {
        "AWS4-HMAC-SHA256"
    }

    fn finalize(
        &self,
        string_to_sign: &[u8],
        credentials: &Credentials,
        time: SystemTime,
        region: &str,
        name: &str,
    ) -> Result<String, SigningError> {
        let signing_key =
            generate_signing_key(credentials.secret_access_key(), time, region, name);
        Ok(calculate_signature(signing_key, string_to_sign))
    }
}
