/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Percent-encoding with the RFC 3986 "unreserved" allowlist SigV4 requires.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except unreserved characters is escaped, `/` included.
const BASE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Like [`BASE_SET`], but `/` stays literal for path encoding.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub(crate) fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, BASE_SET).to_string()
}

pub(crate) fn percent_encode_path(value: &str) -> String {
    utf8_percent_encode(value, PATH_SET).to_string()
}
