/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Utility for appending query parameters to a [`Uri`] without disturbing the
//! parameters already present.

use http::uri::PathAndQuery;
use http::Uri;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Builds an updated query string for a [`Uri`].
///
/// The writer holds the query string alone; the rest of the URI is carried
/// through untouched and reassembled on build. Parameters already on the URI
/// are kept as they were written, appended parameters are percent-encoded
/// here.
#[derive(Debug)]
pub struct QueryWriter {
    uri: Uri,
    query: String,
}

impl QueryWriter {
    /// Creates a `QueryWriter` seeded with the query already on `uri`.
    pub fn new(uri: &Uri) -> Self {
        QueryWriter {
            uri: uri.clone(),
            query: uri.query().unwrap_or_default().to_string(),
        }
    }

    /// Drops every parameter accumulated so far, the seeded ones included.
    pub fn clear_params(&mut self) {
        self.query.clear();
    }

    /// Appends `key=value`; both sides are percent-encoded here.
    pub fn insert(&mut self, key: &str, value: &str) {
        if !self.query.is_empty() {
            self.query.push('&');
        }
        self.query.push_str(&percent_encode(key));
        self.query.push('=');
        self.query.push_str(&percent_encode(value));
    }

    /// Returns just the built query string.
    pub fn build_query(self) -> String {
        self.query
    }

    /// Returns the full [`Uri`] with the query string updated.
    pub fn build_uri(self) -> Uri {
        let mut parts = self.uri.into_parts();
        let path = parts
            .path_and_query
            .as_ref()
            .map(PathAndQuery::path)
            .unwrap_or_default();
        let path_and_query = if self.query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", self.query)
        };
        parts.path_and_query = if path_and_query.is_empty() {
            None
        } else {
            Some(
                path_and_query
                    .parse()
                    .expect("the appended parameters were percent-encoded"),
            )
        };
        Uri::from_parts(parts).expect("only the query component changed")
    }
}
