/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials for signature-based auth schemes.

use std::fmt;
use std::sync::Arc;

/// An immutable access key triple.
///
/// Credentials are cheap to clone and safe to share across calls; the session
/// token, when present, is copied into the request by the signer as the
/// `X-Amz-Security-Token` header or query parameter.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(Arc<Inner>);

#[derive(PartialEq, Eq)]
struct Inner {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Creates credentials from the key triple.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self(Arc::new(Inner {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }))
    }

    /// The access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.0.access_key_id
    }

    /// The secret access key.
    pub fn secret_access_key(&self) -> &str {
        &self.0.secret_access_key
    }

    /// The session token, if these are temporary credentials.
    pub fn session_token(&self) -> Option<&str> {
        self.0.session_token.as_deref()
    }

    /// Fixed credentials for unit tests, so expected signatures stay stable
    /// across environments.
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_tests() -> Self {
        Self::new("ANOTREAL", "notrealrnrELgWzOk3IfjzDKtFBhDby", None)
    }

    /// Like [`for_tests`](Credentials::for_tests), with a session token.
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_tests_with_session_token() -> Self {
        Self::new(
            "ANOTREAL",
            "notrealrnrELgWzOk3IfjzDKtFBhDby",
            Some("notarealsessiontoken".to_string()),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret never appears in logs.
        f.debug_struct("Credentials")
            .field("access_key_id", &self.0.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.0.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::for_tests_with_session_token();
        let debug = format!("{creds:?}");
        assert!(debug.contains("ANOTREAL"));
        assert!(!debug.contains(creds.secret_access_key()));
        assert!(!debug.contains("notarealsessiontoken"));
    }
}
