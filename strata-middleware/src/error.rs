/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors surfaced from the request pipeline.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// The category of a [`ClientError`].
///
/// Kinds are coarse by design: retry classification and caller branching happen
/// on the kind, while the original failure is preserved in the error source chain.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client or stack was assembled in a way that cannot be executed.
    InvalidConfiguration,
    /// No candidate auth scheme was supported by the configured registry.
    NoSupportedAuthScheme,
    /// The selected auth scheme's resolver produced no identity.
    NoResolvedIdentity,
    /// The identity resolver itself failed.
    IdentityResolver,
    /// The request payload could not be hashed for signing.
    PayloadHashing,
    /// Request signing failed after the payload hash was resolved.
    Signing,
    /// The operation input could not be serialized into a transport request.
    Serialization,
    /// The raw transport response could not be deserialized into operation output.
    Deserialization,
    /// The terminal transport handler failed to send the request.
    Transport,
    /// All configured retry attempts were exhausted.
    RetryExhausted,
    /// The per-call context was cancelled.
    Cancelled,
}

impl ErrorKind {
    fn description(&self) -> &'static str {
        match self {
            ErrorKind::InvalidConfiguration => "invalid client configuration",
            ErrorKind::NoSupportedAuthScheme => "no auth scheme candidate is supported",
            ErrorKind::NoResolvedIdentity => "no identity was resolved for the selected auth scheme",
            ErrorKind::IdentityResolver => "the identity resolver failed",
            ErrorKind::PayloadHashing => "failed to hash the request payload",
            ErrorKind::Signing => "failed to sign the request",
            ErrorKind::Serialization => "failed to serialize the operation input",
            ErrorKind::Deserialization => "failed to deserialize the transport response",
            ErrorKind::Transport => "the transport failed to send the request",
            ErrorKind::RetryExhausted => "retry attempts exhausted",
            ErrorKind::Cancelled => "the call was cancelled",
        }
    }
}

/// An error produced while driving a call through the stack.
#[derive(Debug)]
pub struct ClientError {
    kind: ErrorKind,
    message: Option<Cow<'static, str>>,
    source: Option<BoxError>,
}

impl ClientError {
    /// Creates an error of the given kind with no further detail.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates an error of the given kind with an explanatory message.
    pub fn with_message(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Creates an error of the given kind wrapping an underlying failure.
    pub fn with_source(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Attaches an explanatory message to this error.
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Shorthand for a [`ErrorKind::Cancelled`] error.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Shorthand for a [`ErrorKind::Transport`] error wrapping `source`.
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::Transport, source)
    }

    /// Shorthand for a [`ErrorKind::Serialization`] error wrapping `source`.
    pub fn serialization(source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::Serialization, source)
    }

    /// Shorthand for a [`ErrorKind::Deserialization`] error wrapping `source`.
    pub fn deserialization(source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::Deserialization, source)
    }

    /// Shorthand for an [`ErrorKind::InvalidConfiguration`] error with a message.
    pub fn invalid_configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorKind::InvalidConfiguration, message)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.description())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}
