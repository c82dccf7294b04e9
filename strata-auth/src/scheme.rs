/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Auth schemes and auth scheme option resolution.

use crate::identity::{Identity, IdentityResolvers, SharedIdentityResolver};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strata_http::request::HttpRequest;
use strata_middleware::error::{BoxError, ClientError};
use strata_middleware::properties::PropertyBag;

/// New type around an auth scheme ID.
///
/// Each auth scheme has a unique string identifier used to refer to it from
/// option resolvers and to select an identity resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthSchemeId {
    scheme_id: Cow<'static, str>,
}

impl AuthSchemeId {
    /// Creates a new auth scheme ID.
    pub const fn new(scheme_id: &'static str) -> Self {
        Self {
            scheme_id: Cow::Borrowed(scheme_id),
        }
    }

    /// The string form of this scheme ID.
    pub fn inner(&self) -> &str {
        &self.scheme_id
    }
}

impl From<&'static str> for AuthSchemeId {
    fn from(scheme_id: &'static str) -> Self {
        Self::new(scheme_id)
    }
}

/// The scheme ID for unauthenticated calls.
pub const ANONYMOUS: AuthSchemeId = AuthSchemeId::new("anonymous");

/// The signing name a scheme should sign for, carried in signer properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningName(Cow<'static, str>);

impl SigningName {
    /// Creates a signing name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The region a scheme should sign for, carried in signer properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRegion(Cow<'static, str>);

impl SigningRegion {
    /// Creates a signing region.
    pub fn new(region: impl Into<Cow<'static, str>>) -> Self {
        Self(region.into())
    }

    /// The region as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Signer property directing the scheme to skip payload hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsignedPayload(bool);

impl UnsignedPayload {
    /// Creates the flag.
    pub fn new(unsigned: bool) -> Self {
        Self(unsigned)
    }

    /// True when the payload must not be hashed.
    pub fn is_unsigned(&self) -> bool {
        self.0
    }
}

/// One auth scheme candidate for a call.
///
/// Property bags are frozen at build time and shared, so options clone
/// cheaply out of static resolvers.
#[derive(Clone, Debug)]
pub struct AuthOption {
    scheme_id: AuthSchemeId,
    signer_properties: Arc<PropertyBag>,
    identity_properties: Arc<PropertyBag>,
}

impl AuthOption {
    /// Starts building an option for `scheme_id`.
    pub fn builder(scheme_id: AuthSchemeId) -> AuthOptionBuilder {
        AuthOptionBuilder {
            scheme_id,
            signer_properties: PropertyBag::new(),
            identity_properties: PropertyBag::new(),
        }
    }

    /// An option with no properties at all.
    pub fn empty(scheme_id: AuthSchemeId) -> Self {
        Self::builder(scheme_id).build()
    }

    /// The candidate scheme's ID.
    pub fn scheme_id(&self) -> &AuthSchemeId {
        &self.scheme_id
    }

    /// Properties for the scheme's signer (signing name, region, payload policy).
    pub fn signer_properties(&self) -> &PropertyBag {
        &self.signer_properties
    }

    /// Properties for the scheme's identity resolver.
    pub fn identity_properties(&self) -> &PropertyBag {
        &self.identity_properties
    }
}

/// Builder for [`AuthOption`].
#[derive(Debug)]
pub struct AuthOptionBuilder {
    scheme_id: AuthSchemeId,
    signer_properties: PropertyBag,
    identity_properties: PropertyBag,
}

impl AuthOptionBuilder {
    /// Adds a signer property.
    pub fn signer_property<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.signer_properties.insert(value);
        self
    }

    /// Adds an identity property.
    pub fn identity_property<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.identity_properties.insert(value);
        self
    }

    /// Freezes the properties and builds the option.
    pub fn build(self) -> AuthOption {
        AuthOption {
            scheme_id: self.scheme_id,
            signer_properties: Arc::new(self.signer_properties),
            identity_properties: Arc::new(self.identity_properties),
        }
    }
}

/// Resolves the ordered auth scheme candidates for an operation.
pub trait ResolveAuthSchemeOptions: Send + Sync + fmt::Debug {
    /// Returns candidates in preference order for `operation`.
    fn resolve_auth_scheme_options(&self, operation: &str) -> Result<Vec<AuthOption>, BoxError>;
}

/// A shared, clonable [`ResolveAuthSchemeOptions`].
#[derive(Clone, Debug)]
pub struct SharedAuthSchemeOptionResolver(Arc<dyn ResolveAuthSchemeOptions>);

impl SharedAuthSchemeOptionResolver {
    /// Wraps `resolver` for shared use.
    pub fn new(resolver: impl ResolveAuthSchemeOptions + 'static) -> Self {
        Self(Arc::new(resolver))
    }
}

impl ResolveAuthSchemeOptions for SharedAuthSchemeOptionResolver {
    fn resolve_auth_scheme_options(&self, operation: &str) -> Result<Vec<AuthOption>, BoxError> {
        self.0.resolve_auth_scheme_options(operation)
    }
}

/// A static option resolver: per-operation overrides consulted first, then a
/// service-wide default list.
#[derive(Debug, Default)]
pub struct StaticAuthSchemeOptionResolver {
    service_defaults: Vec<AuthOption>,
    operation_overrides: HashMap<String, Vec<AuthOption>>,
}

impl StaticAuthSchemeOptionResolver {
    /// Creates a resolver from the service-wide default candidates.
    pub fn new(service_defaults: Vec<AuthOption>) -> Self {
        Self {
            service_defaults,
            operation_overrides: HashMap::new(),
        }
    }

    /// Overrides the candidates for one operation.
    pub fn with_operation_override(
        mut self,
        operation: impl Into<String>,
        options: Vec<AuthOption>,
    ) -> Self {
        self.operation_overrides.insert(operation.into(), options);
        self
    }
}

impl ResolveAuthSchemeOptions for StaticAuthSchemeOptionResolver {
    fn resolve_auth_scheme_options(&self, operation: &str) -> Result<Vec<AuthOption>, BoxError> {
        Ok(self
            .operation_overrides
            .get(operation)
            .unwrap_or(&self.service_defaults)
            .clone())
    }
}

/// Signs the in-flight request under a scheme's rules.
pub trait SignRequest: Send + Sync + fmt::Debug {
    /// Signs `request` with `identity`, consulting the selected option's
    /// signer properties.
    fn sign_request(
        &self,
        request: &mut HttpRequest,
        identity: &Identity,
        signer_properties: &PropertyBag,
    ) -> Result<(), ClientError>;
}

/// An auth scheme: a scheme ID, a way to find its identity resolver, and a signer.
pub trait AuthScheme: Send + Sync + fmt::Debug {
    /// The unique identifier of this scheme.
    fn scheme_id(&self) -> AuthSchemeId;

    /// Chooses this scheme's identity resolver from the client's registry.
    fn identity_resolver(&self, resolvers: &IdentityResolvers) -> Option<SharedIdentityResolver> {
        resolvers.resolver_for(&self.scheme_id()).cloned()
    }

    /// This scheme's signing implementation.
    fn signer(&self) -> &dyn SignRequest;
}

/// A shared, clonable [`AuthScheme`].
#[derive(Clone, Debug)]
pub struct SharedAuthScheme(Arc<dyn AuthScheme>);

impl SharedAuthScheme {
    /// Wraps `scheme` for shared use.
    pub fn new(scheme: impl AuthScheme + 'static) -> Self {
        Self(Arc::new(scheme))
    }
}

impl AuthScheme for SharedAuthScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        self.0.scheme_id()
    }

    fn identity_resolver(&self, resolvers: &IdentityResolvers) -> Option<SharedIdentityResolver> {
        self.0.identity_resolver(resolvers)
    }

    fn signer(&self) -> &dyn SignRequest {
        self.0.signer()
    }
}

/// The auth schemes a client supports.
#[derive(Clone, Debug, Default)]
pub struct AuthSchemeRegistry {
    schemes: Vec<SharedAuthScheme>,
}

impl AuthSchemeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scheme`, replacing a previous scheme with the same ID.
    pub fn register(&mut self, scheme: impl AuthScheme + 'static) -> &mut Self {
        let scheme = SharedAuthScheme::new(scheme);
        self.schemes
            .retain(|existing| existing.scheme_id() != scheme.scheme_id());
        self.schemes.push(scheme);
        self
    }

    /// The scheme registered under `scheme_id`, if any.
    pub fn scheme_for(&self, scheme_id: &AuthSchemeId) -> Option<&SharedAuthScheme> {
        self.schemes
            .iter()
            .find(|scheme| scheme.scheme_id() == *scheme_id)
    }
}

/// The built-in scheme for unauthenticated calls: its signer does nothing.
#[derive(Debug, Default)]
pub struct AnonymousAuthScheme {
    signer: AnonymousSigner,
}

impl AnonymousAuthScheme {
    /// Creates the anonymous scheme.
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct AnonymousSigner;

impl SignRequest for AnonymousSigner {
    fn sign_request(
        &self,
        _request: &mut HttpRequest,
        _identity: &Identity,
        _signer_properties: &PropertyBag,
    ) -> Result<(), ClientError> {
        Ok(())
    }
}

impl AuthScheme for AnonymousAuthScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        ANONYMOUS
    }

    fn signer(&self) -> &dyn SignRequest {
        &self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver_prefers_operation_overrides() {
        let resolver = StaticAuthSchemeOptionResolver::new(vec![AuthOption::empty(
            AuthSchemeId::new("sigv4"),
        )])
        .with_operation_override("GetThing", vec![AuthOption::empty(ANONYMOUS)]);

        let defaults = resolver.resolve_auth_scheme_options("PutThing").unwrap();
        assert_eq!(1, defaults.len());
        assert_eq!("sigv4", defaults[0].scheme_id().inner());

        let overridden = resolver.resolve_auth_scheme_options("GetThing").unwrap();
        assert_eq!("anonymous", overridden[0].scheme_id().inner());
    }

    #[test]
    fn auth_option_properties_are_shared_across_clones() {
        let option = AuthOption::builder(AuthSchemeId::new("sigv4"))
            .signer_property(SigningName::new("polly"))
            .signer_property(SigningRegion::new("us-east-1"))
            .build();
        let clone = option.clone();
        assert_eq!(
            Some("polly"),
            clone
                .signer_properties()
                .get::<SigningName>()
                .map(SigningName::as_str)
        );
        assert_eq!(
            Some("us-east-1"),
            clone
                .signer_properties()
                .get::<SigningRegion>()
                .map(SigningRegion::as_str)
        );
    }

    #[test]
    fn registry_finds_schemes_by_id() {
        let mut registry = AuthSchemeRegistry::new();
        registry.register(AnonymousAuthScheme::new());
        assert!(registry.scheme_for(&ANONYMOUS).is_some());
        assert!(registry.scheme_for(&AuthSchemeId::new("sigv4")).is_none());
    }
}
