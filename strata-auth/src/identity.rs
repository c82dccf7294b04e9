/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Identities and identity resolution.

use crate::credentials::Credentials;
use crate::scheme::AuthSchemeId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use strata_middleware::error::BoxError;
use strata_middleware::future::BoxFuture;
use strata_middleware::properties::PropertyBag;

/// An opaque bearer of auth material with an optional expiration.
///
/// The concrete data is scheme-specific ([`Credentials`] for SigV4, a bearer
/// token, [`AnonymousIdentity`] for unsigned calls) and stays behind a shared
/// reference owned by the resolver's cache; middleware only ever borrow it
/// for the remainder of the call.
#[derive(Clone)]
pub struct Identity {
    data: Arc<dyn Any + Send + Sync>,
    expiration: Option<SystemTime>,
}

impl Identity {
    /// Creates an identity from scheme-specific data.
    pub fn new(data: impl Any + Send + Sync, expiration: Option<SystemTime>) -> Self {
        Self {
            data: Arc::new(data),
            expiration,
        }
    }

    /// The identity data, if it is a `T`.
    pub fn data<T: Any + Send + Sync + 'static>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// When this identity expires, if it does.
    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("data", &"..")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl From<Credentials> for Identity {
    fn from(credentials: Credentials) -> Self {
        Identity::new(credentials, None)
    }
}

/// Resolves the identity to authenticate a call with.
///
/// Resolvers are shared across calls and may be invoked concurrently;
/// implementations are responsible for their own synchronization and caching.
pub trait ResolveIdentity: Send + Sync + fmt::Debug {
    /// Resolves an identity, consulting the per-scheme `identity_properties`.
    fn resolve_identity<'a>(
        &'a self,
        properties: &'a PropertyBag,
    ) -> BoxFuture<'a, Result<Identity, BoxError>>;
}

/// A shared, clonable [`ResolveIdentity`].
#[derive(Clone, Debug)]
pub struct SharedIdentityResolver(Arc<dyn ResolveIdentity>);

impl SharedIdentityResolver {
    /// Wraps `resolver` for shared use.
    pub fn new(resolver: impl ResolveIdentity + 'static) -> Self {
        Self(Arc::new(resolver))
    }
}

impl ResolveIdentity for SharedIdentityResolver {
    fn resolve_identity<'a>(
        &'a self,
        properties: &'a PropertyBag,
    ) -> BoxFuture<'a, Result<Identity, BoxError>> {
        self.0.resolve_identity(properties)
    }
}

/// The identity of an unauthenticated caller.
#[derive(Debug)]
pub struct AnonymousIdentity;

/// Resolves [`AnonymousIdentity`] unconditionally.
#[derive(Debug, Default)]
pub struct AnonymousIdentityResolver;

impl AnonymousIdentityResolver {
    /// Creates the resolver.
    pub fn new() -> Self {
        Self
    }
}

impl ResolveIdentity for AnonymousIdentityResolver {
    fn resolve_identity<'a>(
        &'a self,
        _properties: &'a PropertyBag,
    ) -> BoxFuture<'a, Result<Identity, BoxError>> {
        Box::pin(std::future::ready(Ok(Identity::new(
            AnonymousIdentity,
            None,
        ))))
    }
}

/// Resolves a fixed set of [`Credentials`].
///
/// Suitable for tests and simple clients; provider chains with refresh and
/// caching live outside this crate.
#[derive(Debug)]
pub struct StaticCredentialsResolver {
    credentials: Credentials,
}

impl StaticCredentialsResolver {
    /// Creates a resolver returning `credentials` for every call.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl ResolveIdentity for StaticCredentialsResolver {
    fn resolve_identity<'a>(
        &'a self,
        _properties: &'a PropertyBag,
    ) -> BoxFuture<'a, Result<Identity, BoxError>> {
        Box::pin(std::future::ready(Ok(self.credentials.clone().into())))
    }
}

/// The identity resolvers configured on a client, keyed by auth scheme.
#[derive(Clone, Debug, Default)]
pub struct IdentityResolvers {
    resolvers: Vec<(AuthSchemeId, SharedIdentityResolver)>,
}

impl IdentityResolvers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resolver` for `scheme_id`, replacing any previous registration.
    pub fn register(
        &mut self,
        scheme_id: AuthSchemeId,
        resolver: impl ResolveIdentity + 'static,
    ) -> &mut Self {
        self.resolvers
            .retain(|(existing, _)| *existing != scheme_id);
        self.resolvers
            .push((scheme_id, SharedIdentityResolver::new(resolver)));
        self
    }

    /// The resolver registered for `scheme_id`, if any.
    pub fn resolver_for(&self, scheme_id: &AuthSchemeId) -> Option<&SharedIdentityResolver> {
        self.resolvers
            .iter()
            .find(|(existing, _)| existing == scheme_id)
            .map(|(_, resolver)| resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_yields_credentials() {
        let resolver = StaticCredentialsResolver::new(Credentials::for_tests());
        let identity = resolver
            .resolve_identity(&PropertyBag::new())
            .await
            .unwrap();
        let creds: &Credentials = identity.data().unwrap();
        assert_eq!("ANOTREAL", creds.access_key_id());
    }

    #[tokio::test]
    async fn anonymous_resolver_yields_anonymous_identity() {
        let resolver = AnonymousIdentityResolver::new();
        let identity = resolver
            .resolve_identity(&PropertyBag::new())
            .await
            .unwrap();
        assert!(identity.data::<AnonymousIdentity>().is_some());
        assert!(identity.data::<Credentials>().is_none());
    }

    #[test]
    fn registry_replaces_on_reregistration() {
        let mut resolvers = IdentityResolvers::new();
        let scheme = AuthSchemeId::new("sigv4");
        resolvers.register(scheme.clone(), AnonymousIdentityResolver::new());
        resolvers.register(
            scheme.clone(),
            StaticCredentialsResolver::new(Credentials::for_tests()),
        );
        assert!(resolvers.resolver_for(&scheme).is_some());
        assert!(resolvers
            .resolver_for(&AuthSchemeId::new("bearer"))
            .is_none());
    }
}
