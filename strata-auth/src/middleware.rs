/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The Finalize-step auth middleware.
//!
//! `ResolveAuthScheme` → `GetIdentity` → `Signing`, registered in that order
//! after endpoint resolution and before the transport. Resolution results ride
//! the per-call context in framework-owned property slots so later middleware
//! (and retries re-entering the chain) can read them.

use crate::identity::{Identity, IdentityResolvers, ResolveIdentity};
use crate::scheme::{
    AuthScheme, AuthSchemeRegistry, AuthOption, ResolveAuthSchemeOptions, SharedAuthScheme,
    SharedAuthSchemeOptionResolver,
};
use crate::ids;
use std::borrow::Cow;
use strata_http::request::HttpRequest;
use strata_middleware::context::Context;
use strata_middleware::error::{ClientError, ErrorKind};
use strata_middleware::future::BoxFuture;
use strata_middleware::middleware::{Middleware, Next};
use strata_middleware::stack::{FinalizeInput, FinalizeOutput};
use strata_middleware::value::DynValue;

/// Framework-owned context slot: the auth scheme selected for this call.
#[derive(Clone, Debug)]
pub struct SelectedAuthScheme {
    option: AuthOption,
    scheme: SharedAuthScheme,
}

impl SelectedAuthScheme {
    /// The selected candidate, with its signer and identity properties.
    pub fn option(&self) -> &AuthOption {
        &self.option
    }

    /// The scheme implementation backing the candidate.
    pub fn scheme(&self) -> &SharedAuthScheme {
        &self.scheme
    }
}

/// Framework-owned context slot: the identity resolved for this call.
#[derive(Clone, Debug)]
pub struct ResolvedIdentity(Identity);

impl ResolvedIdentity {
    /// The resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Finalize-step middleware that selects the auth scheme for the call.
///
/// Walks the resolver's candidates in order and selects the first whose scheme
/// ID is present in the client's registry. No supported candidate is fatal.
#[derive(Debug)]
pub struct ResolveAuthScheme {
    resolver: SharedAuthSchemeOptionResolver,
    registry: AuthSchemeRegistry,
    operation: Cow<'static, str>,
}

impl ResolveAuthScheme {
    /// Creates the middleware for `operation`.
    pub fn new(
        operation: impl Into<Cow<'static, str>>,
        resolver: SharedAuthSchemeOptionResolver,
        registry: AuthSchemeRegistry,
    ) -> Self {
        Self {
            resolver,
            registry,
            operation: operation.into(),
        }
    }
}

impl Middleware<FinalizeInput, FinalizeOutput> for ResolveAuthScheme {
    fn id(&self) -> &str {
        ids::RESOLVE_AUTH_SCHEME
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
        next: Next<'a, FinalizeInput, FinalizeOutput>,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            let options = self
                .resolver
                .resolve_auth_scheme_options(&self.operation)
                .map_err(|err| {
                    ClientError::with_source(ErrorKind::InvalidConfiguration, err)
                        .message("auth scheme option resolution failed")
                })?;

            let mut candidates = Vec::with_capacity(options.len());
            for option in options {
                match self.registry.scheme_for(option.scheme_id()) {
                    Some(scheme) => {
                        tracing::debug!(scheme = option.scheme_id().inner(), "selected auth scheme");
                        ctx.properties_mut().insert(SelectedAuthScheme {
                            option,
                            scheme: scheme.clone(),
                        });
                        return next.handle(ctx, input).await;
                    }
                    None => candidates.push(option.scheme_id().inner().to_string()),
                }
            }

            Err(ClientError::with_message(
                ErrorKind::NoSupportedAuthScheme,
                format!(
                    "no configured auth scheme supports any candidate ({})",
                    candidates.join(", ")
                ),
            ))
        })
    }
}

/// Finalize-step middleware that obtains the identity for the selected scheme.
#[derive(Debug)]
pub struct GetIdentity {
    resolvers: IdentityResolvers,
}

impl GetIdentity {
    /// Creates the middleware over the client's identity resolvers.
    pub fn new(resolvers: IdentityResolvers) -> Self {
        Self { resolvers }
    }
}

impl Middleware<FinalizeInput, FinalizeOutput> for GetIdentity {
    fn id(&self) -> &str {
        ids::GET_IDENTITY
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
        next: Next<'a, FinalizeInput, FinalizeOutput>,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            let selected = ctx
                .properties()
                .get::<SelectedAuthScheme>()
                .cloned()
                .ok_or_else(|| {
                    ClientError::invalid_configuration(
                        "GetIdentity requires ResolveAuthScheme to run earlier in Finalize",
                    )
                })?;

            let resolver = selected
                .scheme()
                .identity_resolver(&self.resolvers)
                .ok_or_else(|| {
                    ClientError::invalid_configuration(format!(
                        "no identity resolver registered for auth scheme `{}`",
                        selected.option().scheme_id().inner()
                    ))
                })?;

            let identity = resolver
                .resolve_identity(selected.option().identity_properties())
                .await
                .map_err(|err| ClientError::with_source(ErrorKind::IdentityResolver, err))?;

            ctx.properties_mut().insert(ResolvedIdentity(identity));
            next.handle(ctx, input).await
        })
    }
}

/// Finalize-step middleware that signs the in-flight request.
///
/// Dispatches to the selected scheme's [`SignRequest`](crate::scheme::SignRequest)
/// implementation; whether to skip signing (anonymous scheme, credential-less
/// identity) is that implementation's decision.
#[derive(Debug, Default)]
pub struct Signing;

impl Signing {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware<FinalizeInput, FinalizeOutput> for Signing {
    fn id(&self) -> &str {
        ids::SIGNING
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
        next: Next<'a, FinalizeInput, FinalizeOutput>,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            let selected = ctx
                .properties()
                .get::<SelectedAuthScheme>()
                .cloned()
                .ok_or_else(|| {
                    ClientError::invalid_configuration(
                        "Signing requires ResolveAuthScheme to run earlier in Finalize",
                    )
                })?;
            let identity = ctx
                .properties()
                .get::<ResolvedIdentity>()
                .cloned()
                .ok_or_else(|| ClientError::new(ErrorKind::NoResolvedIdentity))?;

            let mut request = HttpRequest::from_dyn(input.request)?;
            selected.scheme().signer().sign_request(
                &mut request,
                identity.identity(),
                selected.option().signer_properties(),
            )?;

            next.handle(
                ctx,
                FinalizeInput {
                    request: DynValue::new(request),
                },
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::identity::StaticCredentialsResolver;
    use crate::scheme::{
        AnonymousAuthScheme, AuthSchemeId, SignRequest, StaticAuthSchemeOptionResolver, ANONYMOUS,
    };
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use strata_middleware::middleware::Handler;
    use strata_middleware::order::RelativePosition;
    use strata_middleware::properties::PropertyBag;
    use strata_middleware::stack::{DeserializeInput, DeserializeOutput, Stack};

    #[derive(Debug)]
    struct EchoTransport;

    impl Handler<DeserializeInput, DeserializeOutput> for EchoTransport {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut Context,
            input: DeserializeInput,
        ) -> BoxFuture<'a, Result<DeserializeOutput, ClientError>> {
            Box::pin(async move {
                Ok(DeserializeOutput {
                    raw_response: None,
                    result: Some(input.request),
                })
            })
        }
    }

    /// Stamps a marker header so tests can observe that signing ran.
    #[derive(Debug)]
    struct MarkerScheme;

    #[derive(Debug)]
    struct MarkerSigner;

    impl SignRequest for MarkerSigner {
        fn sign_request(
            &self,
            request: &mut HttpRequest,
            identity: &Identity,
            _signer_properties: &PropertyBag,
        ) -> Result<(), ClientError> {
            let creds: &Credentials = identity
                .data()
                .ok_or_else(|| ClientError::new(ErrorKind::NoResolvedIdentity))?;
            request.headers_mut().insert(
                "x-marker-key",
                HeaderValue::from_str(creds.access_key_id()).unwrap(),
            );
            Ok(())
        }
    }

    impl AuthScheme for MarkerScheme {
        fn scheme_id(&self) -> AuthSchemeId {
            AuthSchemeId::new("marker")
        }

        fn signer(&self) -> &dyn SignRequest {
            &MarkerSigner
        }
    }

    fn auth_stack(
        candidates: Vec<AuthOption>,
        registry: AuthSchemeRegistry,
        resolvers: IdentityResolvers,
    ) -> Stack {
        let mut stack = Stack::new("auth-test", || DynValue::new(HttpRequest::new()));
        stack
            .finalize_mut()
            .add(
                ResolveAuthScheme::new(
                    "TestOperation",
                    SharedAuthSchemeOptionResolver::new(StaticAuthSchemeOptionResolver::new(
                        candidates,
                    )),
                    registry,
                ),
                RelativePosition::After,
            )
            .unwrap();
        stack
            .finalize_mut()
            .insert(
                GetIdentity::new(resolvers),
                ids::RESOLVE_AUTH_SCHEME,
                RelativePosition::After,
            )
            .unwrap();
        stack
            .finalize_mut()
            .insert(Signing::new(), ids::GET_IDENTITY, RelativePosition::After)
            .unwrap();
        stack
    }

    #[tokio::test]
    async fn first_supported_candidate_wins() {
        let mut registry = AuthSchemeRegistry::new();
        registry.register(MarkerScheme);
        let mut resolvers = IdentityResolvers::new();
        resolvers.register(
            AuthSchemeId::new("marker"),
            StaticCredentialsResolver::new(Credentials::for_tests()),
        );

        // The first candidate has no registered scheme and is skipped.
        let candidates = vec![
            AuthOption::empty(AuthSchemeId::new("unsupported")),
            AuthOption::empty(AuthSchemeId::new("marker")),
        ];

        let stack = auth_stack(candidates, registry, resolvers);
        let mut ctx = Context::new();
        let result = stack
            .handle(&mut ctx, DynValue::new(()), &EchoTransport)
            .await
            .unwrap();
        let request = HttpRequest::from_dyn(result.unwrap()).unwrap();
        assert_eq!(
            Some("ANOTREAL"),
            request
                .headers()
                .get("x-marker-key")
                .and_then(|value| value.to_str().ok())
        );
    }

    #[tokio::test]
    async fn no_supported_candidate_is_fatal() {
        let stack = auth_stack(
            vec![AuthOption::empty(AuthSchemeId::new("unsupported"))],
            AuthSchemeRegistry::new(),
            IdentityResolvers::new(),
        );
        let mut ctx = Context::new();
        let err = stack
            .handle(&mut ctx, DynValue::new(()), &EchoTransport)
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::NoSupportedAuthScheme, err.kind());
    }

    #[tokio::test]
    async fn missing_identity_resolver_is_fatal() {
        let mut registry = AuthSchemeRegistry::new();
        registry.register(MarkerScheme);
        let stack = auth_stack(
            vec![AuthOption::empty(AuthSchemeId::new("marker"))],
            registry,
            IdentityResolvers::new(),
        );
        let mut ctx = Context::new();
        let err = stack
            .handle(&mut ctx, DynValue::new(()), &EchoTransport)
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidConfiguration, err.kind());
    }

    #[tokio::test]
    async fn anonymous_scheme_sends_unsigned() {
        let mut registry = AuthSchemeRegistry::new();
        registry.register(AnonymousAuthScheme::new());
        let mut resolvers = IdentityResolvers::new();
        resolvers.register(ANONYMOUS, crate::identity::AnonymousIdentityResolver::new());

        let stack = auth_stack(vec![AuthOption::empty(ANONYMOUS)], registry, resolvers);
        let mut ctx = Context::new();
        let result = stack
            .handle(&mut ctx, DynValue::new(()), &EchoTransport)
            .await
            .unwrap();
        let request = HttpRequest::from_dyn(result.unwrap()).unwrap();
        assert!(request.headers().is_empty());
    }
}
