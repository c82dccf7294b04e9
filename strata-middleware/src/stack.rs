/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The stack: five fixed steps decorated around a terminal transport handler.
//!
//! Invocation order is Initialize → Serialize → Build → Finalize → Deserialize
//! → transport, with each step's middleware running in registration-relative
//! order on the way in and in reverse on the way back out. The transport
//! request and the operation input/output cross step boundaries type-erased;
//! dispatch adapters at each boundary re-shape one step's output into the next
//! step's input.

use crate::context::Context;
use crate::error::ClientError;
use crate::future::BoxFuture;
use crate::middleware::Handler;
use crate::step::Step;
use crate::value::DynValue;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Input to the Initialize step: the operation's input parameters.
#[derive(Debug)]
pub struct InitializeInput {
    /// The type-erased operation input.
    pub parameters: DynValue,
}

/// Output of the Initialize step: the operation result flowing back out.
#[derive(Debug)]
pub struct InitializeOutput {
    /// The type-erased operation output, if the call produced one.
    pub result: Option<DynValue>,
}

/// Input to the Serialize step: operation parameters plus the transport
/// request under construction.
#[derive(Debug)]
pub struct SerializeInput {
    /// The type-erased operation input.
    pub parameters: DynValue,
    /// The type-erased transport request being constructed.
    pub request: DynValue,
}

/// Output of the Serialize step.
#[derive(Debug)]
pub struct SerializeOutput {
    /// The type-erased operation output, if the call produced one.
    pub result: Option<DynValue>,
}

/// Input to the Build step: the constructed transport request.
#[derive(Debug)]
pub struct BuildInput {
    /// The type-erased transport request.
    pub request: DynValue,
}

/// Output of the Build step.
#[derive(Debug)]
pub struct BuildOutput {
    /// The type-erased operation output, if the call produced one.
    pub result: Option<DynValue>,
}

/// Input to the Finalize step: the transport request, ready for signing.
#[derive(Debug)]
pub struct FinalizeInput {
    /// The type-erased transport request.
    pub request: DynValue,
}

/// Output of the Finalize step.
#[derive(Debug)]
pub struct FinalizeOutput {
    /// The type-erased operation output, if the call produced one.
    pub result: Option<DynValue>,
}

/// Input to the Deserialize step, and to the terminal transport handler.
#[derive(Debug)]
pub struct DeserializeInput {
    /// The type-erased transport request to send.
    pub request: DynValue,
}

/// Output of the Deserialize step.
#[derive(Debug)]
pub struct DeserializeOutput {
    /// The raw transport response, when one was received.
    pub raw_response: Option<DynValue>,
    /// The type-erased operation output produced from the raw response.
    pub result: Option<DynValue>,
}

/// The terminal transport handler type: sends the constructed request and
/// yields the raw response.
pub type TransportHandler = dyn Handler<DeserializeInput, DeserializeOutput>;

/// The five-step middleware stack for one client.
///
/// A stack is assembled once, before its first call; it holds no locks, so
/// step mutation concurrent with an in-progress call is forbidden. Per call it
/// decorates the terminal transport handler from the outside in and drives the
/// type-erased operation input through.
pub struct Stack {
    id: Cow<'static, str>,
    initialize: Step<InitializeInput, InitializeOutput>,
    serialize: Step<SerializeInput, SerializeOutput>,
    build: Step<BuildInput, BuildOutput>,
    finalize: Step<FinalizeInput, FinalizeOutput>,
    deserialize: Step<DeserializeInput, DeserializeOutput>,
    new_request: Arc<dyn Fn() -> DynValue + Send + Sync>,
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("id", &self.id)
            .field("initialize", &self.initialize)
            .field("serialize", &self.serialize)
            .field("build", &self.build)
            .field("finalize", &self.finalize)
            .field("deserialize", &self.deserialize)
            .finish()
    }
}

impl Stack {
    /// Creates an empty stack.
    ///
    /// `new_request` constructs the transport request handed to the Serialize
    /// step; the stack itself never inspects it.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        new_request: impl Fn() -> DynValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            initialize: Step::new("Initialize"),
            serialize: Step::new("Serialize"),
            build: Step::new("Build"),
            finalize: Step::new("Finalize"),
            deserialize: Step::new("Deserialize"),
            new_request: Arc::new(new_request),
        }
    }

    /// The stack identifier, used in logging.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The Initialize step.
    pub fn initialize(&self) -> &Step<InitializeInput, InitializeOutput> {
        &self.initialize
    }

    /// The Initialize step, mutably, for registration.
    pub fn initialize_mut(&mut self) -> &mut Step<InitializeInput, InitializeOutput> {
        &mut self.initialize
    }

    /// The Serialize step.
    pub fn serialize(&self) -> &Step<SerializeInput, SerializeOutput> {
        &self.serialize
    }

    /// The Serialize step, mutably, for registration.
    pub fn serialize_mut(&mut self) -> &mut Step<SerializeInput, SerializeOutput> {
        &mut self.serialize
    }

    /// The Build step.
    pub fn build(&self) -> &Step<BuildInput, BuildOutput> {
        &self.build
    }

    /// The Build step, mutably, for registration.
    pub fn build_mut(&mut self) -> &mut Step<BuildInput, BuildOutput> {
        &mut self.build
    }

    /// The Finalize step.
    pub fn finalize(&self) -> &Step<FinalizeInput, FinalizeOutput> {
        &self.finalize
    }

    /// The Finalize step, mutably, for registration.
    pub fn finalize_mut(&mut self) -> &mut Step<FinalizeInput, FinalizeOutput> {
        &mut self.finalize
    }

    /// The Deserialize step.
    pub fn deserialize(&self) -> &Step<DeserializeInput, DeserializeOutput> {
        &self.deserialize
    }

    /// The Deserialize step, mutably, for registration.
    pub fn deserialize_mut(&mut self) -> &mut Step<DeserializeInput, DeserializeOutput> {
        &mut self.deserialize
    }

    /// Drives one call through the stack.
    ///
    /// On success the type-erased operation output is returned; the metadata
    /// collected along the way stays on `ctx` either way, so callers can pair
    /// it with the error on the failure path.
    pub fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: DynValue,
        transport: &'a TransportHandler,
    ) -> BoxFuture<'a, Result<Option<DynValue>, ClientError>> {
        Box::pin(async move {
            tracing::debug!(stack = %self.id, "starting call");
            if ctx.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let dispatch = SerializeDispatch {
                stack: self,
                transport,
            };
            let output = self
                .initialize
                .handle(ctx, InitializeInput { parameters: input }, &dispatch)
                .await?;
            Ok(output.result)
        })
    }
}

/// Terminal of the Initialize step: constructs the transport request and
/// enters the Serialize step.
struct SerializeDispatch<'s> {
    stack: &'s Stack,
    transport: &'s TransportHandler,
}

impl fmt::Debug for SerializeDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerializeDispatch")
    }
}

impl Handler<InitializeInput, InitializeOutput> for SerializeDispatch<'_> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: InitializeInput,
    ) -> BoxFuture<'a, Result<InitializeOutput, ClientError>> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let request = (self.stack.new_request)();
            let input = SerializeInput {
                parameters: input.parameters,
                request,
            };
            let dispatch = BuildDispatch {
                stack: self.stack,
                transport: self.transport,
            };
            let output = self.stack.serialize.handle(ctx, input, &dispatch).await?;
            Ok(InitializeOutput {
                result: output.result,
            })
        })
    }
}

/// Terminal of the Serialize step: drops the consumed operation parameters and
/// enters the Build step.
struct BuildDispatch<'s> {
    stack: &'s Stack,
    transport: &'s TransportHandler,
}

impl fmt::Debug for BuildDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BuildDispatch")
    }
}

impl Handler<SerializeInput, SerializeOutput> for BuildDispatch<'_> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SerializeInput,
    ) -> BoxFuture<'a, Result<SerializeOutput, ClientError>> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let input = BuildInput {
                request: input.request,
            };
            let dispatch = FinalizeDispatch {
                stack: self.stack,
                transport: self.transport,
            };
            let output = self.stack.build.handle(ctx, input, &dispatch).await?;
            Ok(SerializeOutput {
                result: output.result,
            })
        })
    }
}

/// Terminal of the Build step: enters the Finalize step.
struct FinalizeDispatch<'s> {
    stack: &'s Stack,
    transport: &'s TransportHandler,
}

impl fmt::Debug for FinalizeDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FinalizeDispatch")
    }
}

impl Handler<BuildInput, BuildOutput> for FinalizeDispatch<'_> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: BuildInput,
    ) -> BoxFuture<'a, Result<BuildOutput, ClientError>> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let input = FinalizeInput {
                request: input.request,
            };
            let dispatch = DeserializeDispatch {
                stack: self.stack,
                transport: self.transport,
            };
            let output = self.stack.finalize.handle(ctx, input, &dispatch).await?;
            Ok(BuildOutput {
                result: output.result,
            })
        })
    }
}

/// Terminal of the Finalize step: enters the Deserialize step, whose own
/// terminal is the transport handler.
struct DeserializeDispatch<'s> {
    stack: &'s Stack,
    transport: &'s TransportHandler,
}

impl fmt::Debug for DeserializeDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeserializeDispatch")
    }
}

impl Handler<FinalizeInput, FinalizeOutput> for DeserializeDispatch<'_> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: FinalizeInput,
    ) -> BoxFuture<'a, Result<FinalizeOutput, ClientError>> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(ClientError::cancelled());
            }
            let input = DeserializeInput {
                request: input.request,
            };
            let output = self
                .stack
                .deserialize
                .handle(ctx, input, self.transport)
                .await?;
            Ok(FinalizeOutput {
                result: output.result,
            })
        })
    }
}
