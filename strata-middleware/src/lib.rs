/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Ordered five-step request pipeline underpinning Strata-generated service clients.
//!
//! A [`Stack`](stack::Stack) composes five fixed steps (Initialize, Serialize, Build,
//! Finalize, Deserialize) around a terminal transport [`Handler`](middleware::Handler).
//! Each step holds an insertion-ordered group of [`Middleware`](middleware::Middleware)
//! that is invoked strictly in registration-relative order, both on the way into the
//! terminal handler and on the way back out.
//!
//! Registration happens once, before the first call; per-call state travels on a
//! [`Context`](context::Context) that carries a [`PropertyBag`](properties::PropertyBag)
//! for middleware-local values and a [`Metadata`](metadata::Metadata) container that
//! survives the error path.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod context;
pub mod error;
pub mod future;
pub mod metadata;
pub mod middleware;
pub mod order;
pub mod properties;
pub mod stack;
pub mod step;
pub mod time;
pub mod value;
