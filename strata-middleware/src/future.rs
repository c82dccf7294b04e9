/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Future types used at pipeline trait boundaries.

use std::future::Future;
use std::pin::Pin;

/// A boxed future returned from object-safe pipeline traits.
///
/// Middleware, terminal handlers, and identity resolvers all suspend through
/// this type so that heterogeneous implementations can share one chain.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
