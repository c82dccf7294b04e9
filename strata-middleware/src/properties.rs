/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Heterogeneous property storage keyed by type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// A property bag holding at most one value of each type.
///
/// Properties are keyed by their Rust type; a distinct sentinel type per
/// property keeps unrelated middleware from colliding. Reads are safe to share
/// across threads when nothing writes; mutation within a call happens through
/// `&mut` and is therefore single-threaded by construction.
#[derive(Default)]
pub struct PropertyBag {
    map: HashMap<TypeId, NamedValue>,
}

struct NamedValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl PropertyBag {
    /// Creates an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type if one
    /// was present.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(
                TypeId::of::<T>(),
                NamedValue {
                    value: Box::new(value),
                    type_name: std::any::type_name::<T>(),
                },
            )
            .and_then(|named| named.value.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// Returns a reference to the stored `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|named| named.value.downcast_ref())
    }

    /// Returns a mutable reference to the stored `T`, if any.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|named| named.value.downcast_mut())
    }

    /// Removes and returns the stored `T`, if any.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|named| named.value.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// True if a `T` is stored.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// The number of stored properties.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.map.values().map(|named| named.type_name).collect();
        names.sort_unstable();
        f.debug_struct("PropertyBag")
            .field("properties", &names)
            .finish()
    }
}
