/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Type-erased values carried across step boundaries.

use std::any::Any;
use std::fmt;

/// A type-erased value.
///
/// Operation inputs, operation outputs, and the in-flight transport request
/// cross step boundaries as `DynValue`s; step middleware downcast to the
/// concrete type they expect and fail the call when handed something else.
pub struct DynValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DynValue {
    /// Erases `value`.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recovers the concrete value, or returns `self` unchanged if the type
    /// does not match.
    pub fn downcast<T: 'static>(self) -> Result<T, DynValue> {
        let type_name = self.type_name;
        match self.value.downcast() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(DynValue { value, type_name }),
        }
    }

    /// Returns a reference to the concrete value if the type matches.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Returns a mutable reference to the concrete value if the type matches.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// The type name the value was erased from, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DynValue<{}>", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_roundtrip() {
        let value = DynValue::new(42u32);
        assert_eq!("u32", value.type_name());
        assert_eq!(Some(&42), value.downcast_ref::<u32>());
        assert!(value.downcast_ref::<String>().is_none());
        assert_eq!(42, value.downcast::<u32>().unwrap());
    }

    #[test]
    fn failed_downcast_returns_the_value() {
        let mut value = DynValue::new(String::from("hello"));
        value.downcast_mut::<String>().unwrap().push('!');
        let value = value.downcast::<u32>().unwrap_err();
        assert_eq!("hello!", value.downcast::<String>().unwrap());
    }
}
