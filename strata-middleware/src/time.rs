/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Time sources for components that need the current time.
//!
//! Signing stamps requests with a timestamp; tests need that timestamp pinned.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Provides the current time.
pub trait TimeSource: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// A [`TimeSource`] backed by the system clock.
#[derive(Debug, Default, Clone)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Creates a system-clock time source.
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A [`TimeSource`] pinned to a fixed instant, for tests.
#[derive(Debug, Clone)]
pub struct StaticTimeSource {
    time: SystemTime,
}

impl StaticTimeSource {
    /// Creates a time source that always reports `time`.
    pub fn new(time: SystemTime) -> Self {
        Self { time }
    }

    /// Creates a time source pinned to `secs` seconds past the Unix epoch.
    pub fn from_secs(secs: u64) -> Self {
        Self::new(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}

impl TimeSource for StaticTimeSource {
    fn now(&self) -> SystemTime {
        self.time
    }
}

/// A shared, clonable [`TimeSource`].
#[derive(Debug, Clone)]
pub struct SharedTimeSource(Arc<dyn TimeSource>);

impl SharedTimeSource {
    /// Wraps `source` for shared use.
    pub fn new(source: impl TimeSource + 'static) -> Self {
        Self(Arc::new(source))
    }
}

impl Default for SharedTimeSource {
    fn default() -> Self {
        Self::new(SystemTimeSource::new())
    }
}

impl TimeSource for SharedTimeSource {
    fn now(&self) -> SystemTime {
        self.0.now()
    }
}
