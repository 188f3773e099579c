// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Creation;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for an event buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of buffered events that triggers a flush
    pub capacity: usize,
    /// Delay between the first buffered event and its deadline flush
    pub flush_interval: Duration,
    /// How long `shutdown` waits for the final drain when no timeout is given
    pub shutdown_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl BufferConfig {
    pub fn new(capacity: usize, flush_interval: Duration) -> Self {
        Self {
            capacity,
            flush_interval,
            ..Default::default()
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, Creation> {
        let defaults = Self::default();

        let capacity = read_env("EVENT_BUFFER_CAPACITY")?.unwrap_or(defaults.capacity);
        let flush_interval = read_env::<u64>("EVENT_BUFFER_FLUSH_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.flush_interval);
        let shutdown_timeout = read_env::<u64>("EVENT_BUFFER_SHUTDOWN_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.shutdown_timeout);

        let config = Self {
            capacity,
            flush_interval,
            shutdown_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Creation> {
        if self.capacity == 0 {
            return Err(Creation::InvalidCapacity);
        }
        if self.flush_interval.is_zero() {
            return Err(Creation::InvalidFlushInterval);
        }
        if self.shutdown_timeout.is_zero() {
            return Err(Creation::InvalidShutdownTimeout);
        }
        Ok(())
    }
}

fn read_env<T: FromStr>(key: &str) -> Result<Option<T>, Creation> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Creation::InvalidConfig(format!("{key} has invalid value '{raw}'"))),
        Err(_) => Ok(None),
    }
}
