// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while constructing a buffer or one of its sinks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Creation {
    #[error("capacity must be greater than 0")]
    InvalidCapacity,

    #[error("flush interval must be greater than 0")]
    InvalidFlushInterval,

    #[error("shutdown timeout must be greater than 0")]
    InvalidShutdownTimeout,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("event buffer must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failure reported by a sink for one batch.
///
/// Never surfaces to producers: the flush routine converts it into a failed
/// flush and keeps the batch for the next attempt.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("{0}: Failed to push batch: {1}")]
    Status(u16, String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Sink panicked: {0}")]
    Panicked(String),
}
