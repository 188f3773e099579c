// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer;
pub mod config;
pub mod errors;
pub mod event;
pub mod http_sink;
pub mod sink;
pub mod stats;

pub use buffer::{EventBuffer, FlushOutcome, FlushTrigger};
pub use config::BufferConfig;
pub use errors::{Creation, SinkError};
pub use event::Event;
pub use http_sink::HttpSink;
pub use sink::{sink_fn, DefaultSink, Sink, SinkFn};
pub use stats::BufferStats;
