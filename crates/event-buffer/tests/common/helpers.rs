// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

#![allow(dead_code)]

use event_buffer::{BufferConfig, Event, EventBuffer, Sink};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Create a click event numbered `i`
pub fn click(i: usize) -> Event {
    Event::from_value(json!({"event": format!("click_{i}")})).expect("click event is not null")
}

/// Create an event tagged with the producing thread and its sequence number
pub fn tagged(thread: usize, seq: usize) -> Event {
    Event::from_value(json!({"thread": thread, "event": seq})).expect("tagged event is not null")
}

/// Build a buffer around a shared sink
pub fn buffer_with<S: Sink + 'static>(
    capacity: usize,
    flush_interval: Duration,
    sink: &Arc<S>,
) -> EventBuffer {
    let sink: Arc<dyn Sink> = Arc::clone(sink) as Arc<dyn Sink>;
    EventBuffer::with_shared_sink(BufferConfig::new(capacity, flush_interval), sink)
        .expect("failed to create event buffer")
}
