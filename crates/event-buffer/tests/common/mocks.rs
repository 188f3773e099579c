// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock sink implementations for testing

use event_buffer::{Event, Sink, SinkError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock sink that records every batch it receives.
///
/// Each call pops the next scripted outcome; once the script is exhausted the
/// sink falls back to `default_outcome`.
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<Event>>>,
    accepted: Mutex<Vec<Vec<Event>>>,
    script: Mutex<VecDeque<Result<(), SinkError>>>,
    default_outcome: Result<(), SinkError>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingSink {
    /// Sink that accepts every batch immediately
    pub fn succeeding() -> Self {
        Self::with_default(Ok(()))
    }

    /// Sink that rejects every batch
    pub fn failing() -> Self {
        Self::with_default(Err(SinkError::Unavailable("API Error".to_string())))
    }

    /// Sink that plays `script` in order, then succeeds
    pub fn scripted(script: Vec<Result<(), SinkError>>) -> Self {
        let sink = Self::succeeding();
        *sink.script.lock().unwrap() = script.into();
        sink
    }

    fn with_default(default_outcome: Result<(), SinkError>) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default_outcome,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Simulate network latency on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last_batch_len(&self) -> Option<usize> {
        self.batches.lock().unwrap().last().map(Vec::len)
    }

    /// Every event from the successful calls, in delivery order
    pub fn delivered(&self) -> Vec<Event> {
        self.accepted.lock().unwrap().iter().flatten().cloned().collect()
    }

    /// Highest number of overlapping `send` calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Sink for RecordingSink {
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        self.batches.lock().unwrap().push(batch.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());
        if outcome.is_ok() {
            self.accepted.lock().unwrap().push(batch);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
