// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use event_buffer::{Event, Sink, SinkError};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Sink that fails its first `failures` calls and accepts everything after.
#[derive(Debug)]
pub struct FlakySink {
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakySink {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for FlakySink {
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            warn!("Flaky API attempt {attempt}: simulated failure");
            return Err(SinkError::Unavailable(format!(
                "simulated failure on attempt {attempt}"
            )));
        }
        info!("Flaky API attempt {attempt}: accepted {} events", batch.len());
        Ok(())
    }
}
