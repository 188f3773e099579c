// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::SinkError;
use crate::event::Event;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const DEFAULT_SINK_DELAY: Duration = Duration::from_millis(100);

/// Downstream delivery for flushed batches.
///
/// The buffer calls `send` from at most one flush at a time, so implementations
/// may assume they are never re-entered.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Delivers one batch, in buffer order. Returning an error keeps the whole
    /// batch in the buffer for a later attempt.
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError>;
}

/// Sink used when the caller does not supply one: waits a fixed delay and
/// accepts everything.
#[derive(Debug, Clone)]
pub struct DefaultSink {
    delay: Duration,
}

impl Default for DefaultSink {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SINK_DELAY,
        }
    }
}

impl DefaultSink {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Sink for DefaultSink {
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError> {
        tokio::time::sleep(self.delay).await;
        debug!("Default sink received {} events", batch.len());
        Ok(())
    }
}

/// Sink backed by an async closure. See [`sink_fn`].
#[derive(Clone)]
pub struct SinkFn<F> {
    f: F,
}

/// Builds a [`Sink`] from a closure returning a future.
///
/// ```rust,ignore
/// let sink = sink_fn(|batch: Vec<Event>| async move {
///     println!("got {} events", batch.len());
///     Ok(())
/// });
/// ```
pub fn sink_fn<F, Fut>(f: F) -> SinkFn<F>
where
    F: Fn(Vec<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SinkError>> + Send + 'static,
{
    SinkFn { f }
}

#[async_trait]
impl<F, Fut> Sink for SinkFn<F>
where
    F: Fn(Vec<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SinkError>> + Send + 'static,
{
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError> {
        (self.f)(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn events(n: usize) -> Vec<Event> {
        (0..n)
            .filter_map(|i| Event::from_value(json!({"event": format!("click_{i}")})))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_sink_always_succeeds() {
        let sink = DefaultSink::default();
        let started = tokio::time::Instant::now();
        assert!(sink.send(events(3)).await.is_ok());
        assert!(started.elapsed() >= DEFAULT_SINK_DELAY);
    }

    #[tokio::test]
    async fn test_sink_fn_forwards_batch() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let sink = sink_fn(move |batch: Vec<Event>| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.fetch_add(batch.len(), Ordering::SeqCst);
                Ok(())
            }
        });

        sink.send(events(4)).await.expect("send failed");
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_sink_fn_propagates_error() {
        let sink = sink_fn(|_batch: Vec<Event>| async {
            Err(SinkError::Unavailable("API Error".to_string()))
        });
        let result = sink.send(events(1)).await;
        assert_eq!(result, Err(SinkError::Unavailable("API Error".to_string())));
    }
}
