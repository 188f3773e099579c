// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The event buffer and its flush orchestration.
//!
//! Three triggers funnel into one flush routine:
//! - **Size**: `enqueue` fills the buffer to capacity and dispatches a flush task
//! - **Deadline**: a single-shot timer armed when the first event lands in an empty buffer
//! - **Manual**: `flush_now` and the `shutdown` drain
//!
//! All bookkeeping lives in one `State` behind a `std::sync::Mutex`. The lock is
//! never held across an `.await`; in particular the sink call runs with it
//! released, so producers are never slowed down by sink latency.
//!
//! # Known limitation
//!
//! A sink that keeps failing makes the buffer grow without bound: every failed
//! batch is kept in full and retried on the next deadline or size trigger.

use crate::config::BufferConfig;
use crate::errors::{Creation, SinkError};
use crate::event::Event;
use crate::sink::{DefaultSink, Sink};
use crate::stats::BufferStats;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What started a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Deadline,
    Manual,
    Shutdown,
}

/// Result of one pass through the flush routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was already in flight
    Skipped,
    /// Nothing was buffered
    Empty,
    /// The sink accepted this many events
    Delivered(usize),
    /// The sink rejected a batch of this many events; they are still buffered
    Failed(usize),
}

struct DeadlineTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    timer: Option<DeadlineTimer>,
    next_timer_id: u64,
    flushing: bool,
    shutting_down: bool,
    total_tracked: u64,
    successful_flushes: u64,
    failed_flushes: u64,
}

impl State {
    /// Aborts the pending deadline timer, if any. Returns whether one existed.
    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> BufferStats {
        BufferStats {
            buffer_size: self.events.len(),
            total_tracked: self.total_tracked,
            successful_flushes: self.successful_flushes,
            failed_flushes: self.failed_flushes,
            timer_active: self.timer.is_some(),
            flushing: self.flushing,
            shutting_down: self.shutting_down,
        }
    }
}

struct Inner {
    capacity: usize,
    flush_interval: Duration,
    shutdown_timeout: Duration,
    sink: Arc<dyn Sink>,
    runtime: Handle,
    state: Mutex<State>,
}

impl Inner {
    #[allow(clippy::expect_used)]
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("lock poisoned")
    }

    /// Replaces any pending deadline timer with a fresh one.
    ///
    /// Must be called with the state lock held.
    fn arm_timer(self: &Arc<Self>, state: &mut State) {
        state.cancel_timer();
        state.next_timer_id = state.next_timer_id.wrapping_add(1);
        let id = state.next_timer_id;

        let inner = Arc::clone(self);
        let interval = self.flush_interval;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            if inner.claim_timer(id) {
                inner.flush(FlushTrigger::Deadline).await;
            }
        });

        state.timer = Some(DeadlineTimer { id, handle });
        debug!("Timer started: will flush in {:?}", interval);
    }

    /// Detaches a fired timer from the state so the flush it starts cannot
    /// abort its own task. Returns false if the timer was replaced meanwhile.
    fn claim_timer(&self, id: u64) -> bool {
        let mut state = self.lock_state();
        if state.timer.as_ref().is_some_and(|timer| timer.id == id) {
            state.timer = None;
            debug!("Flush interval elapsed");
            true
        } else {
            false
        }
    }

    fn spawn_flush(self: &Arc<Self>, trigger: FlushTrigger) -> JoinHandle<FlushOutcome> {
        let inner = Arc::clone(self);
        self.runtime.spawn(async move { inner.flush(trigger).await })
    }

    async fn flush(self: &Arc<Self>, trigger: FlushTrigger) -> FlushOutcome {
        let batch = {
            let mut state = self.lock_state();

            if state.flushing {
                debug!("Flush in progress - skipping {:?} flush", trigger);
                return FlushOutcome::Skipped;
            }

            if state.events.is_empty() {
                debug!("Empty buffer - nothing to flush");
                if state.cancel_timer() {
                    debug!("Timer cancelled");
                }
                return FlushOutcome::Empty;
            }

            state.flushing = true;

            // A flush supersedes the pending deadline
            if state.cancel_timer() {
                debug!("Timer cancelled");
            }

            state.events.clone()
        };
        let batch_len = batch.len();

        info!("Flushing {} events ({:?} trigger)", batch_len, trigger);

        // The sink runs on its own task so a panic is reported as a failed
        // flush instead of leaving `flushing` stuck.
        let sink = Arc::clone(&self.sink);
        let result = match self.runtime.spawn(async move { sink.send(batch).await }).await {
            Ok(result) => result,
            Err(err) => Err(SinkError::Panicked(err.to_string())),
        };

        let mut state = self.lock_state();
        let outcome = match result {
            Ok(()) => {
                // Events enqueued during the send stay behind the delivered prefix
                state.events.drain(..batch_len);
                state.successful_flushes += 1;
                info!("Successfully flushed {} events", batch_len);
                FlushOutcome::Delivered(batch_len)
            }
            Err(err) => {
                state.failed_flushes += 1;
                error!("Flush failed: {err}");
                info!(
                    "Events preserved in buffer for retry. Buffer size: {}",
                    state.events.len()
                );
                FlushOutcome::Failed(batch_len)
            }
        };
        state.flushing = false;

        if !state.events.is_empty() && !state.shutting_down {
            self.arm_timer(&mut state);
        }

        outcome
    }
}

/// Client-side batching buffer for telemetry events.
///
/// Cloning is cheap and every clone drives the same buffer, so one instance
/// can be shared by any number of producer tasks or threads.
///
/// # Example
///
/// ```rust,ignore
/// let buffer = EventBuffer::with_sink(BufferConfig::new(100, Duration::from_secs(5)), sink)?;
/// buffer.enqueue(Event::from_value(json!({"event": "button_click"})));
/// let final_stats = buffer.shutdown(Duration::from_secs(10)).await;
/// ```
#[derive(Clone)]
pub struct EventBuffer {
    inner: Arc<Inner>,
}

impl EventBuffer {
    /// Creates a buffer backed by [`DefaultSink`].
    pub fn new(config: BufferConfig) -> Result<Self, Creation> {
        Self::with_sink(config, DefaultSink::default())
    }

    pub fn with_sink(config: BufferConfig, sink: impl Sink + 'static) -> Result<Self, Creation> {
        Self::with_shared_sink(config, Arc::new(sink))
    }

    /// Creates a buffer delivering to `sink`.
    ///
    /// Timers and flush tasks are spawned on the tokio runtime current at
    /// construction, which lets `enqueue` be called from plain threads too.
    pub fn with_shared_sink(config: BufferConfig, sink: Arc<dyn Sink>) -> Result<Self, Creation> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| Creation::NoRuntime)?;

        info!(
            "Initialised event buffer: capacity={}, flush_interval={:?}",
            config.capacity, config.flush_interval
        );

        Ok(Self {
            inner: Arc::new(Inner {
                capacity: config.capacity,
                flush_interval: config.flush_interval,
                shutdown_timeout: config.shutdown_timeout,
                sink,
                runtime,
                state: Mutex::new(State::default()),
            }),
        })
    }

    /// Buffers one event. Returns false if the event is absent or the buffer
    /// is shutting down; rejected events leave the buffer untouched.
    ///
    /// Never waits on the sink: a size-triggered flush runs on its own task.
    pub fn enqueue(&self, event: impl Into<Option<Event>>) -> bool {
        let Some(event) = event.into() else {
            warn!("Attempted to enqueue an absent event - rejected");
            return false;
        };

        let mut state = self.inner.lock_state();
        if state.shutting_down {
            warn!("Buffer is shutting down - rejecting event");
            return false;
        }

        state.events.push(event);
        state.total_tracked += 1;
        let buffered = state.events.len();

        debug!("Event tracked. Buffer size: {}/{}", buffered, self.inner.capacity);

        if buffered == 1 && state.timer.is_none() {
            self.inner.arm_timer(&mut state);
        }

        if buffered >= self.inner.capacity {
            info!(
                "Buffer full ({} events) - triggering flush",
                self.inner.capacity
            );
            // Detached: the caller must not wait for the sink
            drop(self.inner.spawn_flush(FlushTrigger::Size));
        }

        true
    }

    /// Flushes immediately and waits for the outcome.
    ///
    /// The flush runs on its own task, so dropping this future does not
    /// interrupt a sink call half way.
    pub async fn flush_now(&self) -> FlushOutcome {
        info!("Triggering a manual flush");
        match self.inner.spawn_flush(FlushTrigger::Manual).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Manual flush task failed: {err}");
                FlushOutcome::Skipped
            }
        }
    }

    /// Stops accepting events and makes a best-effort attempt to drain.
    ///
    /// Waits at most `timeout` for the drain flush (or one already in flight)
    /// to finish. Whatever is not delivered by then stays in the buffer and is
    /// reported in the returned stats. Safe to call more than once.
    pub async fn shutdown(&self, timeout: Duration) -> BufferStats {
        info!("Shutting down event buffer...");

        self.inner.lock_state().shutting_down = true;

        let drain = self.inner.spawn_flush(FlushTrigger::Shutdown);
        let waited = tokio::time::timeout(timeout, async {
            match drain.await {
                Ok(outcome) => debug!("Shutdown flush finished: {:?}", outcome),
                Err(err) => error!("Shutdown flush task failed: {err}"),
            }

            let mut ticker = tokio::time::interval(SHUTDOWN_POLL_INTERVAL);
            loop {
                ticker.tick().await;
                let flushing = self.inner.lock_state().flushing;
                if !flushing {
                    break;
                }
            }
        })
        .await;

        if waited.is_err() {
            warn!(
                "Shutdown timeout of {:?} exceeded - buffered events may be lost",
                timeout
            );
        }

        let stats = {
            let mut state = self.inner.lock_state();
            if state.cancel_timer() {
                debug!("Timer cancelled");
            }
            state.snapshot()
        };

        info!(
            "Shutdown complete. Final stats: tracked={}, successful_flushes={}, failed_flushes={}, remaining_in_buffer={}",
            stats.total_tracked, stats.successful_flushes, stats.failed_flushes, stats.buffer_size
        );

        stats
    }

    /// [`EventBuffer::shutdown`] with the configured shutdown timeout.
    pub async fn shutdown_with_default_timeout(&self) -> BufferStats {
        self.shutdown(self.inner.shutdown_timeout).await
    }

    pub fn stats(&self) -> BufferStats {
        self.inner.lock_state().snapshot()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn flush_interval(&self) -> Duration {
        self.inner.flush_interval
    }

    /// Copy of the buffered events, oldest first.
    pub fn buffered_events(&self) -> Vec<Event> {
        self.inner.lock_state().events.clone()
    }
}

impl fmt::Debug for EventBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuffer")
            .field("capacity", &self.inner.capacity)
            .field("flush_interval", &self.inner.flush_interval)
            .field("stats", &self.stats())
            .finish()
    }
}
