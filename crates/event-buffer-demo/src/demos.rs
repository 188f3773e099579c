// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::flaky_sink::FlakySink;
use event_buffer::{BufferConfig, BufferStats, Creation, Event, EventBuffer, Sink};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;
use tracing::{error, info};

/// Buffer filled to capacity: flushed by the size trigger.
pub async fn size_flush(
    sink: Arc<dyn Sink>,
    shutdown_timeout: Duration,
) -> Result<BufferStats, Creation> {
    info!("DEMO 1: buffer size based flush (capacity=5, flush_interval=2s)");
    let buffer = EventBuffer::with_shared_sink(
        BufferConfig {
            capacity: 5,
            flush_interval: Duration::from_secs(2),
            shutdown_timeout,
        },
        sink,
    )?;

    for i in 0..5 {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default();
        let event = json!({
            "event": "button_click",
            "button_id": format!("btn_{i}"),
            "timestamp": timestamp,
        });
        buffer.enqueue(Event::from_value(event));
        info!("[{}/5] Tracked: button_click", i + 1);
        sleep(Duration::from_millis(200)).await;
    }

    sleep(Duration::from_millis(500)).await;
    log_stats(&buffer.stats());

    Ok(buffer.shutdown_with_default_timeout().await)
}

/// Buffer never fills: flushed by the deadline timer.
pub async fn timer_flush(
    sink: Arc<dyn Sink>,
    shutdown_timeout: Duration,
) -> Result<BufferStats, Creation> {
    info!("DEMO 2: timer based flush (capacity=10, flush_interval=2s)");
    let buffer = EventBuffer::with_shared_sink(
        BufferConfig {
            capacity: 10,
            flush_interval: Duration::from_secs(2),
            shutdown_timeout,
        },
        sink,
    )?;

    for i in 0..3 {
        let event = json!({"event": "page_view", "page": format!("/page{i}")});
        buffer.enqueue(Event::from_value(event));
        info!("[{}/3] Tracked: page_view", i + 1);
        sleep(Duration::from_millis(300)).await;
    }

    info!("Waiting for the timer to trigger a flush");
    sleep(Duration::from_millis(2500)).await;
    log_stats(&buffer.stats());

    Ok(buffer.shutdown_with_default_timeout().await)
}

/// Sink fails twice: the batch is kept and retried on each deadline.
pub async fn error_handling(shutdown_timeout: Duration) -> Result<BufferStats, Creation> {
    info!("DEMO 3: error handling and retry (API fails 2 times, then succeeds)");
    let sink = Arc::new(FlakySink::new(2));
    let buffer = EventBuffer::with_shared_sink(
        BufferConfig {
            capacity: 3,
            flush_interval: Duration::from_millis(1500),
            shutdown_timeout,
        },
        Arc::clone(&sink) as Arc<dyn Sink>,
    )?;

    for i in 0..3 {
        buffer.enqueue(Event::from_value(json!({"event": format!("event_{i}")})));
    }

    info!("Waiting for retries");
    sleep(Duration::from_secs(5)).await;

    info!("Final attempt count: {}", sink.attempts());
    let stats = buffer.stats();
    if stats.buffer_size == 0 {
        info!("Events were preserved and eventually sent");
    } else {
        error!("{} events still buffered after retries", stats.buffer_size);
    }
    log_stats(&stats);

    Ok(buffer.shutdown_with_default_timeout().await)
}

fn log_stats(stats: &BufferStats) {
    match serde_json::to_string(stats) {
        Ok(encoded) => info!("Stats: {encoded}"),
        Err(e) => error!("Failed to encode stats: {e}"),
    }
}
