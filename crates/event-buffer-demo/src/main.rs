// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod demos;
mod flaky_sink;

use std::{env, sync::Arc, time::Duration};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use event_buffer::{BufferConfig, DefaultSink, HttpSink, Sink};

const SINK_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PAUSE_BETWEEN_DEMOS: Duration = Duration::from_secs(1);

#[tokio::main]
pub async fn main() {
    let log_level = env::var("EVENT_BUFFER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match BufferConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating event buffer config: {e}");
            return;
        }
    };

    let sink: Arc<dyn Sink> = match env::var("EVENT_BUFFER_SINK_URL") {
        Ok(url) => {
            let api_key = env::var("EVENT_BUFFER_API_KEY").ok();
            match HttpSink::new(url, api_key, SINK_REQUEST_TIMEOUT) {
                Ok(sink) => {
                    info!("Delivering demo batches to {}", sink.url());
                    Arc::new(sink)
                }
                Err(e) => {
                    error!("Error creating HTTP sink: {e}");
                    return;
                }
            }
        }
        Err(_) => Arc::new(DefaultSink::default()),
    };

    info!("Running demos for the event buffer");

    match demos::size_flush(Arc::clone(&sink), config.shutdown_timeout).await {
        Ok(stats) => debug!("Size flush demo finished: {:?}", stats),
        Err(e) => error!("Demo 'Buffer Size Flush' failed: {e}"),
    }
    tokio::time::sleep(PAUSE_BETWEEN_DEMOS).await;

    match demos::timer_flush(Arc::clone(&sink), config.shutdown_timeout).await {
        Ok(stats) => debug!("Timer flush demo finished: {:?}", stats),
        Err(e) => error!("Demo 'Timer Flush' failed: {e}"),
    }
    tokio::time::sleep(PAUSE_BETWEEN_DEMOS).await;

    match demos::error_handling(config.shutdown_timeout).await {
        Ok(stats) => debug!("Error handling demo finished: {:?}", stats),
        Err(e) => error!("Demo 'Error Handling' failed: {e}"),
    }

    info!("All demos completed");
}
