// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::{Creation, SinkError};
use crate::event::Event;
use crate::sink::Sink;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Sink that POSTs each batch as a JSON array.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSink {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Creation> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Creation::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn send(&self, batch: Vec<Event>) -> Result<(), SinkError> {
        debug!("Posting {} events to {}", batch.len(), self.url);

        let mut request = self.client.post(&self.url).json(&batch);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("{}: Failed to push batch to {}: {:?}", status, self.url, body);
        Err(SinkError::Status(status.as_u16(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn batch() -> Vec<Event> {
        vec![
            Event::from_value(json!({"event": "page_view", "page": "/page0"})).expect("event"),
            Event::from_value(json!({"event": "page_view", "page": "/page1"})).expect("event"),
        ]
    }

    #[tokio::test]
    async fn test_posts_json_array() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .match_header("Content-Type", "application/json")
            .match_header(API_KEY_HEADER, "mock-api-key")
            .match_body(Matcher::Json(json!([
                {"event": "page_view", "page": "/page0"},
                {"event": "page_view", "page": "/page1"}
            ])))
            .with_status(202)
            .create_async()
            .await;

        let sink = HttpSink::new(
            format!("{}/events", server.url()),
            Some("mock-api-key".to_string()),
            Duration::from_secs(5),
        )
        .expect("failed to build sink");

        assert_eq!(sink.send(batch()).await, Ok(()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_sink_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .with_status(503)
            .with_body("try later")
            .create_async()
            .await;

        let sink = HttpSink::new(
            format!("{}/events", server.url()),
            None,
            Duration::from_secs(5),
        )
        .expect("failed to build sink");

        assert_eq!(
            sink.send(batch()).await,
            Err(SinkError::Status(503, "try later".to_string()))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let sink = HttpSink::new("http://127.0.0.1:1/events", None, Duration::from_secs(1))
            .expect("failed to build sink");

        let result = sink.send(batch()).await;
        assert!(matches!(result, Err(SinkError::Transport(_))));
    }
}
