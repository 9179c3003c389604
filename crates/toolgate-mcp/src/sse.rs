//! SSE transport: MCP over Server-Sent Events.
//!
//! The handshake is the MCP SSE convention: GET the SSE endpoint, wait for
//! the `endpoint` event naming the message POST URL, then POST JSON-RPC
//! requests there while responses arrive back on the event stream.

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::timeout;
use url::Url;

use toolgate_core::ToolDescriptor;

use crate::error::{McpError, McpResult};
use crate::protocol;

/// One parsed server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
struct SseEvent {
    event: String,
    data: String,
}

/// Incremental SSE wire parser over a byte stream
struct EventReader {
    stream: BoxStream<'static, Result<bytes::Bytes, reqwest::Error>>,
    buffer: String,
    ready: VecDeque<SseEvent>,
    timeout: Duration,
}

impl EventReader {
    fn new(
        stream: BoxStream<'static, Result<bytes::Bytes, reqwest::Error>>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            buffer: String::new(),
            ready: VecDeque::new(),
            timeout: io_timeout,
        }
    }

    async fn next_event(&mut self) -> McpResult<SseEvent> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(event);
            }
            let chunk = timeout(self.timeout, self.stream.next())
                .await
                .map_err(|_| McpError::Timeout(self.timeout))?
                .ok_or_else(|| McpError::Connection("event stream closed".to_string()))?
                .map_err(|e| McpError::Connection(format!("event stream error: {}", e)))?;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
            self.drain_buffer();
        }
    }

    /// Split complete (blank-line terminated) events out of the buffer
    fn drain_buffer(&mut self) {
        while let Some(boundary) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..boundary + 2).collect();
            let mut event = String::from("message");
            let mut data_lines = Vec::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data_lines.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
                // comments (":") and other fields are ignored
            }
            if !data_lines.is_empty() || event != "message" {
                self.ready.push_back(SseEvent {
                    event,
                    data: data_lines.join("\n"),
                });
            }
        }
    }
}

/// A live MCP-over-SSE connection
pub struct SseTransport {
    client: reqwest::Client,
    messages_url: Url,
    events: EventReader,
    next_id: u64,
}

impl SseTransport {
    /// Open the event stream and wait for the server to announce its message
    /// endpoint.
    pub async fn connect(endpoint: &Url, io_timeout: Duration) -> McpResult<Self> {
        let client = reqwest::Client::new();
        let response = timeout(
            io_timeout,
            client
                .get(endpoint.clone())
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send(),
        )
        .await
        .map_err(|_| McpError::Timeout(io_timeout))?
        .map_err(|e| McpError::Connection(format!("failed to connect to server: {}", e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| McpError::Connection(format!("server rejected SSE stream: {}", e)))?;

        let mut events = EventReader::new(response.bytes_stream().boxed(), io_timeout);

        // First event must announce where to POST messages
        let announce = events.next_event().await?;
        if announce.event != "endpoint" {
            return Err(McpError::Protocol(format!(
                "expected 'endpoint' event, got '{}'",
                announce.event
            )));
        }
        let messages_url = endpoint.join(announce.data.trim()).map_err(|e| {
            McpError::Protocol(format!("invalid message endpoint '{}': {}", announce.data, e))
        })?;
        tracing::debug!(%messages_url, "SSE endpoint announced");

        Ok(Self {
            client,
            messages_url,
            events,
            next_id: 1,
        })
    }

    /// Perform the MCP handshake and return the advertised server name
    pub async fn initialize(&mut self) -> McpResult<Option<String>> {
        let id = self.next_id();
        let response = self.request(protocol::initialize_request(id), id).await?;
        let result = protocol::expect_result(&response)?;
        let server = protocol::server_name(result);
        self.post(&protocol::initialized_notification()).await?;
        tracing::debug!(server = ?server, "SSE MCP handshake complete");
        Ok(server)
    }

    /// Fetch the live tool list
    pub async fn list_tools(&mut self) -> McpResult<Vec<ToolDescriptor>> {
        let id = self.next_id();
        let response = self.request(protocol::list_tools_request(id), id).await?;
        protocol::parse_tool_list(protocol::expect_result(&response)?)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // &mut so the future captures no shared borrow of the (non-Sync) event
    // stream; callers hold &mut self anyway.
    async fn post(&mut self, message: &Value) -> McpResult<()> {
        let response = self
            .client
            .post(self.messages_url.clone())
            .json(message)
            .send()
            .await
            .map_err(|e| McpError::Connection(format!("failed to post message: {}", e)))?;
        response
            .error_for_status()
            .map_err(|e| McpError::Connection(format!("message rejected: {}", e)))?;
        Ok(())
    }

    async fn request(&mut self, message: Value, id: u64) -> McpResult<Value> {
        self.post(&message).await?;
        loop {
            let event = self.events.next_event().await?;
            if event.event == "endpoint" {
                continue;
            }
            match serde_json::from_str::<Value>(&event.data) {
                Ok(parsed) if protocol::is_response_to(&parsed, id) => return Ok(parsed),
                Ok(_) => tracing::debug!("skipping unrelated SSE message"),
                Err(e) => tracing::debug!(error = %e, "skipping non-JSON SSE data"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn reader_from(chunks: Vec<&'static str>) -> EventReader {
        let stream = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(bytes::Bytes::from_static(c.as_bytes()))),
        )
        .boxed();
        EventReader::new(stream, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_event_parsing_across_chunk_boundaries() {
        let mut reader = reader_from(vec![
            "event: endpoint\ndata: /messages?session=",
            "abc\n\nevent: message\ndata: {\"id\":1}\n\n",
        ]);

        let first = reader.next_event().await.unwrap();
        assert_eq!(first.event, "endpoint");
        assert_eq!(first.data, "/messages?session=abc");

        let second = reader.next_event().await.unwrap();
        assert_eq!(second.event, "message");
        assert_eq!(second.data, "{\"id\":1}");
    }

    #[tokio::test]
    async fn test_multi_line_data_joined() {
        let mut reader = reader_from(vec!["data: line one\ndata: line two\n\n"]);
        let event = reader.next_event().await.unwrap();
        assert_eq!(event.event, "message");
        assert_eq!(event.data, "line one\nline two");
    }

    #[tokio::test]
    async fn test_closed_stream_is_connection_error() {
        let mut reader = reader_from(vec![]);
        let err = reader.next_event().await.unwrap_err();
        assert!(matches!(err, McpError::Connection(_)));
    }
}
