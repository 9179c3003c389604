//! Stdio transport: spawn an MCP server subprocess and speak newline-delimited
//! JSON-RPC over its stdin/stdout.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

use toolgate_core::ToolDescriptor;

use crate::error::{McpError, McpResult};
use crate::protocol;

/// A live MCP subprocess connection
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
    next_id: u64,
}

impl StdioTransport {
    /// Spawn the server process. The child inherits the current environment
    /// and is killed when the transport is dropped.
    pub fn spawn(command: &str, args: &[String], io_timeout: Duration) -> McpResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                McpError::Connection(format!("failed to start stdio process '{}': {}", command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Connection("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Connection("child stdout unavailable".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            timeout: io_timeout,
            next_id: 1,
        })
    }

    /// Perform the MCP handshake and return the advertised server name
    pub async fn initialize(&mut self) -> McpResult<Option<String>> {
        let id = self.next_id();
        self.send(&protocol::initialize_request(id)).await?;
        let response = self.read_response(id).await?;
        let result = protocol::expect_result(&response)?;
        let server = protocol::server_name(result);
        self.send(&protocol::initialized_notification()).await?;
        tracing::debug!(server = ?server, "stdio MCP handshake complete");
        Ok(server)
    }

    /// Fetch the live tool list
    pub async fn list_tools(&mut self) -> McpResult<Vec<ToolDescriptor>> {
        let id = self.next_id();
        self.send(&protocol::list_tools_request(id)).await?;
        let response = self.read_response(id).await?;
        protocol::parse_tool_list(protocol::expect_result(&response)?)
    }

    /// Terminate the subprocess
    pub async fn close(mut self) {
        let _ = self.child.kill().await;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn send(&mut self, message: &Value) -> McpResult<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        timeout(self.timeout, self.stdin.write_all(line.as_bytes()))
            .await
            .map_err(|_| McpError::Timeout(self.timeout))??;
        Ok(())
    }

    /// Read lines until the response to `id` arrives, skipping notifications
    /// and unparsable output.
    async fn read_response(&mut self, id: u64) -> McpResult<Value> {
        loop {
            let line = timeout(self.timeout, self.stdout.next_line())
                .await
                .map_err(|_| McpError::Timeout(self.timeout))??
                .ok_or_else(|| {
                    McpError::Connection("stdio server closed its stdout".to_string())
                })?;
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(message) if protocol::is_response_to(&message, id) => return Ok(message),
                Ok(_) => tracing::debug!("skipping unrelated stdio message"),
                Err(e) => tracing::debug!(error = %e, "skipping non-JSON stdio line"),
            }
        }
    }
}
