//! Tool snapshot fetcher and the gated session wrapper

use std::time::Duration;

use toolgate_core::{filter_tools, Policy, ToolDescriptor};

use crate::error::{McpError, McpResult};
use crate::locator::ServerLocator;

/// Outcome of a fetch: the normalized tool list plus the server identity the
/// transport could establish (MCP `serverInfo.name`), if any.
#[derive(Debug, Clone)]
pub struct FetchedTools {
    pub tools: Vec<ToolDescriptor>,
    pub server_identity: Option<String>,
}

impl FetchedTools {
    /// The origin to bind checksums to: the server's own advertised identity
    /// when available, otherwise the locator the caller dialed.
    pub fn origin(&self, locator: &ServerLocator) -> String {
        self.server_identity
            .clone()
            .unwrap_or_else(|| locator.to_string())
    }
}

/// Fetch the current tool list from a server.
///
/// One request/response exchange per call; `io_timeout` bounds each
/// individual network or subprocess exchange. No retries: those belong to
/// the caller.
pub async fn fetch_tools(
    locator: &ServerLocator,
    io_timeout: Duration,
) -> McpResult<FetchedTools> {
    match locator {
        #[cfg(feature = "stdio")]
        ServerLocator::Stdio { command, args } => {
            let mut transport = crate::stdio::StdioTransport::spawn(command, args, io_timeout)?;
            let server_identity = transport.initialize().await?;
            let tools = transport.list_tools().await?;
            transport.close().await;
            Ok(FetchedTools {
                tools,
                server_identity,
            })
        }
        #[cfg(feature = "sse")]
        ServerLocator::Sse { endpoint } => {
            let mut transport = crate::sse::SseTransport::connect(endpoint, io_timeout).await?;
            let server_identity = transport.initialize().await?;
            let tools = transport.list_tools().await?;
            Ok(FetchedTools {
                tools,
                server_identity,
            })
        }
        #[cfg(feature = "http")]
        ServerLocator::Http { endpoint } => {
            let tools = crate::http::fetch(endpoint, io_timeout).await?;
            Ok(FetchedTools {
                tools,
                server_identity: None,
            })
        }
        #[allow(unreachable_patterns)]
        other => Err(McpError::Connection(format!(
            "transport for {} not enabled in this build",
            other
        ))),
    }
}

/// Cheap reachability check before a review or comparison session.
///
/// Stdio: the executable must resolve on PATH. HTTP/SSE: HEAD the endpoint,
/// falling back to GET when HEAD is unsupported; any status >= 400 fails.
pub async fn probe(locator: &ServerLocator, io_timeout: Duration) -> McpResult<()> {
    match locator {
        ServerLocator::Stdio { command, .. } => {
            which::which(command).map_err(|_| {
                McpError::Connection(format!("stdio server executable not found: {}", command))
            })?;
            Ok(())
        }
        #[cfg(any(feature = "sse", feature = "http"))]
        ServerLocator::Sse { endpoint } | ServerLocator::Http { endpoint } => {
            let client = reqwest::Client::builder()
                .timeout(io_timeout)
                .build()
                .map_err(|e| McpError::Connection(format!("failed to build HTTP client: {}", e)))?;

            let head = client.head(endpoint.clone()).send().await;
            let response = match head {
                Ok(response) if response.status() != reqwest::StatusCode::METHOD_NOT_ALLOWED => {
                    response
                }
                _ => client.get(endpoint.clone()).send().await.map_err(|e| {
                    McpError::Connection(format!("failed to reach server: {}", e))
                })?,
            };

            if response.status().as_u16() >= 400 {
                return Err(McpError::Connection(format!(
                    "server responded with error code: {}",
                    response.status().as_u16()
                )));
            }
            Ok(())
        }
        #[allow(unreachable_patterns)]
        other => Err(McpError::Connection(format!(
            "transport for {} not enabled in this build",
            other
        ))),
    }
}

/// Policy-enforcing session wrapper.
///
/// Composes a server locator with a policy: `list_tools` fetches the live
/// list and returns only the policy-approved subset. Use this in place of a
/// raw client wherever a model consumes the tool list; the underlying
/// transport is never modified, only wrapped.
#[derive(Debug, Clone)]
pub struct GatedSession {
    locator: ServerLocator,
    policy: Policy,
    io_timeout: Duration,
}

impl GatedSession {
    pub fn new(locator: ServerLocator, policy: Policy, io_timeout: Duration) -> Self {
        Self {
            locator,
            policy,
            io_timeout,
        }
    }

    /// Fetch the live tool list and reduce it to the approved subset.
    ///
    /// Approved tools with empty descriptions come back with the standard
    /// placeholder already injected.
    pub async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let fetched = fetch_tools(&self.locator, self.io_timeout).await?;
        let origin = fetched.origin(&self.locator);
        let kept = filter_tools(&fetched.tools, &self.policy, Some(&origin));
        tracing::debug!(
            live = fetched.tools.len(),
            approved = kept.len(),
            "gated tool list"
        );
        Ok(kept)
    }

    /// The policy this session enforces
    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn require_send<T: Send>(_: &T) {}

    // Compile-time check: these futures cross task boundaries (axum handlers,
    // tokio::spawn), so they must stay Send for every transport.
    #[test]
    fn test_fetch_and_session_futures_are_send() {
        let locator = ServerLocator::parse("http://localhost:1/sse", true).unwrap();
        let timeout = Duration::from_secs(1);

        let fetch = fetch_tools(&locator, timeout);
        require_send(&fetch);
        drop(fetch);

        let session = GatedSession::new(locator, Policy::new(), timeout);
        let list = session.list_tools();
        require_send(&list);
    }
}
