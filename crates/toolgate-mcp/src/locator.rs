//! Server locators
//!
//! A locator names where the tool list comes from: a local subprocess
//! (`stdio:<command and args>`) or a network endpoint (`http(s)://...`),
//! with SSE selected explicitly by the caller for MCP-over-SSE endpoints.

use toolgate_core::ServerKind;
use url::Url;

use crate::error::{McpError, McpResult};

/// Parsed server locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLocator {
    /// Launch a subprocess and speak MCP over stdin/stdout
    Stdio {
        command: String,
        args: Vec<String>,
    },
    /// MCP over Server-Sent Events at this endpoint
    Sse { endpoint: Url },
    /// Plain HTTP endpoint returning a JSON tool mapping
    Http { endpoint: Url },
}

impl ServerLocator {
    /// Parse a CLI locator string. `sse` selects the SSE transport for
    /// http(s) URLs; `stdio:` prefixed strings always launch a subprocess.
    pub fn parse(raw: &str, sse: bool) -> McpResult<Self> {
        if let Some(command_line) = raw.strip_prefix("stdio:") {
            let mut parts = command_line.split_whitespace().map(str::to_string);
            let command = parts.next().ok_or_else(|| {
                McpError::InvalidLocator("stdio locator has no command".to_string())
            })?;
            return Ok(ServerLocator::Stdio {
                command,
                args: parts.collect(),
            });
        }

        let endpoint = Url::parse(raw)
            .map_err(|e| McpError::InvalidLocator(format!("{}: {}", raw, e)))?;
        match endpoint.scheme() {
            "http" | "https" => Ok(if sse {
                ServerLocator::Sse { endpoint }
            } else {
                ServerLocator::Http { endpoint }
            }),
            scheme => Err(McpError::InvalidLocator(format!(
                "invalid scheme '{}'; use stdio: for subprocess, or http(s):// for \
                 network servers",
                scheme
            ))),
        }
    }

    /// Transport kind, for recording in a policy's server block
    pub fn kind(&self) -> ServerKind {
        match self {
            ServerLocator::Stdio { .. } => ServerKind::Stdio,
            ServerLocator::Sse { .. } => ServerKind::Sse,
            ServerLocator::Http { .. } => ServerKind::Http,
        }
    }
}

impl std::fmt::Display for ServerLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerLocator::Stdio { command, args } => {
                write!(f, "stdio:{}", command)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            ServerLocator::Sse { endpoint } | ServerLocator::Http { endpoint } => {
                write!(f, "{}", endpoint)
            }
        }
    }
}
