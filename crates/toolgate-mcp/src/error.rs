//! Fetcher errors

use thiserror::Error;

/// Errors from connecting to a server and fetching its tool list
#[derive(Debug, Error)]
pub enum McpError {
    /// Locator string is not `stdio:<command>` or an http(s) URL
    #[error("Invalid server locator: {0}")]
    InvalidLocator(String),

    /// Server unreachable, probe failed, or subprocess could not start
    #[error("Connection failure: {0}")]
    Connection(String),

    /// Server spoke, but not the protocol we expected
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The caller-supplied timeout elapsed
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),
}

pub type McpResult<T> = Result<T, McpError>;
