//! Error types for toolgate-core

use thiserror::Error;

/// Errors produced by policy loading, snapshot handling, and enforcement
#[derive(Debug, Error)]
pub enum GateError {
    /// Policy document failed structural validation. Never silently repaired;
    /// the message carries enough context (section, tool name, expected shape)
    /// for a human to fix the document.
    #[error("Malformed policy: {0}")]
    MalformedPolicy(String),

    /// Fetched tool data is not in the expected shape
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Server unreachable or handshake failed
    #[error("Connection failure: {0}")]
    Connection(String),

    /// Underlying file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax error in a policy document
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias used across the crate
pub type GateResult<T> = Result<T, GateError>;
