//! Tool identity checksums
//!
//! A tool's identity is the tuple (name, description, origin server). The
//! checksum commits to that identity at review time; any later drift in the
//! description (including invisible formatting edits) invalidates the match
//! and forces re-review.

use sha2::{Digest, Sha256};

/// Calculate the identity checksum for a tool.
///
/// When `server` is known it is bound into the digest, so a same-named tool
/// served from a different origin never matches a prior approval. Without a
/// server name the digest degrades to `name:description` only, which is a
/// weaker binding (stdio servers without a stable identity).
///
/// No case or whitespace normalization is applied: matching is byte-exact.
pub fn tool_checksum(name: &str, description: &str, server: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    match server {
        Some(server) => {
            hasher.update(server.as_bytes());
            hasher.update(b":");
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(description.as_bytes());
        }
        None => {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(description.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}
