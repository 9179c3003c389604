//! MCP tool snapshot fetcher for toolgate
//!
//! This crate is the external-collaborator boundary of the system: it knows
//! how to dial a server (subprocess stdio, MCP-over-SSE, or a plain HTTP
//! tool registry) and comes back with the one thing the core needs - the
//! live `{name, description}` list plus, when available, the server's own
//! identity. All enforcement decisions stay in `toolgate-core`.

pub mod client;
pub mod error;
pub mod locator;
pub mod protocol;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "sse")]
pub mod sse;
#[cfg(feature = "stdio")]
pub mod stdio;

pub use client::{fetch_tools, probe, FetchedTools, GatedSession};
pub use error::{McpError, McpResult};
pub use locator::ServerLocator;
