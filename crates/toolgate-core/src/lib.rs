//! Toolgate Core - checksum-pinned tool policy enforcement for MCP clients
//!
//! Validates that tools offered by a server still match a previously reviewed
//! set, detecting silent changes to a tool's name, description, or origin
//! server ("rug-pull" defense). This crate holds the policy model and all
//! decision logic; transports and UIs live elsewhere.

pub mod checksum;
pub mod compare;
pub mod error;
pub mod filter;
pub mod policy;
pub mod review;
pub mod snapshot;

// Re-export core types
pub use checksum::tool_checksum;
pub use compare::{compare, summarize, Classification, CompareSummary, ComparisonRecord};
pub use error::{GateError, GateResult};
pub use filter::{filter_tools, DEFAULT_DESCRIPTION};
pub use policy::{Policy, PolicyEntry, ServerInfo, ServerKind};
pub use review::{accept_all, build_policy, Choice};
pub use snapshot::{LiveTool, Snapshot, ToolDescriptor};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
