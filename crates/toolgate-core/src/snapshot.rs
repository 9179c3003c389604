//! Live tool snapshots
//!
//! A snapshot is the set of tools a server offers right now, with checksums
//! computed locally at fetch time. Snapshots are recomputed per connection and
//! never persisted; the server is never trusted to supply its own digests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::checksum::tool_checksum;

/// Canonical tool record at the fetcher boundary.
///
/// Every external representation (MCP tool objects, HTTP JSON mappings, web
/// API payloads) is normalized into this shape before it reaches the
/// classifier or filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Tool name as advertised by the server
    pub name: String,
    /// Description text, verbatim
    #[serde(default)]
    pub description: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// One tool as observed live, with its locally computed checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTool {
    pub description: String,
    pub checksum: String,
}

/// The live tool set fetched from a server at connection time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Server origin the checksums were bound to, when known
    pub server: Option<String>,
    /// Tools keyed by name
    pub tools: BTreeMap<String, LiveTool>,
}

impl Snapshot {
    /// Build a snapshot from fetched descriptors, computing every checksum
    /// locally against `server`.
    ///
    /// Entries with an empty name are skipped individually rather than
    /// aborting the snapshot (partial-failure tolerance).
    pub fn from_tools(tools: &[ToolDescriptor], server: Option<&str>) -> Self {
        let mut snapshot = Snapshot {
            server: server.map(str::to_string),
            tools: BTreeMap::new(),
        };
        for tool in tools {
            if tool.name.is_empty() {
                tracing::warn!("skipping tool with empty name in server response");
                continue;
            }
            snapshot.tools.insert(
                tool.name.clone(),
                LiveTool {
                    description: tool.description.clone(),
                    checksum: tool_checksum(&tool.name, &tool.description, server),
                },
            );
        }
        snapshot
    }

    /// Look up a live tool by name
    pub fn get(&self, name: &str) -> Option<&LiveTool> {
        self.tools.get(name)
    }

    /// Number of live tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
