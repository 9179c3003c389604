//! Runtime enforcement filter
//!
//! This is the gate an agent-facing shim calls before exposing a server's
//! tool list to a model. Everything not positively approved - by name AND
//! checksum - is dropped; denied/malicious names are dropped even when they
//! also appear in the allow list.

use crate::checksum::tool_checksum;
use crate::policy::Policy;
use crate::snapshot::ToolDescriptor;

/// Placeholder injected when an approved tool ships without a description, so
/// downstream consumers never see empty text.
pub const DEFAULT_DESCRIPTION: &str = "No description provided (client override)";

/// Reduce a live tool list to the policy-approved subset.
///
/// A tool survives iff:
/// - its name is in `allowed_tools`,
/// - its name is in neither `malicious_tools` nor `denied_tools`,
/// - the checksum of its live metadata equals the allow entry's stored
///   checksum, computed against the entry's recorded `server` origin or,
///   when the entry omits one, against `origin` (the connection's own).
///
/// Inputs are never mutated: survivors are returned as fresh copies, with
/// [`DEFAULT_DESCRIPTION`] substituted for empty descriptions. The function
/// is pure and idempotent; callers may invoke it concurrently.
pub fn filter_tools(
    tools: &[ToolDescriptor],
    policy: &Policy,
    origin: Option<&str>,
) -> Vec<ToolDescriptor> {
    let mut kept = Vec::new();
    for tool in tools {
        let Some(entry) = policy.allowed.get(&tool.name) else {
            tracing::debug!(tool = %tool.name, "filtered: not in allow list");
            continue;
        };
        if policy.malicious.contains_key(&tool.name) {
            tracing::warn!(tool = %tool.name, "filtered: flagged malicious");
            continue;
        }
        if policy.denied.contains_key(&tool.name) {
            tracing::debug!(tool = %tool.name, "filtered: denied");
            continue;
        }

        let server = entry.server.as_deref().or(origin);
        let live_checksum = tool_checksum(&tool.name, &tool.description, server);
        if entry.checksum.is_empty() || live_checksum != entry.checksum {
            tracing::warn!(
                tool = %tool.name,
                expected = %entry.checksum,
                found = %live_checksum,
                "filtered: checksum mismatch"
            );
            continue;
        }

        let description = if tool.description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            tool.description.clone()
        };
        kept.push(ToolDescriptor {
            name: tool.name.clone(),
            description,
        });
    }
    kept
}
