//! Review session output - building a policy from per-tool verdicts
//!
//! Shared by the interactive CLI review, the `--yes` auto-accept pass, and
//! the web review UI, so all three produce byte-identical policy documents
//! for the same verdicts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checksum::tool_checksum;
use crate::policy::{Policy, PolicyEntry, ServerInfo, ServerKind};
use crate::snapshot::ToolDescriptor;

/// Reviewer verdict for a single tool. Tools without a verdict are ignored
/// (recorded in no section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Allow,
    Deny,
    Malicious,
}

/// Build a policy document from reviewed tools and verdicts.
///
/// Descriptions are recorded verbatim and the checksum is computed over the
/// exact bytes that were reviewed, bound to `server_name`.
pub fn build_policy(
    tools: &[ToolDescriptor],
    choices: &HashMap<String, Choice>,
    server_name: &str,
    kind: ServerKind,
) -> Policy {
    let mut policy = Policy::new();
    policy.server = Some(ServerInfo {
        name: server_name.to_string(),
        kind,
    });

    for tool in tools {
        let Some(choice) = choices.get(&tool.name) else {
            continue;
        };
        let entry = PolicyEntry {
            description: tool.description.clone(),
            server: Some(server_name.to_string()),
            checksum: tool_checksum(&tool.name, &tool.description, Some(server_name)),
        };
        let section = match choice {
            Choice::Allow => &mut policy.allowed,
            Choice::Deny => &mut policy.denied,
            Choice::Malicious => &mut policy.malicious,
        };
        section.insert(tool.name.clone(), entry);
    }
    policy
}

/// Build a policy that allows every fetched tool (the `--yes` pass)
pub fn accept_all(tools: &[ToolDescriptor], server_name: &str, kind: ServerKind) -> Policy {
    let choices = tools
        .iter()
        .map(|t| (t.name.clone(), Choice::Allow))
        .collect();
    build_policy(tools, &choices, server_name, kind)
}
