//! Classifier / comparator - the single source of truth for tool status
//!
//! Given a policy and a live snapshot, every tool name in the union of the
//! two is classified into exactly one category. Both the human-facing
//! comparison table and the web review UI consume these records; no other
//! code re-implements the decision logic.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::policy::{Policy, PolicyEntry};
use crate::snapshot::Snapshot;

/// Final status of a tool after comparing policy against the live snapshot.
///
/// "Not matched" is a normal outcome, not an error: unknown tools simply
/// classify as [`Classification::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Name and checksum match an `allowed_tools` entry
    #[serde(rename = "allowed")]
    Allowed,
    /// Name and checksum match a `malicious_tools` entry
    #[serde(rename = "malicious")]
    Malicious,
    /// Name and checksum match a `denied_tools` entry
    #[serde(rename = "denied")]
    Denied,
    /// Name appears in some section but no stored checksum matches the live
    /// tool - the metadata drifted since review
    #[serde(rename = "unknown (checksum mismatch)")]
    ChecksumMismatch,
    /// Name appears in no section of the policy
    #[serde(rename = "unknown")]
    Unknown,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Allowed => write!(f, "allowed"),
            Classification::Malicious => write!(f, "malicious"),
            Classification::Denied => write!(f, "denied"),
            Classification::ChecksumMismatch => write!(f, "unknown (checksum mismatch)"),
            Classification::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-tool comparison result
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRecord {
    /// Tool name
    pub tool: String,
    /// Whether the server currently offers this tool
    pub on_server: bool,
    /// Whether the name appears in the allow list
    #[serde(rename = "allowed")]
    pub in_allowed: bool,
    /// Whether any section's stored checksum matched the live tool
    pub checksum_match: bool,
    /// Final classification (first match wins: malicious > denied > allowed)
    #[serde(rename = "type")]
    pub classification: Classification,
    /// Live description, falling back to the policy-declared one
    pub description: String,
}

/// Aggregate counts for a comparison run
#[derive(Debug, Clone, Serialize)]
pub struct CompareSummary {
    pub server_tools: usize,
    pub allowed_tools: usize,
    pub malicious_tools: usize,
    pub denied_tools: usize,
    /// Live tools whose checksum matched no section entry
    pub checksum_mismatches: usize,
}

/// True when `entry` matches the live tool's checksum.
///
/// A candidate only matches when the tool is actually live and the stored
/// checksum is present and byte-equal; an empty stored checksum never
/// matches.
fn entry_matches(entry: Option<&PolicyEntry>, live_checksum: Option<&str>) -> bool {
    match (entry, live_checksum) {
        (Some(entry), Some(live)) => !entry.checksum.is_empty() && entry.checksum == live,
        _ => false,
    }
}

/// Compare a policy against a live snapshot.
///
/// Produces one record per tool name in the union of the server's tool set
/// and all three policy sections, in sorted name order.
pub fn compare(policy: &Policy, snapshot: &Snapshot) -> Vec<ComparisonRecord> {
    let mut all_names: BTreeSet<&str> = snapshot.tools.keys().map(String::as_str).collect();
    all_names.extend(policy.allowed.keys().map(String::as_str));
    all_names.extend(policy.malicious.keys().map(String::as_str));
    all_names.extend(policy.denied.keys().map(String::as_str));

    let mut records = Vec::with_capacity(all_names.len());
    for name in all_names {
        let live = snapshot.get(name);
        let live_checksum = live.map(|t| t.checksum.as_str());
        let on_server = live.is_some();
        let in_allowed = policy.allowed.contains_key(name);

        // Evaluate the three candidates independently
        let malicious_match = entry_matches(policy.malicious.get(name), live_checksum);
        let denied_match = entry_matches(policy.denied.get(name), live_checksum);
        let allowed_match = entry_matches(policy.allowed.get(name), live_checksum);
        let checksum_match = malicious_match || denied_match || allowed_match;

        let name_in_section = on_server
            && (in_allowed
                || policy.malicious.contains_key(name)
                || policy.denied.contains_key(name));

        // Precedence: negative judgements win ties
        let classification = if malicious_match {
            Classification::Malicious
        } else if denied_match {
            Classification::Denied
        } else if allowed_match {
            Classification::Allowed
        } else if name_in_section {
            Classification::ChecksumMismatch
        } else {
            Classification::Unknown
        };

        let description = match live {
            Some(tool) => tool.description.clone(),
            None => policy
                .allowed
                .get(name)
                .or_else(|| policy.malicious.get(name))
                .or_else(|| policy.denied.get(name))
                .map(|e| e.description.clone())
                .unwrap_or_default(),
        };

        records.push(ComparisonRecord {
            tool: name.to_string(),
            on_server,
            in_allowed,
            checksum_match,
            classification,
            description,
        });
    }
    records
}

/// Summarize a comparison run
pub fn summarize(
    records: &[ComparisonRecord],
    policy: &Policy,
    snapshot: &Snapshot,
) -> CompareSummary {
    CompareSummary {
        server_tools: snapshot.len(),
        allowed_tools: policy.allowed.len(),
        malicious_tools: policy.malicious.len(),
        denied_tools: policy.denied.len(),
        checksum_mismatches: records
            .iter()
            .filter(|r| r.on_server && !r.checksum_match)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::tool_checksum;
    use crate::snapshot::ToolDescriptor;

    fn entry(name: &str, description: &str, server: Option<&str>) -> PolicyEntry {
        PolicyEntry {
            description: description.to_string(),
            server: server.map(str::to_string),
            checksum: tool_checksum(name, description, server),
        }
    }

    fn snapshot_of(tools: &[(&str, &str)], server: Option<&str>) -> Snapshot {
        let descriptors: Vec<ToolDescriptor> = tools
            .iter()
            .map(|(n, d)| ToolDescriptor::new(*n, *d))
            .collect();
        Snapshot::from_tools(&descriptors, server)
    }

    fn classify(records: &[ComparisonRecord], name: &str) -> Classification {
        records
            .iter()
            .find(|r| r.tool == name)
            .map(|r| r.classification)
            .unwrap()
    }

    #[test]
    fn test_clean_allow() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "Echo text", None));
        let snapshot = snapshot_of(&[("echo", "Echo text")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(records.len(), 1);
        assert_eq!(classify(&records, "echo"), Classification::Allowed);
        assert!(records[0].on_server);
        assert!(records[0].in_allowed);
        assert!(records[0].checksum_match);
    }

    #[test]
    fn test_malicious_wins_over_allowed() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "Echo text", None));
        policy
            .malicious
            .insert("echo".to_string(), entry("echo", "Echo text", None));
        let snapshot = snapshot_of(&[("echo", "Echo text")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "echo"), Classification::Malicious);
    }

    #[test]
    fn test_denied_wins_over_allowed() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "Echo text", None));
        policy
            .denied
            .insert("echo".to_string(), entry("echo", "Echo text", None));
        let snapshot = snapshot_of(&[("echo", "Echo text")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "echo"), Classification::Denied);
    }

    #[test]
    fn test_denied_without_allow_entry() {
        let mut policy = Policy::new();
        policy
            .denied
            .insert("rm".to_string(), entry("rm", "Remove files", None));
        let snapshot = snapshot_of(&[("rm", "Remove files")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "rm"), Classification::Denied);
    }

    #[test]
    fn test_description_drift_is_checksum_mismatch() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "v1", None));
        let snapshot = snapshot_of(&[("echo", "v2")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "echo"), Classification::ChecksumMismatch);
        assert!(!records[0].checksum_match);
    }

    #[test]
    fn test_tool_absent_from_policy_is_unknown() {
        let policy = Policy::new();
        let snapshot = snapshot_of(&[("surprise", "New tool")], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "surprise"), Classification::Unknown);
    }

    #[test]
    fn test_tool_absent_from_server_keeps_policy_description() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("gone".to_string(), entry("gone", "Was reviewed once", None));
        let snapshot = snapshot_of(&[], None);

        let records = compare(&policy, &snapshot);
        assert_eq!(classify(&records, "gone"), Classification::Unknown);
        let record = &records[0];
        assert!(!record.on_server);
        assert!(record.in_allowed);
        assert_eq!(record.description, "Was reviewed once");
    }

    #[test]
    fn test_empty_stored_checksum_never_matches() {
        let mut policy = Policy::new();
        policy.denied.insert(
            "rm".to_string(),
            PolicyEntry {
                description: "Remove files".to_string(),
                server: None,
                checksum: String::new(),
            },
        );
        let snapshot = snapshot_of(&[("rm", "Remove files")], None);

        let records = compare(&policy, &snapshot);
        // Name is known but nothing vouches for the bytes
        assert_eq!(classify(&records, "rm"), Classification::ChecksumMismatch);
    }

    #[test]
    fn test_server_bound_checksum_must_match_origin() {
        let origin = "http://localhost:8000/sse";
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "Echo text", Some(origin)));

        let same_origin = snapshot_of(&[("echo", "Echo text")], Some(origin));
        let records = compare(&policy, &same_origin);
        assert_eq!(classify(&records, "echo"), Classification::Allowed);

        let other_origin = snapshot_of(&[("echo", "Echo text")], Some("http://evil:9"));
        let records = compare(&policy, &other_origin);
        assert_eq!(classify(&records, "echo"), Classification::ChecksumMismatch);
    }

    #[test]
    fn test_records_are_sorted_by_name() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("zeta".to_string(), entry("zeta", "z", None));
        let snapshot = snapshot_of(&[("alpha", "a"), ("mid", "m")], None);

        let records = compare(&policy, &snapshot);
        let names: Vec<&str> = records.iter().map(|r| r.tool.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_summary_counts() {
        let mut policy = Policy::new();
        policy
            .allowed
            .insert("echo".to_string(), entry("echo", "v1", None));
        policy
            .malicious
            .insert("evil".to_string(), entry("evil", "e", None));
        let snapshot = snapshot_of(&[("echo", "v2"), ("new", "n")], None);

        let records = compare(&policy, &snapshot);
        let summary = summarize(&records, &policy, &snapshot);
        assert_eq!(summary.server_tools, 2);
        assert_eq!(summary.allowed_tools, 1);
        assert_eq!(summary.malicious_tools, 1);
        assert_eq!(summary.denied_tools, 0);
        // Both live tools failed to match any stored checksum
        assert_eq!(summary.checksum_mismatches, 2);
    }
}
