//! Policy store - the three-section allow/deny/malicious document
//!
//! A policy is created by a human review session (or an auto-accept pass),
//! persisted as YAML, and loaded fresh on each run. Two on-disk forms are
//! supported:
//!
//! - Structured (current): `config_version`, optional `server` info, and the
//!   three sections `allowed_tools`, `malicious_tools`, `denied_tools`.
//! - Legacy flat: a single `{name: checksum}` mapping, which implies
//!   `allowed_tools` only.
//!
//! Both forms normalize to the same in-memory [`Policy`]. Structural problems
//! are always a hard [`GateError::MalformedPolicy`], never silently repaired.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{GateError, GateResult};

/// Transport type of the server a policy was reviewed against
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// Standard I/O transport (stdin/stdout with local process)
    #[default]
    Stdio,
    /// Server-Sent Events transport
    Sse,
    /// HTTP request/response transport
    Http,
}

impl std::fmt::Display for ServerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerKind::Stdio => write!(f, "stdio"),
            ServerKind::Sse => write!(f, "sse"),
            ServerKind::Http => write!(f, "http"),
        }
    }
}

/// Identity of the server a policy document was generated from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name or locator (URL, or the stdio command line)
    pub name: String,
    /// Transport the review ran over
    #[serde(rename = "type", default)]
    pub kind: ServerKind,
}

/// One reviewed tool inside a policy section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyEntry {
    /// Description text as reviewed, verbatim (multi-line preserved)
    #[serde(default)]
    pub description: String,

    /// Server origin the checksum was computed against. When absent, the
    /// connection's own origin is used at enforcement time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Identity checksum recorded at review time. Denied/malicious entries in
    /// legacy documents may lack one; an empty checksum never matches.
    #[serde(default)]
    pub checksum: String,
}

impl PolicyEntry {
    /// Entry carrying only a checksum (legacy flat form)
    pub fn from_checksum(checksum: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            server: None,
            checksum: checksum.into(),
        }
    }
}

/// The three-section tool policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// Document schema version
    pub config_version: u32,
    /// Server the policy was reviewed against, when recorded
    pub server: Option<ServerInfo>,
    /// Tools approved for use, keyed by name
    pub allowed: BTreeMap<String, PolicyEntry>,
    /// Tools flagged as malicious; excluded regardless of `allowed`
    pub malicious: BTreeMap<String, PolicyEntry>,
    /// Tools denied without a malice judgement; excluded regardless of `allowed`
    pub denied: BTreeMap<String, PolicyEntry>,
}

const SECTIONS: [&str; 3] = ["allowed_tools", "malicious_tools", "denied_tools"];

/// Serialization shape: field order here is the on-disk key order.
#[derive(Serialize)]
struct PolicyDoc<'a> {
    config_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<&'a ServerInfo>,
    allowed_tools: &'a BTreeMap<String, PolicyEntry>,
    malicious_tools: &'a BTreeMap<String, PolicyEntry>,
    denied_tools: &'a BTreeMap<String, PolicyEntry>,
}

impl Policy {
    /// Empty policy (structured form, version 1)
    pub fn new() -> Self {
        Self {
            config_version: 1,
            ..Default::default()
        }
    }

    /// Load a policy document from a file
    pub fn load(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GateError::MalformedPolicy(format!(
                "cannot read policy file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a policy document, detecting structured vs legacy flat form
    pub fn from_yaml(content: &str) -> GateResult<Self> {
        let doc: Value = serde_yaml::from_str(content)?;

        let Value::Mapping(mapping) = doc else {
            return Err(GateError::MalformedPolicy(
                "document must be a YAML mapping/object".to_string(),
            ));
        };

        let has_sections = SECTIONS
            .iter()
            .any(|s| mapping.contains_key(*s));

        if !has_sections {
            return Self::from_legacy(&mapping);
        }

        let mut policy = Policy::new();

        if let Some(version) = mapping.get("config_version") {
            policy.config_version = version.as_u64().ok_or_else(|| {
                GateError::MalformedPolicy("'config_version' must be an integer".to_string())
            })? as u32;
        }

        if let Some(server) = mapping.get("server") {
            let info: ServerInfo = serde_yaml::from_value(server.clone()).map_err(|e| {
                GateError::MalformedPolicy(format!("invalid 'server' block: {}", e))
            })?;
            policy.server = Some(info);
        }

        for section in SECTIONS {
            let value = mapping.get(section).ok_or_else(|| {
                GateError::MalformedPolicy(format!("Missing required section: '{}'", section))
            })?;
            let entries = parse_section(section, value)?;
            match section {
                "allowed_tools" => policy.allowed = entries,
                "malicious_tools" => policy.malicious = entries,
                _ => policy.denied = entries,
            }
        }

        Ok(policy)
    }

    /// Normalize the legacy flat `{name: checksum}` form
    fn from_legacy(mapping: &serde_yaml::Mapping) -> GateResult<Self> {
        let mut policy = Policy::new();
        for (key, value) in mapping {
            let name = key.as_str().ok_or_else(|| {
                GateError::MalformedPolicy("tool names must be strings".to_string())
            })?;
            let checksum = value.as_str().ok_or_else(|| {
                GateError::MalformedPolicy(format!(
                    "legacy entry '{}' must be a checksum string (or the document \
                     must declare allowed_tools/malicious_tools/denied_tools sections)",
                    name
                ))
            })?;
            policy
                .allowed
                .insert(name.to_string(), PolicyEntry::from_checksum(checksum));
        }
        tracing::debug!(
            tools = policy.allowed.len(),
            "loaded legacy flat policy document"
        );
        Ok(policy)
    }

    /// Serialize to YAML with deterministic key order
    pub fn to_yaml(&self) -> GateResult<String> {
        let doc = PolicyDoc {
            config_version: self.config_version,
            server: self.server.as_ref(),
            allowed_tools: &self.allowed,
            malicious_tools: &self.malicious,
            denied_tools: &self.denied,
        };
        Ok(serde_yaml::to_string(&doc)?)
    }

    /// Save the policy to a file, appending `.yaml` when no YAML extension is
    /// present. Returns the path actually written.
    pub fn save(&self, path: impl AsRef<Path>) -> GateResult<PathBuf> {
        let path = path.as_ref();
        let path = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => path.to_path_buf(),
            _ => PathBuf::from(format!("{}.yaml", path.display())),
        };
        std::fs::write(&path, self.to_yaml()?)?;
        tracing::info!(path = %path.display(), "policy saved");
        Ok(path)
    }

    /// Total number of reviewed tools across all sections
    pub fn len(&self) -> usize {
        self.allowed.len() + self.malicious.len() + self.denied.len()
    }

    /// True when no section contains any tool
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_section(section: &str, value: &Value) -> GateResult<BTreeMap<String, PolicyEntry>> {
    let Value::Mapping(entries) = value else {
        return Err(GateError::MalformedPolicy(format!(
            "Section '{}' must be a mapping/object",
            section
        )));
    };

    let mut parsed = BTreeMap::new();
    for (key, value) in entries {
        let name = key.as_str().ok_or_else(|| {
            GateError::MalformedPolicy(format!(
                "tool names in section '{}' must be strings",
                section
            ))
        })?;
        let entry = parse_entry(section, name, value)?;
        parsed.insert(name.to_string(), entry);
    }
    Ok(parsed)
}

fn parse_entry(section: &str, name: &str, value: &Value) -> GateResult<PolicyEntry> {
    match value {
        // Legacy checksum-only entry inside a structured section
        Value::String(checksum) => Ok(PolicyEntry::from_checksum(checksum.clone())),
        Value::Mapping(_) => {
            let entry: PolicyEntry = serde_yaml::from_value(value.clone()).map_err(|e| {
                GateError::MalformedPolicy(format!(
                    "tool '{}' in section '{}': {}",
                    name, section, e
                ))
            })?;
            // The allow list is the positive commitment; it is unusable
            // without a checksum. Denied/malicious tolerate a bare name.
            if section == "allowed_tools" && entry.checksum.is_empty() {
                return Err(GateError::MalformedPolicy(format!(
                    "tool '{}' in section '{}' is missing required field 'checksum'",
                    name, section
                )));
            }
            Ok(entry)
        }
        _ => Err(GateError::MalformedPolicy(format!(
            "tool '{}' in section '{}' must be a mapping with description/checksum \
             or a checksum string",
            name, section
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured_doc() -> &'static str {
        r#"
config_version: 1
server:
  name: http://localhost:8000/sse
  type: sse
allowed_tools:
  echo:
    description: Echo the input text
    server: http://localhost:8000/sse
    checksum: abc123
malicious_tools:
  evil:
    description: desc
    checksum: deadbeef
denied_tools:
  bad:
    description: desc
    checksum: cafebabe
"#
    }

    #[test]
    fn test_load_structured_document() {
        let policy = Policy::from_yaml(structured_doc()).unwrap();
        assert_eq!(policy.config_version, 1);
        assert_eq!(policy.server.as_ref().unwrap().kind, ServerKind::Sse);
        assert_eq!(policy.allowed["echo"].checksum, "abc123");
        assert_eq!(
            policy.allowed["echo"].server.as_deref(),
            Some("http://localhost:8000/sse")
        );
        assert_eq!(policy.malicious["evil"].checksum, "deadbeef");
        assert_eq!(policy.denied["bad"].checksum, "cafebabe");
    }

    #[test]
    fn test_load_legacy_flat_document() {
        let policy = Policy::from_yaml("echo: abcdef0123456789\n").unwrap();
        assert_eq!(policy.allowed.len(), 1);
        assert_eq!(policy.allowed["echo"].checksum, "abcdef0123456789");
        assert!(policy.allowed["echo"].description.is_empty());
        assert!(policy.denied.is_empty());
        assert!(policy.malicious.is_empty());
    }

    #[test]
    fn test_missing_section_is_malformed() {
        let doc = "allowed_tools: {}\nmalicious_tools: {}\n";
        let err = Policy::from_yaml(doc).unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing required section: 'denied_tools'"));
    }

    #[test]
    fn test_section_must_be_mapping() {
        let doc = "allowed_tools: []\nmalicious_tools: {}\ndenied_tools: {}\n";
        let err = Policy::from_yaml(doc).unwrap_err();
        assert!(err
            .to_string()
            .contains("Section 'allowed_tools' must be a mapping/object"));
    }

    #[test]
    fn test_document_must_be_mapping() {
        let err = Policy::from_yaml("- 1\n- 2\n").unwrap_err();
        assert!(matches!(err, GateError::MalformedPolicy(_)));
    }

    #[test]
    fn test_allowed_entry_requires_checksum() {
        let doc = r#"
allowed_tools:
  echo:
    description: no checksum here
malicious_tools: {}
denied_tools: {}
"#;
        let err = Policy::from_yaml(doc).unwrap_err();
        assert!(err.to_string().contains("missing required field 'checksum'"));
    }

    #[test]
    fn test_checksum_string_entry_in_structured_section() {
        let doc = "allowed_tools:\n  echo: abc123\nmalicious_tools: {}\ndenied_tools: {}\n";
        let policy = Policy::from_yaml(doc).unwrap();
        assert_eq!(policy.allowed["echo"].checksum, "abc123");
    }

    #[test]
    fn test_denied_entry_may_omit_checksum() {
        let doc = r#"
allowed_tools: {}
malicious_tools: {}
denied_tools:
  rm:
    description: removes things
"#;
        let policy = Policy::from_yaml(doc).unwrap();
        assert!(policy.denied["rm"].checksum.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_policy() {
        let policy = Policy::from_yaml(structured_doc()).unwrap();
        let reloaded = Policy::from_yaml(&policy.to_yaml().unwrap()).unwrap();
        assert_eq!(policy, reloaded);
    }

    #[test]
    fn test_round_trip_preserves_multiline_description() {
        let mut policy = Policy::new();
        policy.allowed.insert(
            "doc_tool".to_string(),
            PolicyEntry {
                description: "Line one\nLine two\n\nLine four".to_string(),
                server: None,
                checksum: "abc".to_string(),
            },
        );
        let reloaded = Policy::from_yaml(&policy.to_yaml().unwrap()).unwrap();
        assert_eq!(
            reloaded.allowed["doc_tool"].description,
            "Line one\nLine two\n\nLine four"
        );
    }

    #[test]
    fn test_save_appends_yaml_extension() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Policy::new();
        let written = policy.save(dir.path().join("config")).unwrap();
        assert_eq!(written.extension().unwrap(), "yaml");
        assert!(written.exists());
    }

    #[test]
    fn test_save_key_order_is_stable() {
        let policy = Policy::from_yaml(structured_doc()).unwrap();
        let yaml = policy.to_yaml().unwrap();
        let version_at = yaml.find("config_version").unwrap();
        let server_at = yaml.find("server").unwrap();
        let allowed_at = yaml.find("allowed_tools").unwrap();
        let malicious_at = yaml.find("malicious_tools").unwrap();
        let denied_at = yaml.find("denied_tools").unwrap();
        assert!(version_at < server_at);
        assert!(server_at < allowed_at);
        assert!(allowed_at < malicious_at);
        assert!(malicious_at < denied_at);
    }
}
