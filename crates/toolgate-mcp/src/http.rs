//! Plain HTTP transport: a GET endpoint returning a JSON mapping of
//! `name -> {description}`. Used by simple tool registries that don't speak
//! the full MCP protocol.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use toolgate_core::ToolDescriptor;

use crate::error::{McpError, McpResult};

/// Fetch and normalize a plain-HTTP tool mapping.
///
/// Entries that are not mappings or lack a description are skipped
/// individually (partial-failure tolerance); a non-mapping body is a
/// protocol error.
pub async fn fetch(endpoint: &Url, io_timeout: Duration) -> McpResult<Vec<ToolDescriptor>> {
    let client = reqwest::Client::builder()
        .timeout(io_timeout)
        .build()
        .map_err(|e| McpError::Connection(format!("failed to build HTTP client: {}", e)))?;

    let response = client
        .get(endpoint.clone())
        .send()
        .await
        .map_err(|e| McpError::Connection(format!("failed to connect to server: {}", e)))?
        .error_for_status()
        .map_err(|e| McpError::Connection(format!("server returned error: {}", e)))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| McpError::Protocol(format!("invalid response format from server: {}", e)))?;

    parse_tool_mapping(&body)
}

/// Normalize the `{name: {description}}` body shape
pub(crate) fn parse_tool_mapping(body: &Value) -> McpResult<Vec<ToolDescriptor>> {
    let Value::Object(entries) = body else {
        return Err(McpError::Protocol(
            "tool listing must be a JSON object".to_string(),
        ));
    };

    let mut tools = Vec::with_capacity(entries.len());
    for (name, info) in entries {
        let Value::Object(info) = info else {
            tracing::warn!(tool = %name, "skipping non-object tool entry");
            continue;
        };
        let Some(description) = info.get("description").and_then(Value::as_str) else {
            tracing::warn!(tool = %name, "skipping tool entry without a description");
            continue;
        };
        tools.push(ToolDescriptor::new(name.clone(), description));
    }
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tool_mapping() {
        let body = json!({
            "echo": {"description": "Echo text"},
            "bad": "not an object",
            "nodesc": {"schema": {}},
        });
        let tools = parse_tool_mapping(&body).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
    }

    #[test]
    fn test_non_object_body_is_protocol_error() {
        let err = parse_tool_mapping(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }
}
