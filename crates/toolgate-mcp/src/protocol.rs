//! MCP JSON-RPC 2.0 message plumbing shared by the stdio and SSE transports

use serde_json::{json, Value};
use toolgate_core::ToolDescriptor;

use crate::error::{McpError, McpResult};

/// Protocol revision we advertise during the handshake
pub const MCP_VERSION: &str = "2024-11-05";

/// Build the `initialize` request
pub fn initialize_request(id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": MCP_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "toolgate",
                "version": toolgate_core::VERSION,
            },
        },
    })
}

/// Build the `notifications/initialized` notification (no response expected)
pub fn initialized_notification() -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized",
    })
}

/// Build the `tools/list` request
pub fn list_tools_request(id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/list",
        "params": {},
    })
}

/// Extract the result object from a JSON-RPC response, surfacing server-side
/// errors as [`McpError::Protocol`].
pub fn expect_result(response: &Value) -> McpResult<&Value> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(McpError::Protocol(format!("server error: {}", message)));
    }
    response
        .get("result")
        .ok_or_else(|| McpError::Protocol("response carries neither result nor error".to_string()))
}

/// True when `message` is the response to request `id`
pub fn is_response_to(message: &Value, id: u64) -> bool {
    message.get("id").and_then(Value::as_u64) == Some(id)
}

/// Pull the advertised server name out of an `initialize` result, if any
pub fn server_name(init_result: &Value) -> Option<String> {
    init_result
        .get("serverInfo")
        .and_then(|info| info.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalize a `tools/list` result into canonical descriptors.
///
/// Entries without a name are skipped individually with a warning; a result
/// whose `tools` field is not an array is a protocol error.
pub fn parse_tool_list(result: &Value) -> McpResult<Vec<ToolDescriptor>> {
    let tools = result
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| McpError::Protocol("tools/list result has no 'tools' array".to_string()))?;

    let mut parsed = Vec::with_capacity(tools.len());
    for tool in tools {
        let Some(name) = tool.get("name").and_then(Value::as_str) else {
            tracing::warn!("skipping tool without a name in tools/list response");
            continue;
        };
        let description = tool
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        parsed.push(ToolDescriptor::new(name, description));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_list_normalizes_entries() {
        let result = json!({
            "tools": [
                {"name": "echo", "description": "Echo text", "inputSchema": {}},
                {"name": "silent"},
                {"description": "no name, skipped"},
            ]
        });
        let tools = parse_tool_list(&result).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].description, "Echo text");
        assert_eq!(tools[1].description, "");
    }

    #[test]
    fn test_parse_tool_list_requires_array() {
        let err = parse_tool_list(&json!({"tools": "nope"})).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }

    #[test]
    fn test_expect_result_surfaces_server_error() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found: tools/list"},
        });
        let err = expect_result(&response).unwrap_err();
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn test_server_name_extraction() {
        let result = json!({"serverInfo": {"name": "smoke-test", "version": "0.2.0"}});
        assert_eq!(server_name(&result).as_deref(), Some("smoke-test"));
        assert_eq!(server_name(&json!({})), None);
    }
}
