//! Smoke-test MCP server - a minimal stdio MCP implementation for testing
//!
//! Speaks just enough of the protocol for toolgate's fetcher and CLI tests:
//! initialize, tools/list, tools/call. Tools:
//! - echo: returns the input string (basic connectivity)
//! - add: adds two numbers (parameter passing)
//! - undescribed: a tool that advertises no description (placeholder-injection
//!   testing)
//!
//! Run with: cargo run --release --bin smoke-test-mcp

use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

const MCP_VERSION: &str = "2024-11-05";

fn main() {
    // Logging goes to stderr; stdout is the protocol channel
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(io::stderr)
        .init();

    info!("Starting smoke-test MCP server");

    let stdin = io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let Ok(line) = line else { break };
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        let Ok(request) = serde_json::from_str::<Value>(&line) else {
            respond(&json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": "Parse error" }
            }));
            continue;
        };

        let Some(method) = request.get("method").and_then(Value::as_str) else {
            continue;
        };
        let req_id = request.get("id").cloned().unwrap_or(Value::Null);

        let response = match method {
            "initialize" => handle_initialize(&req_id),
            "tools/list" => handle_list_tools(&req_id),
            "tools/call" => handle_tool_call(&request, &req_id),
            // Client notification, no response expected
            "notifications/initialized" => continue,
            _ => json!({
                "jsonrpc": "2.0",
                "id": req_id,
                "error": {
                    "code": -32601,
                    "message": format!("Method not found: {}", method)
                }
            }),
        };
        respond(&response);
    }
}

fn respond(response: &Value) {
    if let Ok(json_str) = serde_json::to_string(response) {
        println!("{}", json_str);
        let _ = io::stdout().flush();
    }
}

fn handle_initialize(req_id: &Value) -> Value {
    info!("Received initialize request");
    json!({
        "jsonrpc": "2.0",
        "id": req_id,
        "result": {
            "protocolVersion": MCP_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": "smoke-test-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }
    })
}

fn handle_list_tools(req_id: &Value) -> Value {
    info!("Listing available tools");
    json!({
        "jsonrpc": "2.0",
        "id": req_id,
        "result": {
            "tools": [
                {
                    "name": "echo",
                    "description": "Echo the input string - tests basic connectivity",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string", "description": "The message to echo" }
                        },
                        "required": ["message"]
                    }
                },
                {
                    "name": "add",
                    "description": "Add two numbers together",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "a": { "type": "number", "description": "First number" },
                            "b": { "type": "number", "description": "Second number" }
                        },
                        "required": ["a", "b"]
                    }
                },
                {
                    "name": "undescribed",
                    "inputSchema": {
                        "type": "object",
                        "properties": {}
                    }
                }
            ]
        }
    })
}

fn handle_tool_call(request: &Value, req_id: &Value) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let tool = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let text = match tool {
        "echo" => args
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        "add" => {
            let a = args.get("a").and_then(Value::as_f64).unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            format!("{}", a + b)
        }
        "undescribed" => "ok".to_string(),
        _ => {
            return json!({
                "jsonrpc": "2.0",
                "id": req_id,
                "error": {
                    "code": -32602,
                    "message": format!("Unknown tool: {}", tool)
                }
            });
        }
    };

    json!({
        "jsonrpc": "2.0",
        "id": req_id,
        "result": {
            "content": [ { "type": "text", "text": text } ]
        }
    })
}
