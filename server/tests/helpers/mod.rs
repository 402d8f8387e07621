//! Test harness for MCP tool integration tests.
//!
//! Builds a `Registry` over fixture repositories in a temp dir, then
//! dispatches JSON-RPC requests via `dispatch_jsonrpc()` directly (no
//! subprocess, no transport).

pub mod fixtures;

use repolens_server::mcp::dispatch_jsonrpc;
use repolens_server::types::Registry;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tempfile::TempDir;

pub struct TestHarness {
    pub state: Arc<RwLock<Registry>>,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a harness with the standard two-repository fixture layout:
    /// `docs` (active) and `sdk`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let docs = temp_dir.path().join("docs");
        let sdk = temp_dir.path().join("sdk");
        fixtures::write_docs_repo(&docs);
        fixtures::write_sdk_repo(&sdk);

        let registry = Registry::new(
            vec![("docs".to_string(), docs), ("sdk".to_string(), sdk)],
            Some("docs".to_string()),
        )
        .expect("Failed to build registry");

        TestHarness { state: Arc::new(RwLock::new(registry)), _temp_dir: temp_dir }
    }

    /// Send a JSON-RPC request and return the response.
    pub fn dispatch(&mut self, msg: Value) -> Option<Value> {
        dispatch_jsonrpc(&self.state, &msg)
    }

    /// Call an MCP tool by name with the given arguments. Returns (text, is_error).
    pub fn call_tool(&mut self, tool: &str, args: Value) -> (String, bool) {
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": tool,
                "arguments": args
            }
        });
        let resp = self.dispatch(msg).expect("Expected response for tools/call");
        let result = &resp["result"];
        let text = result["content"][0]["text"].as_str().unwrap_or("").to_string();
        let is_error = result["isError"].as_bool().unwrap_or(false);
        (text, is_error)
    }

    /// Call a tool and parse its text payload as JSON.
    pub fn call_tool_json(&mut self, tool: &str, args: Value) -> Value {
        let (text, is_error) = self.call_tool(tool, args);
        assert!(!is_error, "{tool} returned error: {text}");
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("{tool} returned non-JSON ({e}): {text}"))
    }

    /// Read an MCP resource and return the first contents entry.
    pub fn read_resource(&mut self, uri: &str) -> Value {
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "resources/read",
            "params": { "uri": uri }
        });
        let resp = self.dispatch(msg).expect("Expected response for resources/read");
        resp["result"]["contents"][0].clone()
    }

    /// Send an initialize request and return the response.
    pub fn initialize(&mut self) -> Value {
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "0.1.0" }
            }
        });
        self.dispatch(msg).expect("Expected initialize response")
    }
}
