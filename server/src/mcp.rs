//! MCP JSON-RPC server (stdio transport).
//!
//! The transport layer owns no inspection logic: handlers decode arguments,
//! resolve the active repository, call the core modules, and render results
//! as pretty-printed JSON (indentation preserved, non-ASCII unescaped).

use crate::compare::compare;
use crate::extract::{extract, FileContent};
use crate::related::find_similar;
use crate::scan::{list_files, summarize};
use crate::search::search;
use crate::types::*;
use base64::Engine as _;
use serde::Serialize;
use std::io::{self, BufRead, Write as IoWrite};
use std::sync::{Arc, RwLock};

// ---------------------------------------------------------------------------
// Rendering helpers
// ---------------------------------------------------------------------------

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn string_args(args: &serde_json::Value, key: &str) -> Vec<String> {
    args[key]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect())
        .unwrap_or_default()
}

fn mime_for_image(format: &str) -> String {
    match format {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

// ---------------------------------------------------------------------------
// Tool definitions
// ---------------------------------------------------------------------------

fn tool_definitions() -> serde_json::Value {
    serde_json::json!([
        {
            "name": "switch_repository",
            "description": "Switch the active repository. Subsequent calls that omit a repository name target the new selection.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "repo_name": { "type": "string", "description": "Name of the repository to activate" }
                },
                "required": ["repo_name"]
            }
        },
        {
            "name": "list_repositories",
            "description": "List every registered repository with its root path, whether it is active, and whether the root exists on disk.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        },
        {
            "name": "read_file",
            "description": "Read a file's content. Text files are returned verbatim; notebook documents are rendered cell by cell. Binary formats cannot be displayed.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path relative to the repository root" },
                    "repo_name": { "type": "string", "description": "Repository to read from (default: active repository)" }
                },
                "required": ["file_path"]
            }
        },
        {
            "name": "search_repositories",
            "description": "Case-insensitive substring search across every registered repository. Returns per-file occurrence counts and up to 5 matching lines with 1-based line numbers, grouped by repository.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Keyword to search for" },
                    "extensions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "File extensions to search (e.g. [\".py\", \".md\"]). Default: .py, .md, .txt"
                    }
                },
                "required": ["query"]
            }
        },
        {
            "name": "find_similar_files",
            "description": "Find files related to a reference file in the active repository: same stem with the requested extensions, stem-prefix name matches, and files in the same directory.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Reference file path relative to the repository root" },
                    "extensions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Extensions to match in the same-stem pass (default: the reference's own extension)"
                    }
                },
                "required": ["file_path"]
            }
        },
        {
            "name": "compare_files",
            "description": "Line-level comparison of two text files, each optionally drawn from a different repository. Reports added/removed lines (first 20) and the total difference count.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path1": { "type": "string", "description": "First file path" },
                    "file_path2": { "type": "string", "description": "Second file path" },
                    "repo_name1": { "type": "string", "description": "Repository of the first file (default: active repository)" },
                    "repo_name2": { "type": "string", "description": "Repository of the second file (default: active repository)" }
                },
                "required": ["file_path1", "file_path2"]
            }
        }
    ])
}

fn resource_definitions() -> serde_json::Value {
    serde_json::json!([
        {
            "uri": "repo://current",
            "name": "Active repository summary",
            "description": "Name, path, top-level directories, Python file count, and README excerpt of the active repository",
            "mimeType": "application/json"
        },
        {
            "uri": "repo://files",
            "name": "Active repository files",
            "description": "File listing of the active repository (first 100 entries plus the true total)",
            "mimeType": "application/json"
        }
    ])
}

fn resource_template_definitions() -> serde_json::Value {
    serde_json::json!([
        {
            "uriTemplate": "repo://file/{path}",
            "name": "Repository file content",
            "description": "Content of a file in the active repository: text, rendered notebook, image, or binary metadata"
        }
    ])
}

// ---------------------------------------------------------------------------
// Tool handlers
// ---------------------------------------------------------------------------

fn handle_switch(registry: &mut Registry, args: &serde_json::Value) -> (String, bool) {
    let name = args["repo_name"].as_str().unwrap_or("");
    match registry.switch(name) {
        Ok(repo) => (
            format!("Switched to repository '{}'. Root: {}", repo.name, repo.root.display()),
            false,
        ),
        Err(e) => (format!("Error: {e}"), true),
    }
}

/// Read-only tool dispatch. Mutating tools are handled separately with a
/// write lock.
fn handle_tool_call(registry: &Registry, name: &str, args: &serde_json::Value) -> (String, bool) {
    match name {
        "list_repositories" => {
            let repositories = registry
                .iter()
                .map(|repo| RepoInfo {
                    name: repo.name.clone(),
                    path: repo.root.display().to_string(),
                    active: repo.name == registry.active_name(),
                    exists: repo.root.exists(),
                })
                .collect();
            let list = RepoList {
                repositories,
                active_repository: registry.active_name().to_string(),
            };
            (render(&list), false)
        }
        "read_file" => {
            let file_path = args["file_path"].as_str().unwrap_or("");
            let repo = registry.resolve(args["repo_name"].as_str());
            match extract(repo, file_path) {
                Ok(FileContent::Text(text)) => (text, false),
                Ok(FileContent::Notebook(rendered)) => (rendered, false),
                Ok(FileContent::Image { .. }) | Ok(FileContent::Binary(_)) => (
                    format!("'{file_path}' is not a text file and cannot be displayed."),
                    false,
                ),
                Err(e) => (format!("Error: [{}] {e}", repo.name), true),
            }
        }
        "search_repositories" => {
            let query = args["query"].as_str().unwrap_or("");
            let extensions = string_args(args, "extensions");
            match search(registry, query, &extensions) {
                Ok(report) => (render(&report), false),
                Err(e) => (format!("Error: {e}"), true),
            }
        }
        "find_similar_files" => {
            let file_path = args["file_path"].as_str().unwrap_or("");
            let extensions = string_args(args, "extensions");
            let repo = registry.active();
            match find_similar(repo, file_path, &extensions) {
                Ok(report) => (render(&report), false),
                Err(e) => (format!("Error: [{}] {e}", repo.name), true),
            }
        }
        "compare_files" => {
            let file_path1 = args["file_path1"].as_str().unwrap_or("");
            let file_path2 = args["file_path2"].as_str().unwrap_or("");
            let repo1 = registry.resolve(args["repo_name1"].as_str());
            let repo2 = registry.resolve(args["repo_name2"].as_str());
            match compare(repo1, file_path1, repo2, file_path2) {
                Ok(result) => (render(&result), false),
                Err(e) => (format!("Error: {e}"), true),
            }
        }
        _ => (format!("Unknown tool: {name}"), true),
    }
}

// ---------------------------------------------------------------------------
// Resource handlers
// ---------------------------------------------------------------------------

fn resource_contents(registry: &Registry, uri: &str) -> Option<serde_json::Value> {
    match uri {
        "repo://current" => {
            let summary = summarize(registry.active());
            Some(serde_json::json!({
                "uri": uri,
                "mimeType": "application/json",
                "text": render(&summary)
            }))
        }
        "repo://files" => {
            let listing = list_files(registry.active());
            Some(serde_json::json!({
                "uri": uri,
                "mimeType": "application/json",
                "text": render(&listing)
            }))
        }
        _ => {
            let rel_path = uri.strip_prefix("repo://file/")?;
            let repo = registry.active();
            let content = match extract(repo, rel_path) {
                Ok(FileContent::Text(text)) => serde_json::json!({
                    "uri": uri,
                    "mimeType": "text/plain",
                    "text": text
                }),
                Ok(FileContent::Notebook(rendered)) => serde_json::json!({
                    "uri": uri,
                    "mimeType": "text/markdown",
                    "text": rendered
                }),
                Ok(FileContent::Image { data, format }) => serde_json::json!({
                    "uri": uri,
                    "mimeType": mime_for_image(&format),
                    "blob": base64::engine::general_purpose::STANDARD.encode(&data)
                }),
                Ok(FileContent::Binary(meta)) => serde_json::json!({
                    "uri": uri,
                    "mimeType": "application/json",
                    "text": render(&meta)
                }),
                Err(e) => serde_json::json!({
                    "uri": uri,
                    "mimeType": "text/plain",
                    "text": format!("Error: [{}] {e}", repo.name)
                }),
            };
            Some(content)
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC dispatch
// ---------------------------------------------------------------------------

/// Dispatch a single JSON-RPC message. Returns `None` for notifications.
pub fn dispatch_jsonrpc(
    state: &Arc<RwLock<Registry>>,
    msg: &serde_json::Value,
) -> Option<serde_json::Value> {
    let method = msg["method"].as_str().unwrap_or("");
    let id = msg.get("id").cloned();

    if method.starts_with("notifications/") {
        return None;
    }

    let response = match method {
        "initialize" => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "protocolVersion": "2025-06-18",
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": "repolens",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "RepoLens — browse, search, and compare files across registered repositories. Use list_repositories to see what is registered, switch_repository to change the default target, search_repositories for cross-repository keyword search, and compare_files for line-level diffs."
            }
        }),
        "tools/list" => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": { "tools": tool_definitions() }
        }),
        "tools/call" => {
            let tool_name = msg["params"]["name"].as_str().unwrap_or("");
            let arguments =
                msg["params"].get("arguments").cloned().unwrap_or(serde_json::json!({}));

            // The repository switch is the only mutating tool.
            let (text, is_error) = match tool_name {
                "switch_repository" => {
                    let mut registry = state.write().unwrap();
                    handle_switch(&mut registry, &arguments)
                }
                _ => {
                    let registry = state.read().unwrap();
                    handle_tool_call(&registry, tool_name, &arguments)
                }
            };

            serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "content": [{ "type": "text", "text": text }],
                    "isError": is_error
                }
            })
        }
        "resources/list" => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": { "resources": resource_definitions() }
        }),
        "resources/templates/list" => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": { "resourceTemplates": resource_template_definitions() }
        }),
        "resources/read" => {
            let uri = msg["params"]["uri"].as_str().unwrap_or("");
            let registry = state.read().unwrap();
            match resource_contents(&registry, uri) {
                Some(contents) => serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": { "contents": [contents] }
                }),
                None => serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32002, "message": format!("Unknown resource: {uri}") }
                }),
            }
        }
        "ping" => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {}
        }),
        _ => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "Method not found" }
        }),
    };

    Some(response)
}

// ---------------------------------------------------------------------------
// Stdio server loop
// ---------------------------------------------------------------------------

pub fn run_mcp(state: Arc<RwLock<Registry>>) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock();

    {
        let registry = state.read().unwrap();
        let names = registry.names();
        eprintln!(
            "MCP server ready ({} repositories: {}; active: {})",
            names.len(),
            names.join(", "),
            registry.active_name()
        );
    }

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let msg: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => {
                let err = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": { "code": -32700, "message": "Parse error" }
                });
                let mut out = stdout.lock();
                let _ = writeln!(out, "{err}");
                let _ = out.flush();
                continue;
            }
        };

        if let Some(response) = dispatch_jsonrpc(&state, &msg) {
            let mut out = stdout.lock();
            let _ = writeln!(out, "{response}");
            let _ = out.flush();
        }
    }
}
