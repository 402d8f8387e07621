//! RepoLens — multi-repository inspection server.
//!
//! This crate provides the core library for RepoLens: a set of inspection
//! operations over named local repositories — file retrieval, cross-repository
//! keyword search, similar-file discovery, and line-level file comparison —
//! exposed over MCP (Model Context Protocol) on stdio.
//!
//! # Modules
//!
//! - [`types`] — Data model: repositories, registry, classifications, results
//! - [`error`] — Error taxonomy returned as values by every operation
//! - [`scan`] — File classification, tree walking, listing, repo summary
//! - [`extract`] — Content extraction (text, notebooks, images, binaries)
//! - [`search`] — Cross-repository substring search engine
//! - [`related`] — Similar-file discovery
//! - [`compare`] — Line-level file comparison
//! - [`mcp`] — MCP JSON-RPC server (stdio transport)

pub mod compare;
pub mod error;
pub mod extract;
pub mod mcp;
pub mod related;
pub mod scan;
pub mod search;
pub mod types;

use std::path::{Path, PathBuf};
use tracing::error;

// ---------------------------------------------------------------------------
// repos.toml config loading
// ---------------------------------------------------------------------------

/// Parse a `repos.toml` config file.
///
/// Expected shape:
///
/// ```toml
/// active = "docs"            # optional
///
/// [repos.docs]
/// root = "/path/to/docs"
///
/// [repos.sdk]
/// root = "/path/to/sdk"
/// ```
///
/// Returns `(name, root)` pairs plus the optional active-repository name.
/// Roots are not required to exist; absent roots are reported by the listing
/// operation and skipped by search.
pub fn parse_repos_toml(path: &Path) -> (Vec<(String, PathBuf)>, Option<String>) {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not read config file");
            std::process::exit(1);
        }
    };
    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not parse config file");
            std::process::exit(1);
        }
    };

    let repos_table = match table.get("repos").and_then(|v| v.as_table()) {
        Some(t) => t,
        None => {
            error!("Config file missing [repos] section");
            std::process::exit(1);
        }
    };

    let mut repos = Vec::new();
    for (name, value) in repos_table {
        let root = value.get("root").and_then(|v| v.as_str()).unwrap_or_else(|| {
            error!(repo = name.as_str(), "Missing 'root' field in repos config");
            std::process::exit(1);
        });
        repos.push((name.clone(), PathBuf::from(root)));
    }

    let active = table.get("active").and_then(|v| v.as_str()).map(|s| s.to_string());

    (repos, active)
}
