//! RepoLens binary — thin CLI shell over the [`repolens_server`] library crate.

use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

use repolens_server::mcp::run_mcp;
use repolens_server::parse_repos_toml;
use repolens_server::types::Registry;

// ---------------------------------------------------------------------------
// CLI definition (clap derive)
// ---------------------------------------------------------------------------

/// Multi-repository inspection server — browse, search, and compare files
/// across named repositories over MCP.
#[derive(Parser)]
#[command(name = "repolens", version, about, long_about = None)]
struct Cli {
    /// Named repository (repeatable, format: NAME=PATH)
    #[arg(long = "repo", value_name = "NAME=PATH")]
    repos: Vec<String>,

    /// Load repositories from a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Repository that starts active (default: first registered)
    #[arg(long)]
    active: Option<String>,

    /// Single repository root (fallback when no --repo/--config is given;
    /// default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    // Structured logging on stderr — stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("repolens_server=info".parse().expect("valid directive")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ---------------------------------------------------------------------
    // Determine repository list from CLI args
    // ---------------------------------------------------------------------

    let mut repo_specs: Vec<(String, PathBuf)> = Vec::new();
    let mut active = cli.active.clone();

    // --repo name=/path flags (repeatable)
    for spec in &cli.repos {
        match spec.split_once('=') {
            Some((name, path)) => repo_specs.push((name.to_string(), PathBuf::from(path))),
            None => {
                error!(spec = spec.as_str(), "Invalid --repo format, expected NAME=PATH");
                std::process::exit(1);
            }
        }
    }

    // --config file
    if let Some(config_path) = &cli.config {
        let (parsed, config_active) = parse_repos_toml(config_path);
        repo_specs.extend(parsed);
        if active.is_none() {
            active = config_active;
        }
    }

    // Fallback: --root or cwd (single repository)
    if repo_specs.is_empty() {
        let root = cli.root.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| {
                error!("Could not determine current directory. Use --root <path>");
                std::process::exit(1);
            })
        });
        let name = root.file_name().and_then(|n| n.to_str()).unwrap_or("default").to_string();
        repo_specs.push((name, root));
    }

    for (name, root) in &repo_specs {
        if root.exists() {
            info!(repo = name.as_str(), root = %root.display(), "Registered repository");
        } else {
            warn!(repo = name.as_str(), root = %root.display(), "Repository root does not exist");
        }
    }

    let registry = match Registry::new(repo_specs, active) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Could not build repository registry");
            std::process::exit(1);
        }
    };

    info!(active = registry.active_name(), repos = registry.names().len(), "Registry ready");

    run_mcp(Arc::new(RwLock::new(registry)));
}
