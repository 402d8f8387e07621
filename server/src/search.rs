//! Cross-repository substring search.
//!
//! Every search re-walks the filesystem: there is no index and no cache.
//! Matching is a case-insensitive substring test of the query, compiled as
//! an escaped regex pattern.

use crate::error::RepoError;
use crate::scan::{matches_extension, rel_display, walk_files};
use crate::types::*;
use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Extensions searched when the caller does not supply any.
pub const DEFAULT_SEARCH_EXTENSIONS: &[&str] = &[".py", ".md", ".txt"];

/// Normalize a requested extension list: prefix a missing dot, lowercase,
/// and drop duplicates while preserving order.
pub fn normalize_extensions(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for ext in raw {
        let ext = ext.trim();
        if ext.is_empty() {
            continue;
        }
        let normalized = if ext.starts_with('.') {
            ext.to_lowercase()
        } else {
            format!(".{}", ext.to_lowercase())
        };
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

/// Read a file for searching. Oversized or unreadable files are skipped.
fn read_for_search(path: &Path) -> Option<String> {
    let meta = fs::metadata(path).ok()?;
    if meta.len() > MAX_FILE_READ {
        return None;
    }
    fs::read(path).ok().map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Search every registered repository for a case-insensitive substring.
///
/// For each repository whose root exists, files are enumerated per requested
/// extension in walk order. A matching file reports its uncapped occurrence
/// count and up to [`MAX_MATCH_LINES`] matching lines with 1-based numbers.
/// Files that cannot be read are skipped and counted, never fatal.
pub fn search(
    registry: &Registry,
    query: &str,
    extensions: &[String],
) -> Result<SearchReport, RepoError> {
    if query.is_empty() {
        return Err(RepoError::InvalidArgument("search query must not be empty".to_string()));
    }
    let pattern = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map_err(|e| RepoError::InvalidArgument(format!("could not compile query: {e}")))?;

    let mut exts = normalize_extensions(extensions);
    if exts.is_empty() {
        exts = DEFAULT_SEARCH_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    }

    let mut results: BTreeMap<String, Vec<FileSearchResult>> = BTreeMap::new();
    let mut files_skipped = 0usize;

    for repo in registry.iter() {
        if !repo.root.exists() {
            continue;
        }
        let all_files = walk_files(&repo.root);
        let mut repo_results: Vec<FileSearchResult> = Vec::new();

        for ext in &exts {
            for abs in all_files.iter().filter(|p| matches_extension(p, ext)) {
                let content = match read_for_search(abs) {
                    Some(c) => c,
                    None => {
                        files_skipped += 1;
                        continue;
                    }
                };
                if !pattern.is_match(&content) {
                    continue;
                }
                let matches = pattern.find_iter(&content).count();
                let mut matching_lines: Vec<MatchLine> = Vec::new();
                for (i, line) in content.lines().enumerate() {
                    if pattern.is_match(line) {
                        matching_lines.push(MatchLine {
                            line_number: i + 1,
                            content: line.trim().to_string(),
                        });
                        if matching_lines.len() >= MAX_MATCH_LINES {
                            break;
                        }
                    }
                }
                repo_results.push(FileSearchResult {
                    file: rel_display(&repo.root, abs),
                    matches,
                    matching_lines,
                });
            }
        }

        if !repo_results.is_empty() {
            results.insert(repo.name.clone(), repo_results);
        }
    }

    tracing::debug!(
        query = query,
        repos_matched = results.len(),
        files_skipped = files_skipped,
        "Search complete"
    );

    Ok(SearchReport {
        query: query.to_string(),
        extensions: exts,
        total_repos_matched: results.len(),
        files_skipped,
        results,
    })
}
