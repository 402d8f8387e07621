use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::RepoError;

// ---------------------------------------------------------------------------
// Constants — output truncation contracts
// ---------------------------------------------------------------------------

/// Maximum file size (in bytes) that search will read into memory.
pub const MAX_FILE_READ: u64 = 512 * 1024;

/// Maximum number of entries returned by a repository file listing.
pub const MAX_LISTED_FILES: usize = 100;

/// Maximum matching lines reported per file in search results.
pub const MAX_MATCH_LINES: usize = 5;

/// Maximum diff entries included in a comparison result.
pub const MAX_DIFF_ENTRIES: usize = 20;

/// Maximum README excerpt length (in characters) in the repository summary.
pub const README_EXCERPT_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Repositories and the registry
// ---------------------------------------------------------------------------

/// A named repository root registered for inspection.
///
/// The root is not required to exist at registration time: the listing
/// operation reports existence, search skips absent roots, and per-file
/// operations surface `NotFound`.
#[derive(Clone)]
pub struct Repository {
    pub name: String,
    pub root: PathBuf,
}

impl Repository {
    /// Resolve a repository-relative path against the root.
    pub fn join(&self, rel_path: &str) -> PathBuf {
        self.root.join(rel_path)
    }

    /// Resolve a relative path and require it to be an existing regular file.
    pub fn checked_file(&self, rel_path: &str) -> Result<PathBuf, RepoError> {
        let abs = self.join(rel_path);
        if !abs.exists() {
            return Err(RepoError::NotFound { path: rel_path.to_string() });
        }
        if !abs.is_file() {
            return Err(RepoError::NotAFile { path: rel_path.to_string() });
        }
        Ok(abs)
    }
}

/// Registry of repositories plus the single active-repository selector.
///
/// Core operations take their repository context explicitly; only the
/// transport layer consults `active` to resolve omitted repository names.
pub struct Registry {
    repos: BTreeMap<String, Repository>,
    active: String,
}

impl Registry {
    /// Build a registry from `(name, root)` pairs. The active repository
    /// defaults to the first pair when not given explicitly.
    pub fn new(
        specs: Vec<(String, PathBuf)>,
        active: Option<String>,
    ) -> Result<Self, RepoError> {
        let first = match specs.first() {
            Some((name, _)) => name.clone(),
            None => {
                return Err(RepoError::InvalidArgument(
                    "at least one repository must be registered".to_string(),
                ))
            }
        };
        let mut repos = BTreeMap::new();
        for (name, root) in specs {
            repos.insert(name.clone(), Repository { name, root });
        }
        let active = active.unwrap_or(first);
        if !repos.contains_key(&active) {
            let available = repos.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(RepoError::UnknownRepository { name: active, available });
        }
        Ok(Self { repos, active })
    }

    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repos.get(name)
    }

    /// Repository names in listing order.
    pub fn names(&self) -> Vec<String> {
        self.repos.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repos.values()
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The currently active repository. The selector is validated on every
    /// mutation, so the lookup cannot miss.
    pub fn active(&self) -> &Repository {
        self.repos.get(&self.active).expect("active repository must be registered")
    }

    /// Resolve an optional repository name, falling back to the active
    /// repository when the name is omitted or unrecognized.
    pub fn resolve(&self, name: Option<&str>) -> &Repository {
        name.and_then(|n| self.repos.get(n)).unwrap_or_else(|| self.active())
    }

    /// Switch the active repository. Unknown names leave the selector
    /// unchanged and return an error enumerating the valid names.
    pub fn switch(&mut self, name: &str) -> Result<&Repository, RepoError> {
        if !self.repos.contains_key(name) {
            return Err(RepoError::UnknownRepository {
                name: name.to_string(),
                available: self.names().join(", "),
            });
        }
        self.active = name.to_string();
        Ok(self.active())
    }
}

// ---------------------------------------------------------------------------
// File classification
// ---------------------------------------------------------------------------

/// File classification derived purely from the lowercased extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Notebook,
    /// Image with its format tag (extension without the dot).
    Image(String),
    Binary,
}

impl FileKind {
    /// Short label used in file listings.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Notebook => "notebook",
            FileKind::Image(_) => "image",
            FileKind::Binary => "binary",
        }
    }
}

/// Metadata for a file discovered during a repository walk.
#[derive(Clone, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub size_bytes: u64,
}

// ---------------------------------------------------------------------------
// Repository listing and summary payloads
// ---------------------------------------------------------------------------

/// One row of the repository listing operation.
#[derive(Serialize)]
pub struct RepoInfo {
    pub name: String,
    pub path: String,
    pub active: bool,
    pub exists: bool,
}

#[derive(Serialize)]
pub struct RepoList {
    pub repositories: Vec<RepoInfo>,
    pub active_repository: String,
}

/// Summary of the active repository: top-level layout plus README excerpt.
#[derive(Serialize)]
pub struct RepoSummary {
    pub name: String,
    pub path: String,
    pub directories: Vec<String>,
    pub python_files_count: usize,
    pub readme_available: bool,
    pub readme_excerpt: String,
}

/// Capped file listing for a single repository, with the true total count.
#[derive(Serialize)]
pub struct RepoListing {
    pub repository: String,
    pub path: String,
    pub total_files: usize,
    pub files: Vec<FileRecord>,
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single line containing the query, with its 1-based position.
#[derive(Clone, Serialize)]
pub struct MatchLine {
    pub line_number: usize,
    pub content: String,
}

/// Per-file search result: uncapped occurrence count plus capped line hits.
#[derive(Clone, Serialize)]
pub struct FileSearchResult {
    pub file: String,
    pub matches: usize,
    pub matching_lines: Vec<MatchLine>,
}

/// Search results grouped by repository. Only repositories with at least one
/// matching file appear.
#[derive(Serialize)]
pub struct SearchReport {
    pub query: String,
    pub extensions: Vec<String>,
    pub total_repos_matched: usize,
    pub files_skipped: usize,
    pub results: BTreeMap<String, Vec<FileSearchResult>>,
}

// ---------------------------------------------------------------------------
// Similar-file discovery
// ---------------------------------------------------------------------------

/// Why a discovered file was considered related to the reference file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    SameNameSameExtension,
    SameNameDifferentExtension,
    SimilarName,
    SameDirectory,
}

#[derive(Clone, Serialize)]
pub struct SimilarFileEntry {
    pub path: String,
    pub similarity: SimilarityKind,
    pub size_bytes: u64,
}

#[derive(Serialize)]
pub struct SimilarReport {
    pub original_file: String,
    pub repository: String,
    pub similar_files_count: usize,
    pub similar_files: Vec<SimilarFileEntry>,
}

// ---------------------------------------------------------------------------
// File comparison
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
}

/// One added or removed line in the merged diff stream. The line number
/// follows the comparator's counter contract: the counter advances on
/// unchanged and removed lines only, and added lines are stamped with its
/// current value without advancing it.
#[derive(Clone, Serialize)]
pub struct DiffEntry {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub line_number: usize,
    pub content: String,
}

#[derive(Serialize)]
pub struct FileSummary {
    pub path: String,
    pub repository: String,
    pub line_count: usize,
    pub size_bytes: u64,
}

#[derive(Serialize)]
pub struct Comparison {
    pub identical: bool,
    pub differences_count: usize,
    pub differences: Vec<DiffEntry>,
}

#[derive(Serialize)]
pub struct CompareResult {
    pub file1: FileSummary,
    pub file2: FileSummary,
    pub comparison: Comparison,
}
