use crate::types::*;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Extension sets and classification
// ---------------------------------------------------------------------------

/// Extensions read and returned as plain text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "py", "md", "mdx", "txt", "json", "yml", "yaml", "toml", "cfg", "ini", "html", "css", "js",
    "jsx", "ts", "tsx", "csv", "sql", "sh", "bat", "xml",
];

/// Image extensions returned as raw image content.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Classify a file by its lowercased extension. Total and pure: paths with
/// an unknown or missing extension are [`FileKind::Binary`]. File contents
/// are never inspected.
pub fn classify(path: &Path) -> FileKind {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Text
    } else if ext == "ipynb" {
        FileKind::Notebook
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Image(ext)
    } else {
        FileKind::Binary
    }
}

/// Case-insensitive filename-suffix match against a dot-prefixed extension.
pub fn matches_extension(path: &Path, ext: &str) -> bool {
    let name = match path.file_name() {
        Some(n) => n.to_string_lossy().to_lowercase(),
        None => return false,
    };
    name.ends_with(&ext.to_lowercase())
}

/// Lowercased, dot-prefixed extension of a path (empty when there is none).
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Directory walking
// ---------------------------------------------------------------------------

/// Directory names skipped during recursive walks.
const SKIP_DIRS: &[&str] =
    &[".git", "node_modules", "__pycache__", "target", "dist", "build", ".next", "vendor"];

/// Walk a repository tree and return every file in discovery order.
///
/// Hidden entries and well-known dependency/build directories are skipped.
/// Symlinks are never followed, so cyclic links cannot loop the walk. A
/// missing root yields an empty list.
pub fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !root.is_dir() {
        return files;
    }
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .filter_entry(|entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                let name = entry.file_name().to_string_lossy();
                return !SKIP_DIRS.contains(&name.as_ref());
            }
            true
        })
        .build();
    for entry in walker.flatten() {
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Repository-relative display path with forward slashes.
pub fn rel_display(root: &Path, abs: &Path) -> String {
    abs.strip_prefix(root).unwrap_or(abs).to_string_lossy().replace('\\', "/")
}

fn size_of(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Listing and summary operations
// ---------------------------------------------------------------------------

/// List a repository's files in walk order, capped at [`MAX_LISTED_FILES`]
/// entries while reporting the true total.
pub fn list_files(repo: &Repository) -> RepoListing {
    let mut files: Vec<FileRecord> = walk_files(&repo.root)
        .iter()
        .map(|abs| FileRecord {
            path: rel_display(&repo.root, abs),
            extension: extension_of(abs),
            kind: classify(abs).label(),
            size_bytes: size_of(abs),
        })
        .collect();
    let total_files = files.len();
    files.truncate(MAX_LISTED_FILES);
    RepoListing {
        repository: repo.name.clone(),
        path: repo.root.display().to_string(),
        total_files,
        files,
    }
}

/// Summarize a repository: top-level directories, Python file count, and a
/// capped README excerpt.
pub fn summarize(repo: &Repository) -> RepoSummary {
    let mut directories = Vec::new();
    if let Ok(entries) = fs::read_dir(&repo.root) {
        for entry in entries.flatten() {
            if entry.file_type().is_ok_and(|ft| ft.is_dir()) {
                directories.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    directories.sort();

    let python_files_count =
        walk_files(&repo.root).iter().filter(|p| matches_extension(p, ".py")).count();

    let readme_path = repo.root.join("README.md");
    let readme = if readme_path.is_file() {
        crate::extract::read_text_lossy(&readme_path).unwrap_or_default()
    } else {
        String::new()
    };
    let readme_excerpt = if readme.chars().count() > README_EXCERPT_CHARS {
        let cut: String = readme.chars().take(README_EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        readme.clone()
    };

    RepoSummary {
        name: repo.name.clone(),
        path: repo.root.display().to_string(),
        directories,
        python_files_count,
        readme_available: !readme.is_empty(),
        readme_excerpt,
    }
}
