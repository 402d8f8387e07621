//! Line-level comparison of two text files, possibly in different
//! repositories.

use crate::error::RepoError;
use crate::extract::read_text_lossy;
use crate::scan::classify;
use crate::types::*;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::Path;

fn line_of(change_value: &str) -> String {
    let text = change_value.strip_suffix('\n').unwrap_or(change_value);
    text.strip_suffix('\r').unwrap_or(text).to_string()
}

fn summary_of(repo: &Repository, rel_path: &str, abs: &Path, line_count: usize) -> FileSummary {
    FileSummary {
        path: rel_path.to_string(),
        repository: repo.name.clone(),
        line_count,
        size_bytes: fs::metadata(abs).map(|m| m.len()).unwrap_or(0),
    }
}

/// Compare two repository files line by line.
///
/// Both paths must name existing regular files classified as text. The diff
/// tags each line as unchanged, removed (only in the first file), or added
/// (only in the second file), walking the merged stream with a single
/// counter: it starts at 0, advances on unchanged and removed lines, and
/// stamps added lines with its current value without advancing. The output
/// carries at most [`MAX_DIFF_ENTRIES`] differences while
/// `differences_count` reflects the true total.
pub fn compare(
    repo1: &Repository,
    rel_path1: &str,
    repo2: &Repository,
    rel_path2: &str,
) -> Result<CompareResult, RepoError> {
    let abs1 = repo1.checked_file(rel_path1)?;
    let abs2 = repo2.checked_file(rel_path2)?;

    if !matches!(classify(&abs1), FileKind::Text) || !matches!(classify(&abs2), FileKind::Text) {
        return Err(RepoError::InvalidArgument("both files must be text files".to_string()));
    }

    let content1 = read_text_lossy(&abs1)?;
    let content2 = read_text_lossy(&abs2)?;
    let lines1: Vec<&str> = content1.lines().collect();
    let lines2: Vec<&str> = content2.lines().collect();
    let identical = lines1 == lines2;

    let mut differences: Vec<DiffEntry> = Vec::new();
    let mut differences_count = 0usize;

    if !identical {
        let diff = TextDiff::from_lines(content1.as_str(), content2.as_str());
        let mut line_number = 0usize;
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => {
                    differences_count += 1;
                    if differences.len() < MAX_DIFF_ENTRIES {
                        differences.push(DiffEntry {
                            kind: DiffKind::Removed,
                            line_number,
                            content: line_of(change.value()),
                        });
                    }
                    line_number += 1;
                }
                ChangeTag::Insert => {
                    differences_count += 1;
                    if differences.len() < MAX_DIFF_ENTRIES {
                        differences.push(DiffEntry {
                            kind: DiffKind::Added,
                            line_number,
                            content: line_of(change.value()),
                        });
                    }
                }
                ChangeTag::Equal => {
                    line_number += 1;
                }
            }
        }
    }

    Ok(CompareResult {
        file1: summary_of(repo1, rel_path1, &abs1, lines1.len()),
        file2: summary_of(repo2, rel_path2, &abs2, lines2.len()),
        comparison: Comparison { identical, differences_count, differences },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let repo = Repository { name: "t".to_string(), root: dir.path().to_path_buf() };
        (dir, repo)
    }

    #[test]
    fn test_identical_self_compare() {
        let (_dir, repo) = repo_with(&[("a.md", "one\ntwo\nthree\n")]);
        let result = compare(&repo, "a.md", &repo, "a.md").unwrap();
        assert!(result.comparison.identical);
        assert_eq!(result.comparison.differences_count, 0);
        assert!(result.comparison.differences.is_empty());
        assert_eq!(result.file1.line_count, 3);
        assert_eq!(result.file2.line_count, 3);
    }

    #[test]
    fn test_single_appended_line() {
        let (_dir, repo) =
            repo_with(&[("a.md", "one\ntwo\nthree\n"), ("b.md", "one\ntwo\nthree\nfour\n")]);
        let result = compare(&repo, "a.md", &repo, "b.md").unwrap();
        assert!(!result.comparison.identical);
        assert_eq!(result.comparison.differences_count, 1);
        let entry = &result.comparison.differences[0];
        assert_eq!(entry.kind, DiffKind::Added);
        assert_eq!(entry.content, "four");
        // Three unchanged lines advance the counter to 3; the added line is
        // stamped without advancing it.
        assert_eq!(entry.line_number, 3);
    }

    #[test]
    fn test_removed_line_numbering() {
        let (_dir, repo) =
            repo_with(&[("a.md", "one\ntwo\nthree\n"), ("b.md", "one\nthree\n")]);
        let result = compare(&repo, "a.md", &repo, "b.md").unwrap();
        assert_eq!(result.comparison.differences_count, 1);
        let entry = &result.comparison.differences[0];
        assert_eq!(entry.kind, DiffKind::Removed);
        assert_eq!(entry.content, "two");
        // "one" advances the counter to 1, so the removed line sits at 1 —
        // its 0-based position in the first file.
        assert_eq!(entry.line_number, 1);
    }

    #[test]
    fn test_replaced_line_emits_removed_and_added() {
        let (_dir, repo) = repo_with(&[("a.md", "alpha\nbeta\n"), ("b.md", "alpha\ngamma\n")]);
        let result = compare(&repo, "a.md", &repo, "b.md").unwrap();
        assert_eq!(result.comparison.differences_count, 2);
        let kinds: Vec<DiffKind> =
            result.comparison.differences.iter().map(|d| d.kind).collect();
        assert!(kinds.contains(&DiffKind::Removed));
        assert!(kinds.contains(&DiffKind::Added));
    }

    #[test]
    fn test_output_capped_but_count_uncapped() {
        let left: String = (0..30).map(|i| format!("left {i}\n")).collect();
        let right: String = (0..30).map(|i| format!("right {i}\n")).collect();
        let (_dir, repo) = repo_with(&[("a.txt", left.as_str()), ("b.txt", right.as_str())]);
        let result = compare(&repo, "a.txt", &repo, "b.txt").unwrap();
        assert_eq!(result.comparison.differences.len(), MAX_DIFF_ENTRIES);
        assert_eq!(result.comparison.differences_count, 60);
    }

    #[test]
    fn test_non_text_rejected() {
        let (_dir, repo) = repo_with(&[("a.md", "text\n"), ("blob.bin", "\u{0}\u{1}")]);
        let err = compare(&repo, "a.md", &repo, "blob.bin").unwrap_err();
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn test_missing_file_rejected_per_file() {
        let (_dir, repo) = repo_with(&[("a.md", "text\n")]);
        assert!(matches!(
            compare(&repo, "a.md", &repo, "nope.md"),
            Err(RepoError::NotFound { .. })
        ));
    }
}
