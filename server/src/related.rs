//! Similar-file discovery.
//!
//! Given a reference file, three passes collect related files: exact stem
//! matches per requested extension, stem-prefix filename matches, and
//! immediate siblings. Paths are de-duplicated across passes with the
//! earliest pass's classification winning.

use crate::error::RepoError;
use crate::scan::{extension_of, matches_extension, rel_display, walk_files};
use crate::search::normalize_extensions;
use crate::types::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn size_of(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Find files related to a reference file within one repository.
///
/// The default extension list is the reference's own extension. The
/// reference file itself is never included.
pub fn find_similar(
    repo: &Repository,
    rel_path: &str,
    extensions: &[String],
) -> Result<SimilarReport, RepoError> {
    let abs = repo.checked_file(rel_path)?;
    let stem = abs.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ref_ext = extension_of(&abs);

    let mut search_exts = normalize_extensions(extensions);
    if search_exts.is_empty() {
        search_exts = vec![ref_ext.clone()];
    }

    let all_files = walk_files(&repo.root);
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(rel_display(&repo.root, &abs));
    let mut similar_files: Vec<SimilarFileEntry> = Vec::new();

    // Pass 1: same stem, per requested extension, anywhere in the tree.
    for ext in &search_exts {
        let similarity = if ext.eq_ignore_ascii_case(&ref_ext) {
            SimilarityKind::SameNameSameExtension
        } else {
            SimilarityKind::SameNameDifferentExtension
        };
        for cand in &all_files {
            if *cand == abs || !matches_extension(cand, ext) {
                continue;
            }
            let cand_stem =
                cand.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            if cand_stem != stem {
                continue;
            }
            let rel = rel_display(&repo.root, cand);
            if !seen.insert(rel.clone()) {
                continue;
            }
            similar_files.push(SimilarFileEntry { path: rel, similarity, size_bytes: size_of(cand) });
        }
    }

    // Pass 2: filename starts with the reference's stem, anywhere in the tree.
    for cand in &all_files {
        if *cand == abs {
            continue;
        }
        let name = cand.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if !name.starts_with(stem.as_str()) {
            continue;
        }
        let rel = rel_display(&repo.root, cand);
        if !seen.insert(rel.clone()) {
            continue;
        }
        similar_files.push(SimilarFileEntry {
            path: rel,
            similarity: SimilarityKind::SimilarName,
            size_bytes: size_of(cand),
        });
    }

    // Pass 3: every other file in the reference's parent directory.
    if let Some(parent) = abs.parent() {
        if let Ok(entries) = fs::read_dir(parent) {
            let mut siblings: Vec<_> =
                entries.flatten().map(|e| e.path()).filter(|p| p.is_file()).collect();
            siblings.sort();
            for cand in siblings {
                if cand == abs {
                    continue;
                }
                let rel = rel_display(&repo.root, &cand);
                if !seen.insert(rel.clone()) {
                    continue;
                }
                similar_files.push(SimilarFileEntry {
                    path: rel,
                    similarity: SimilarityKind::SameDirectory,
                    size_bytes: size_of(&cand),
                });
            }
        }
    }

    Ok(SimilarReport {
        original_file: rel_path.to_string(),
        repository: repo.name.clone(),
        similar_files_count: similar_files.len(),
        similar_files,
    })
}
