//! Content extraction — turns a file on disk into displayable content.
//!
//! Text files are decoded with invalid byte sequences replaced, notebook
//! documents are rendered cell by cell, images are passed through as raw
//! bytes, and opaque binaries become a metadata record instead of content.

use crate::error::RepoError;
use crate::scan::classify;
use crate::types::{FileKind, Repository};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Extracted content for a single file.
pub enum FileContent {
    Text(String),
    /// Rendered notebook document (markdown/code cells with outputs).
    Notebook(String),
    Image {
        data: Vec<u8>,
        format: String,
    },
    Binary(BinaryMeta),
}

/// Metadata record returned for opaque binary files.
#[derive(Serialize)]
pub struct BinaryMeta {
    pub filename: String,
    pub path: String,
    pub repository: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub message: String,
}

/// Read a file as text, replacing invalid UTF-8 sequences.
pub fn read_text_lossy(path: &Path) -> Result<String, RepoError> {
    let bytes = fs::read(path)
        .map_err(|e| RepoError::Io { path: path.display().to_string(), source: e })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract a repository file's content according to its classification.
pub fn extract(repo: &Repository, rel_path: &str) -> Result<FileContent, RepoError> {
    let abs = repo.checked_file(rel_path)?;
    match classify(&abs) {
        FileKind::Text => Ok(FileContent::Text(read_text_lossy(&abs)?)),
        FileKind::Notebook => Ok(FileContent::Notebook(render_notebook(&abs, rel_path)?)),
        FileKind::Image(format) => {
            let data = fs::read(&abs)
                .map_err(|e| RepoError::Io { path: rel_path.to_string(), source: e })?;
            Ok(FileContent::Image { data, format })
        }
        FileKind::Binary => {
            let size_bytes = fs::metadata(&abs).map(|m| m.len()).unwrap_or(0);
            let mime_type = mime_guess::from_path(&abs)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string();
            Ok(FileContent::Binary(BinaryMeta {
                filename: abs
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| rel_path.to_string()),
                path: rel_path.to_string(),
                repository: repo.name.clone(),
                size_bytes,
                mime_type,
                message: "This file is in a binary format, so its content is not displayed."
                    .to_string(),
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Notebook rendering
// ---------------------------------------------------------------------------

/// Concatenate a notebook source/output value: either a JSON array of string
/// fragments or a single string.
fn concat_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(parts) => {
            parts.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>().join("")
        }
        serde_json::Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Parse and render a notebook file as markdown text.
fn render_notebook(abs: &Path, rel_path: &str) -> Result<String, RepoError> {
    let raw = read_text_lossy(abs)?;
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| rel_path.to_string());
    render_notebook_source(&raw, &name)
        .ok_or(RepoError::UnsupportedFormat { path: rel_path.to_string(), format: "Jupyter Notebook" })
}

/// Render notebook JSON. Cells are emitted in document order; markdown and
/// code cells carry independent 1-based counters. Returns `None` when the
/// source is not valid JSON.
fn render_notebook_source(raw: &str, name: &str) -> Option<String> {
    let notebook: serde_json::Value = serde_json::from_str(raw).ok()?;
    let mut sections: Vec<String> = Vec::new();
    let mut markdown_cells = 0usize;
    let mut code_cells = 0usize;

    if let Some(cells) = notebook.get("cells").and_then(|c| c.as_array()) {
        for cell in cells {
            let source = cell.get("source").map(concat_text).unwrap_or_default();
            match cell.get("cell_type").and_then(|t| t.as_str()) {
                Some("markdown") => {
                    markdown_cells += 1;
                    sections.push(format!("### Markdown cell {markdown_cells}\n{source}\n"));
                }
                Some("code") => {
                    code_cells += 1;
                    let mut outputs: Vec<String> = Vec::new();
                    if let Some(outs) = cell.get("outputs").and_then(|o| o.as_array()) {
                        for output in outs {
                            if let Some(text) = output.get("text") {
                                outputs.push(concat_text(text));
                            } else if let Some(plain) =
                                output.get("data").and_then(|d| d.get("text/plain"))
                            {
                                outputs.push(concat_text(plain));
                            }
                        }
                    }
                    let output_text =
                        if outputs.is_empty() { "(no output)".to_string() } else { outputs.join("\n") };
                    sections.push(format!(
                        "### Code cell {code_cells}\n```python\n{source}\n```\n\nOutput:\n{output_text}\n"
                    ));
                }
                _ => {}
            }
        }
    }

    Some(format!("# Jupyter Notebook: {name}\n\n{}", sections.join("\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_cells_numbered_per_type() {
        let raw = r#"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title\n", "Intro."]},
                {"cell_type": "code", "source": ["print('hi')\n"],
                 "outputs": [{"output_type": "stream", "text": ["hi\n"]}]},
                {"cell_type": "code", "source": "x = 1", "outputs": []},
                {"cell_type": "markdown", "source": "Closing notes."}
            ]
        }"#;
        let rendered = render_notebook_source(raw, "demo.ipynb").unwrap();
        assert!(rendered.starts_with("# Jupyter Notebook: demo.ipynb"));
        assert!(rendered.contains("### Markdown cell 1\n# Title\nIntro."));
        assert!(rendered.contains("### Markdown cell 2\nClosing notes."));
        assert!(rendered.contains("### Code cell 1\n```python\nprint('hi')\n"));
        assert!(rendered.contains("Output:\nhi\n"));
        assert!(rendered.contains("### Code cell 2\n```python\nx = 1\n```"));
        assert!(rendered.contains("Output:\n(no output)"));
    }

    #[test]
    fn test_notebook_data_plain_output() {
        let raw = r#"{
            "cells": [
                {"cell_type": "code", "source": ["1 + 1"],
                 "outputs": [{"data": {"text/plain": ["2"]}}]}
            ]
        }"#;
        let rendered = render_notebook_source(raw, "calc.ipynb").unwrap();
        assert!(rendered.contains("Output:\n2"));
    }

    #[test]
    fn test_invalid_notebook_json_is_none() {
        assert!(render_notebook_source("not json at all", "bad.ipynb").is_none());
    }

    #[test]
    fn test_extract_errors() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository { name: "t".to_string(), root: dir.path().to_path_buf() };
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(matches!(extract(&repo, "missing.md"), Err(RepoError::NotFound { .. })));
        assert!(matches!(extract(&repo, "sub"), Err(RepoError::NotAFile { .. })));
    }

    #[test]
    fn test_extract_text_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository { name: "t".to_string(), root: dir.path().to_path_buf() };
        let body = "first line\nsecond line\n";
        std::fs::write(dir.path().join("note.md"), body).unwrap();
        match extract(&repo, "note.md").unwrap() {
            FileContent::Text(text) => assert_eq!(text, body),
            _ => panic!("expected text content"),
        }
    }

    #[test]
    fn test_extract_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository { name: "t".to_string(), root: dir.path().to_path_buf() };
        std::fs::write(dir.path().join("mixed.txt"), [b'o', b'k', 0xFF, b'!']).unwrap();
        match extract(&repo, "mixed.txt").unwrap() {
            FileContent::Text(text) => assert_eq!(text, "ok\u{FFFD}!"),
            _ => panic!("expected text content"),
        }
    }

    #[test]
    fn test_extract_binary_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository { name: "t".to_string(), root: dir.path().to_path_buf() };
        std::fs::write(dir.path().join("blob.dat"), [0u8, 1, 2, 3]).unwrap();
        match extract(&repo, "blob.dat").unwrap() {
            FileContent::Binary(meta) => {
                assert_eq!(meta.filename, "blob.dat");
                assert_eq!(meta.repository, "t");
                assert_eq!(meta.size_bytes, 4);
                assert!(!meta.mime_type.is_empty());
            }
            _ => panic!("expected binary metadata"),
        }
    }
}
