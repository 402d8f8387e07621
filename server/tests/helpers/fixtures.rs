//! Fixture repositories written into a temp dir for integration tests.

use std::fs;
use std::path::Path;

fn write(path: &Path, body: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    fs::write(path, body).expect("Failed to write fixture file");
}

/// The `docs` repository: text files, a notebook, an image, and a binary.
///
/// Among `.md` files, only `guide.md` contains the word "needle" (line 2).
pub fn write_docs_repo(root: &Path) {
    write(&root.join("README.md"), "# Docs Repo\n\nGuides and notes for the project.\n");
    write(
        &root.join("guide.md"),
        "# Guide\nThis page explains the needle workflow.\nNothing else here.\n",
    );
    write(&root.join("notes.txt"), "shared notes\nline two\nline three\n");
    write(&root.join("poem.md"), "line one\nline two\nline three\n");
    write(&root.join("poem_extended.md"), "line one\nline two\nline three\nline four\n");
    write(&root.join("report.md"), "# Report\nQuarterly numbers.\n");
    write(&root.join("report.txt"), "report in plain text\n");
    write(&root.join("report_v2.md"), "# Report v2\nUpdated numbers.\n");
    write(&root.join("tools/cleanup.py"), "print('hello cleanup')\n");
    write(&root.join("tools/archive.py"), "print('archive')\n");
    write(
        &root.join("demo.ipynb"),
        r#"{
  "cells": [
    {"cell_type": "markdown", "source": ["# Demo\n", "Worked example."]},
    {"cell_type": "code", "source": ["print('hi')\n"],
     "outputs": [{"output_type": "stream", "text": ["hi\n"]}]},
    {"cell_type": "code", "source": "x = 1", "outputs": []}
  ],
  "metadata": {},
  "nbformat": 4
}"#,
    );
    write(&root.join("broken.ipynb"), "{not valid json");
    write(&root.join("logo.png"), [0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]);
    write(&root.join("data.bin"), [0u8, 1, 2, 3, 4, 5, 6, 7]);
}

/// The `sdk` repository: carries a `notes.txt` identical to the docs copy
/// for cross-repository comparison tests, and no `.md` file containing
/// "needle".
pub fn write_sdk_repo(root: &Path) {
    write(&root.join("README.md"), "# SDK Repo\n\nClient library sources.\n");
    write(&root.join("notes.txt"), "shared notes\nline two\nline three\n");
    write(&root.join("client.py"), "class Client:\n    pass\n");
    write(&root.join("changelog.md"), "# Changelog\nInitial release.\n");
}
