//! Shared test utilities.
//!
//! Fixtures are built inline with [`write_tree`] and checked with
//! [`output_files`], so every test states the exact tree it works on.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let input = TempDir::new().unwrap();
//! write_tree(input.path(), &[
//!     ("index.md", "# Home"),
//!     ("blog/post1/en.md", "---\ntitle: Hello\n---\n"),
//! ]);
//! // ... crawl into `output` ...
//! assert_eq!(output_files(output.path()), vec!["blog/index.html", "index.html"]);
//! ```

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, content)` pairs under `root`, creating parent
/// directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
}

// =========================================================================
// Output inspection
// =========================================================================

/// Every file under `dir`, relative and `/`-separated, sorted. Directories
/// are not listed.
pub fn output_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| crate::crawl::rel_string(dir, e.path()))
        .collect();
    files.sort();
    files
}

/// Read a file under `dir` by relative path.
pub fn read_output(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel))
        .unwrap_or_else(|e| panic!("could not read {rel}: {e}"))
}
