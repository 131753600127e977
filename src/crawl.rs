//! Recursive mirroring of the input tree into the output tree.
//!
//! Every directory level is listed in name order and each entry is routed by
//! kind:
//!
//! | Entry | Action | Link recorded |
//! |-------|--------|---------------|
//! | `.git` | skipped | — |
//! | path listed in `exclude_files` | skipped | — |
//! | directory named `blog` | handed to [`crate::blog`] | its articles |
//! | other directory | mirrored and crawled one level deeper | its links |
//! | header / footer / settings file at the root | skipped | — |
//! | `auto_style` file at the root | copied | — |
//! | `*.md` | converted to `stem + output_extension`, source copied if `duplicate_md` | yes |
//! | `*.html` | copied if `duplicate_html` | yes, when copied |
//! | `*.css` listed in `styles` | copied | — |
//! | anything else | copied if `duplicate_files` | — |
//!
//! The output root itself is never crawled, so it may live inside the input
//! root (`--source . --output public`). Two sources that map to the same
//! output file (`a.md` and `a.html`) are reported and linked once.
//!
//! Failures below the crawl root (directory collisions, copy errors, converter
//! errors) are logged and the offending entry skipped.

use crate::blog;
use crate::convert::{Converter, conversion_options};
use crate::settings::Settings;
use crate::types::{LinkRegistry, join_rel};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version-control metadata, never published.
pub const VCS_DIR: &str = ".git";
/// Directory name that marks a blog subtree.
pub const BLOG_DIR: &str = "blog";

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    InvalidPath(PathBuf),
}

/// What a file is, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Markdown,
    Html,
    Css,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" => FileKind::Markdown,
            "html" | "htm" => FileKind::Html,
            "css" => FileKind::Css,
            _ => FileKind::Other,
        }
    }
}

/// Walks one input root with fixed settings and converter.
pub struct Crawler<'a> {
    pub(crate) settings: &'a Settings,
    pub(crate) root: PathBuf,
    pub(crate) converter: &'a dyn Converter,
    /// Canonical output root, set for the duration of [`Crawler::crawl`].
    output_root: Option<PathBuf>,
}

impl<'a> Crawler<'a> {
    pub fn new(settings: &'a Settings, root: &Path, converter: &'a dyn Converter) -> Self {
        Self {
            settings,
            root: root.to_path_buf(),
            converter,
            output_root: None,
        }
    }

    /// Mirror `current` (at `depth` below the root) into `output`.
    ///
    /// The crawl root and `output` must both be existing directories.
    pub fn crawl(&self, current: &Path, output: &Path, depth: usize) -> Result<LinkRegistry, CrawlError> {
        if !self.root.is_dir() {
            return Err(CrawlError::InvalidPath(self.root.clone()));
        }
        if !output.is_dir() {
            return Err(CrawlError::InvalidPath(output.to_path_buf()));
        }
        let walker = Crawler {
            settings: self.settings,
            root: self.root.clone(),
            converter: self.converter,
            output_root: Some(fs::canonicalize(output)?),
        };
        walker.crawl_dir(current, output, depth)
    }

    /// Whether `dir` is the output root being written to.
    pub(crate) fn is_output_root(&self, dir: &Path) -> bool {
        match &self.output_root {
            Some(out) => fs::canonicalize(dir).is_ok_and(|d| &d == out),
            None => false,
        }
    }

    fn crawl_dir(&self, current: &Path, output: &Path, depth: usize) -> Result<LinkRegistry, CrawlError> {
        let mut registry = LinkRegistry::new();
        let at_root = current == self.root;

        for entry in collect_entries(current)? {
            let name = file_name(&entry);
            if self.settings.is_excluded(&self.rel(&entry)) {
                log::info!("Excluded {}", self.rel(&entry));
                continue;
            }

            if entry.is_dir() {
                if self.is_output_root(&entry) {
                    log::info!("Skipping output directory {}", self.rel(&entry));
                    continue;
                }
                let out_dir = output.join(&name);
                if !ensure_dir(&out_dir) {
                    continue;
                }
                let child = if name == BLOG_DIR {
                    Ok(blog::build_blog(self, &entry, &out_dir, depth + 1))
                } else {
                    self.crawl_dir(&entry, &out_dir, depth + 1)
                };
                match child {
                    Ok(child) => registry.extend(child),
                    Err(e) => log::warn!("Skipping {}: {e}", entry.display()),
                }
                continue;
            }

            if at_root {
                if self.settings.is_reserved_root_file(&name) {
                    continue;
                }
                if !self.settings.auto_style.is_empty() && name == self.settings.auto_style {
                    self.copy_into(&entry, output);
                    continue;
                }
            }

            match FileKind::of(&entry) {
                FileKind::Markdown => {
                    if let Some(file) = self.convert_markdown(&entry, output, depth) {
                        push_link(&mut registry, join_rel(&self.rel(current), &file), &entry);
                    }
                }
                FileKind::Html => {
                    if self.settings.duplicate_html && self.copy_into(&entry, output) {
                        push_link(&mut registry, self.rel(&entry), &entry);
                    }
                }
                FileKind::Css if self.settings.is_listed_style(&name) => {
                    self.copy_into(&entry, output);
                }
                FileKind::Css | FileKind::Other => {
                    if self.settings.duplicate_files {
                        self.copy_into(&entry, output);
                    }
                }
            }
        }

        Ok(registry)
    }

    /// Convert one markdown source into `output_dir`, copying the source too
    /// when `duplicate_md` is set.
    ///
    /// Returns the output file name on success.
    pub(crate) fn convert_markdown(&self, source: &Path, output_dir: &Path, depth: usize) -> Option<String> {
        let stem = source.file_stem()?.to_string_lossy().to_string();
        let file = format!("{stem}{}", self.settings.output_extension);
        let destination = output_dir.join(&file);

        let options = conversion_options(self.settings, &self.root, depth);
        if let Err(e) = self.converter.convert(source, &destination, &options) {
            log::warn!("Conversion of {} failed: {e}", source.display());
            return None;
        }
        log::info!("Converted {} -> {}", self.rel(source), destination.display());

        if self.settings.duplicate_md {
            self.copy_into(source, output_dir);
        }
        Some(file)
    }

    /// Copy `source` into `output_dir` under the same name. Logs and returns
    /// `false` on failure.
    pub(crate) fn copy_into(&self, source: &Path, output_dir: &Path) -> bool {
        let destination = output_dir.join(file_name(source));
        match fs::copy(source, &destination) {
            Ok(_) => {
                log::info!("Copied {}", self.rel(source));
                true
            }
            Err(e) => {
                log::warn!("Could not copy {} to {}: {e}", source.display(), destination.display());
                false
            }
        }
    }

    /// `path` relative to the crawl root, `/`-separated.
    pub(crate) fn rel(&self, path: &Path) -> String {
        rel_string(&self.root, path)
    }
}

/// Record `link`, produced from `source`, unless an earlier entry already
/// wrote the same output file.
fn push_link(registry: &mut LinkRegistry, link: String, source: &Path) {
    if registry.regular.contains(&link) {
        log::warn!("{} overwrites {link}, which another source already produced", source.display());
        return;
    }
    registry.regular.push(link);
}

/// Create `dir` if needed. A file in the way or a failed creation is logged
/// and reported as `false`.
pub(crate) fn ensure_dir(dir: &Path) -> bool {
    if dir.is_dir() {
        return true;
    }
    if dir.exists() {
        log::warn!("{} exists and is not a directory, skipping subtree", dir.display());
        return false;
    }
    match fs::create_dir(dir) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not create {}: {e}", dir.display());
            false
        }
    }
}

/// Directory entries sorted by name, version-control metadata removed.
pub(crate) fn collect_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| file_name(p) != VCS_DIR)
        .collect();
    entries.sort();
    Ok(entries)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `path` relative to `root` as a `/`-separated string; empty for `root` itself.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
