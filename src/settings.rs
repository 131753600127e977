//! Site settings.
//!
//! Handles loading, merging, and validating settings files. Settings are
//! layered: stock defaults are overridden by a base settings file, which is
//! in turn overridden by a per-site override file found at the input root.
//!
//! ```text
//! stock defaults                 ← every key has a value
//! └── --settings site.toml       ← base file (optional on the CLI)
//!     └── content/settings.toml  ← override at the input root (auto_settings)
//! ```
//!
//! Only the input root is consulted for an override. Subdirectories never
//! carry their own settings, even though conversion happens at any depth.
//!
//! ## Partial Settings
//!
//! Settings files are sparse — override just the values you want:
//!
//! ```toml
//! site_root = "https://example.org"
//! rss_limit = 5
//! ```
//!
//! An override may add or replace keys but can never remove one. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Settings validation error: {0}")]
    Validation(String),
}

/// Build settings.
///
/// All fields have defaults. Settings files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Copy markdown sources next to their converted output.
    pub duplicate_md: bool,
    /// Copy files that are neither markdown, HTML nor a listed stylesheet.
    pub duplicate_files: bool,
    /// Copy HTML files and list them in the sitemap.
    pub duplicate_html: bool,
    /// Extension given to converted documents, dot included.
    pub output_extension: String,
    /// Report per-file progress.
    pub verbose: bool,
    /// Extra flags passed verbatim to the converter.
    pub converter_opts: Vec<String>,
    /// Write `sitemap.xml` at the output root.
    pub sitemap: bool,
    /// Indent the sitemap.
    pub sitemap_prettyprint: bool,
    /// Header file injected before every document body. Empty disables.
    pub auto_header: String,
    /// Footer file injected after every document body. Empty disables.
    pub auto_footer: String,
    /// Stylesheet at the input root linked from every document. Empty disables.
    pub auto_style: String,
    /// Name of the override settings file looked up at the input root.
    pub auto_settings: String,
    /// URL prefix for sitemap and feed links. Empty keeps links relative.
    pub site_root: String,
    /// Stylesheets copied wherever found and linked from every document.
    pub styles: Vec<String>,
    /// Paths, relative to the input root, that are skipped entirely.
    pub exclude_files: Vec<String>,
    pub blog_title: String,
    pub blog_h1: String,
    pub blog_description: String,
    /// Newest articles first when true, oldest first when false.
    pub reverse_order: bool,
    /// Write `rss.xml` for every blog.
    pub rss: bool,
    /// Maximum number of feed items.
    pub rss_limit: usize,
    pub rss_category: String,
    pub rss_language: String,
    /// Use a SHA-256 of the article source as the item guid instead of its link.
    pub rss_guid_hash: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duplicate_md: false,
            duplicate_files: true,
            duplicate_html: true,
            output_extension: ".html".to_string(),
            verbose: false,
            converter_opts: Vec::new(),
            sitemap: true,
            sitemap_prettyprint: true,
            auto_header: "header.html".to_string(),
            auto_footer: "footer.html".to_string(),
            auto_style: "style.css".to_string(),
            auto_settings: "settings.toml".to_string(),
            site_root: String::new(),
            styles: Vec::new(),
            exclude_files: Vec::new(),
            blog_title: "Blog".to_string(),
            blog_h1: "Blog".to_string(),
            blog_description: String::new(),
            reverse_order: true,
            rss: true,
            rss_limit: 20,
            rss_category: String::new(),
            rss_language: "en".to_string(),
            rss_guid_hash: false,
        }
    }
}

impl Settings {
    /// Validate values that the type system cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.output_extension.starts_with('.') || self.output_extension.len() < 2 {
            return Err(SettingsError::Validation(format!(
                "output_extension must look like \".html\", got {:?}",
                self.output_extension
            )));
        }
        if !self.site_root.is_empty()
            && !(self.site_root.starts_with("http://")
                || self.site_root.starts_with("https://")
                || self.site_root.starts_with('/'))
        {
            return Err(SettingsError::Validation(format!(
                "site_root must be an http(s) URL or an absolute path, got {:?}",
                self.site_root
            )));
        }
        Ok(())
    }

    /// Whether `rel` (a `/`-separated path relative to the input root) is excluded.
    pub fn is_excluded(&self, rel: &str) -> bool {
        self.exclude_files
            .iter()
            .any(|e| e.trim_matches('/') == rel)
    }

    /// Whether `name` is one of the configured propagated stylesheets.
    pub fn is_listed_style(&self, name: &str) -> bool {
        self.styles.iter().any(|s| s == name)
    }

    /// `auto_header`, `auto_footer` and `auto_settings`: files at the input
    /// root that configure the build instead of being published.
    pub fn is_reserved_root_file(&self, name: &str) -> bool {
        [&self.auto_header, &self.auto_footer, &self.auto_settings]
            .iter()
            .any(|reserved| !reserved.is_empty() && reserved.as_str() == name)
    }
}

// =============================================================================
// Loading, merging, and validation
// =============================================================================

/// Returns the stock defaults as a `toml::Value::Table`.
///
/// This is the base layer every settings file is merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist or holds no keys.
pub fn load_raw(path: &Path) -> Result<Option<toml::Value>, SettingsError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    match &value {
        toml::Value::Table(t) if t.is_empty() => Ok(None),
        _ => Ok(Some(value)),
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve(base: toml::Value, overlay: Option<toml::Value>) -> Result<Settings, SettingsError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load the base settings file on top of stock defaults.
///
/// Unlike an override, the base file is mandatory: a missing file is an error.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve(stock_defaults_value(), Some(overlay))
}

/// Merge the override file at `path` into `settings`, returning a new value.
///
/// A missing or empty override returns `settings` unchanged. Merging the same
/// file twice gives the same result as merging it once.
pub fn merge(settings: &Settings, path: &Path) -> Result<Settings, SettingsError> {
    match load_raw(path)? {
        None => Ok(settings.clone()),
        Some(overlay) => {
            let base = toml::Value::try_from(settings)
                .map_err(|e| SettingsError::Validation(e.to_string()))?;
            resolve(base, Some(overlay))
        }
    }
}

/// Apply the input root's override file, named by `auto_settings`.
pub fn merge_root_override(settings: &Settings, input_root: &Path) -> Result<Settings, SettingsError> {
    if settings.auto_settings.is_empty() {
        return Ok(settings.clone());
    }
    merge(settings, &input_root.join(&settings.auto_settings))
}

/// Returns a fully-commented stock settings file with every key.
///
/// Used by the `gen-settings` CLI command.
pub fn stock_settings_toml() -> &'static str {
    r##"# mdsite settings
# ===============
# All settings are optional. Values shown below are the defaults.
#
# A base file is passed with --settings. A second file named by
# `auto_settings` at the root of the source tree overrides it.
# Each file only needs the keys it wants to change.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Output tree
# ---------------------------------------------------------------------------
# Copy markdown sources next to the converted pages.
duplicate_md = false
# Copy every other file (images, downloads, ...).
duplicate_files = true
# Copy .html files and list them in the sitemap.
duplicate_html = true
# Extension of converted pages.
output_extension = ".html"
# Print per-file progress.
verbose = false
# Paths relative to the source root that are skipped entirely.
exclude_files = []

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
# Extra flags passed to the converter, e.g. ["--toc"].
converter_opts = []
# Files at the source root. Set to "" to disable.
auto_header = "header.html"
auto_footer = "footer.html"
auto_style = "style.css"
auto_settings = "settings.toml"
# Stylesheets copied wherever they appear and linked from every page.
styles = []

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
sitemap = true
sitemap_prettyprint = true
# Prefix for absolute links, e.g. "https://example.org". "" keeps links relative.
site_root = ""

# ---------------------------------------------------------------------------
# Blog (any directory named "blog")
# ---------------------------------------------------------------------------
blog_title = "Blog"
blog_h1 = "Blog"
blog_description = ""
# Newest first when true.
reverse_order = true

# ---------------------------------------------------------------------------
# RSS
# ---------------------------------------------------------------------------
rss = true
rss_limit = 20
rss_category = ""
rss_language = "en"
# Identify items by a SHA-256 of their source instead of their link.
rss_guid_hash = false
"##
}
