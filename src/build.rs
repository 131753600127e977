//! The whole build: settings resolution, crawl, sitemap.
//!
//! ```text
//! stock defaults → --settings file → <source>/settings.toml
//!                         │
//!                         ▼
//!   source/ ──crawl──▶ output/   (pages, copies, blog indexes, rss.xml)
//!                         │
//!                         ▼
//!                   output/sitemap.xml
//! ```
//!
//! Only problems with the settings or the two roots are fatal. Everything
//! else is logged by the stage that hit it and the build carries on.

use crate::convert::Converter;
use crate::crawl::{CrawlError, Crawler};
use crate::feed::{self, FeedError, RSS_FILE};
use crate::settings::{self, Settings, SettingsError};
use crate::types::LinkRegistry;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Input is not a directory: {0}")]
    InvalidInput(PathBuf),
    #[error("Output is not a directory: {0}")]
    InvalidOutput(PathBuf),
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),
    #[error("Sitemap error: {0}")]
    Sitemap(#[from] FeedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Process exit status for this failure. `2` is left to argument parsing.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Settings(_) => 1,
            BuildError::InvalidInput(_) => 3,
            BuildError::InvalidOutput(_) => 4,
            BuildError::Crawl(CrawlError::InvalidPath(_)) => 3,
            BuildError::Crawl(_) | BuildError::Sitemap(_) | BuildError::Io(_) => 1,
        }
    }
}

/// What a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub registry: LinkRegistry,
    /// `None` when sitemap generation is disabled.
    pub sitemap: Option<PathBuf>,
    /// RSS files present after the build, one per blog at most.
    pub feeds: Vec<PathBuf>,
}

/// Resolve settings for a build of `input`: stock defaults, then the `base`
/// file when given, then the override file at the input root.
pub fn resolve_settings(base: Option<&Path>, input: &Path) -> Result<Settings, SettingsError> {
    let settings = match base {
        Some(path) => settings::load(path)?,
        None => Settings::default(),
    };
    settings::merge_root_override(&settings, input)
}

/// Check that `input` can be built with `settings`, without writing anything.
pub fn check_input(settings: &Settings, input: &Path) -> Result<(), BuildError> {
    settings.validate()?;
    if !input.is_dir() {
        return Err(BuildError::InvalidInput(input.to_path_buf()));
    }
    Ok(())
}

/// Build `input` into `output`.
///
/// Both `input` and `output` must be existing directories. Settings are used
/// as given: apply [`resolve_settings`] first to pick up the input root's
/// override file.
pub fn build_site(
    settings: &Settings,
    input: &Path,
    output: &Path,
    converter: &dyn Converter,
) -> Result<BuildSummary, BuildError> {
    check_input(settings, input)?;
    if !output.is_dir() {
        return Err(BuildError::InvalidOutput(output.to_path_buf()));
    }

    log::info!("Building {} -> {}", input.display(), output.display());
    let registry = Crawler::new(settings, input, converter).crawl(input, output, 0)?;

    let sitemap = if settings.sitemap {
        Some(feed::write_sitemap(settings, output, &registry)?)
    } else {
        None
    };

    let feeds = if settings.rss {
        registry
            .blogs
            .iter()
            .map(|blog| output.join(&blog.root).join(RSS_FILE))
            .filter(|path| path.is_file())
            .collect()
    } else {
        Vec::new()
    };

    Ok(BuildSummary {
        registry,
        sitemap,
        feeds,
    })
}
