//! Markdown to HTML conversion.
//!
//! The crawler and blog builder never interpret markdown themselves. For every
//! source they compute a [`ConversionOptions`] and hand it, with the source and
//! destination paths, to a [`Converter`]:
//!
//! | Converter | How |
//! |-----------|-----|
//! | [`PandocConverter`] | runs the external `pandoc` program, one process per document |
//! | [`NativeConverter`] | renders in-process with pulldown-cmark and maud |
//!
//! Conversion is best-effort per file: callers log a failed conversion and
//! move on.

mod native;
mod pandoc;

pub use native::NativeConverter;
pub use pandoc::PandocConverter;

use crate::settings::Settings;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("converting {source_file} exited with {status}: {stderr}")]
    Failed {
        source_file: PathBuf,
        status: String,
        stderr: String,
    },
}

/// Everything a converter needs besides the source and destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOptions {
    /// HTML injected before the document body.
    pub header: Option<PathBuf>,
    /// HTML injected after the document body.
    pub footer: Option<PathBuf>,
    /// Stylesheet references, already relative to the destination's directory.
    pub stylesheets: Vec<String>,
    /// Extra flags from `converter_opts`.
    pub passthrough: Vec<String>,
}

/// A markdown to HTML converter.
pub trait Converter {
    /// Convert `source` into a standalone HTML document at `destination`.
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<(), ConvertError>;
}

/// Compute the options for a document `depth` directories below the crawl root.
///
/// Header, footer and `auto_style` are only used when the file exists at the
/// crawl root. Stylesheet references climb `depth` levels so they resolve
/// from the converted file's location.
pub fn conversion_options(settings: &Settings, root: &Path, depth: usize) -> ConversionOptions {
    let root_file = |name: &str| -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        let path = root.join(name);
        path.is_file().then_some(path)
    };

    let prefix = "../".repeat(depth);
    let mut stylesheets = Vec::new();
    if root_file(&settings.auto_style).is_some() {
        stylesheets.push(format!("{prefix}{}", settings.auto_style));
    }
    for style in &settings.styles {
        let reference = format!("{prefix}{style}");
        if !stylesheets.contains(&reference) {
            stylesheets.push(reference);
        }
    }

    ConversionOptions {
        header: root_file(&settings.auto_header),
        footer: root_file(&settings.auto_footer),
        stylesheets,
        passthrough: settings.converter_opts.clone(),
    }
}
