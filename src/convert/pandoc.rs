//! Conversion through the external `pandoc` program.
//!
//! One blocking process per document. The command line is:
//!
//! ```text
//! pandoc <source> -o <dest> -s -t html5 [-B header] [-A footer] [-c css]... [converter_opts]...
//! ```

use super::{ConversionOptions, ConvertError, Converter};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PandocConverter {
    pub fn new() -> Self {
        Self::with_program("pandoc")
    }

    /// Use a specific executable instead of `pandoc` from `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the argument list for one conversion.
    pub fn args(source: &Path, destination: &Path, options: &ConversionOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            source.into(),
            "-o".into(),
            destination.into(),
            "-s".into(),
            "-t".into(),
            "html5".into(),
        ];
        if let Some(header) = &options.header {
            args.push("-B".into());
            args.push(header.into());
        }
        if let Some(footer) = &options.footer {
            args.push("-A".into());
            args.push(footer.into());
        }
        for css in &options.stylesheets {
            args.push("-c".into());
            args.push(css.into());
        }
        args.extend(options.passthrough.iter().map(OsString::from));
        args
    }
}

impl Converter for PandocConverter {
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<(), ConvertError> {
        let args = Self::args(source, destination, options);
        log::debug!("{} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                source_file: source.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
