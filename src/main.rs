use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use mdsite::build::{self, BuildError};
use mdsite::convert::{Converter, NativeConverter, PandocConverter};
use mdsite::{output, settings};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(version)]
#[command(about = "Mirror a tree of markdown and HTML into a static website")]
#[command(long_about = "\
Mirror a tree of markdown and HTML into a static website

Every markdown file is converted to HTML next to where it was found. A
directory named `blog` holds one folder per article with one markdown file
per language; it gets an index page and an RSS feed. The whole site gets a
sitemap.

Source structure:

  source/
  ├── settings.toml        # Overrides --settings (not published)
  ├── header.html          # Inserted before every page body (not published)
  ├── footer.html          # Inserted after every page body (not published)
  ├── style.css            # Linked from every page
  ├── index.md             # → index.html
  ├── notes/
  │   └── setup.md         # → notes/setup.html
  └── blog/
      ├── 2020-hello/
      │   ├── en.md        # → blog/2020-hello/en.html
      │   ├── fr.md        # → blog/2020-hello/fr.html
      │   └── data/        # copied as-is
      └── draft/
          └── en.md

Article front-matter (YAML):

  ---
  title: Hello
  date: 2020-01-01
  abstract: First post.
  ---

Run 'mdsite gen-settings' to print a documented settings file.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that read the source tree.
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Source directory
    #[arg(long, default_value = "content")]
    source: PathBuf,

    /// Base settings file; the source root's settings.toml overrides it
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConverterKind {
    /// Run the external pandoc program
    Pandoc,
    /// Render in-process, no external program needed
    Native,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (must exist)
        #[arg(long, default_value = "dist")]
        output: PathBuf,

        /// Log every file processed
        #[arg(long, short)]
        verbose: bool,

        /// Markdown converter
        #[arg(long, value_enum, default_value = "pandoc")]
        converter: ConverterKind,

        /// Pandoc executable
        #[arg(long, default_value = "pandoc")]
        pandoc: PathBuf,

        /// Write the collected links as JSON to this file
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Resolve settings and validate the source directory without building
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print a stock settings.toml with all options documented
    GenSettings,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), BuildError> {
    match cli.command {
        Command::Build {
            source,
            output: output_dir,
            verbose,
            converter,
            pandoc,
            manifest,
        } => {
            let settings = build::resolve_settings(source.settings.as_deref(), &source.source)?;
            init_logging(verbose || settings.verbose);

            let converter: Box<dyn Converter> = match converter {
                ConverterKind::Pandoc => Box::new(PandocConverter::with_program(pandoc)),
                ConverterKind::Native => Box::new(NativeConverter::new()),
            };

            println!("==> Building {} \u{2192} {}", source.source.display(), output_dir.display());
            let summary = build::build_site(&settings, &source.source, &output_dir, converter.as_ref())?;
            output::print_build_output(&summary, &output_dir);

            if let Some(path) = manifest {
                write_manifest(&path, &summary)?;
                println!("Manifest: {}", path.display());
            }
            println!("==> Build complete: {}", output_dir.display());
        }
        Command::Check { source } => {
            let settings = build::resolve_settings(source.settings.as_deref(), &source.source)?;
            init_logging(settings.verbose);
            println!("==> Checking {}", source.source.display());
            build::check_input(&settings, &source.source)?;
            println!("==> Source is valid");
        }
        Command::GenSettings => {
            print!("{}", settings::stock_settings_toml());
        }
    }
    Ok(())
}

/// Warnings only by default, per-file progress when verbose. `RUST_LOG` wins.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn write_manifest(path: &Path, summary: &build::BuildSummary) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(&summary.registry).map_err(std::io::Error::other)?;
    std::fs::write(path, json)?;
    Ok(())
}
