//! # mdsite
//!
//! Mirror a directory of markdown and HTML into a static website. Markdown is
//! converted page by page, every `blog` directory gets a dated index and an
//! RSS feed, and the whole output gets a sitemap.
//!
//! # Architecture: One Depth-First Pass
//!
//! ```text
//! settings  stock defaults → --settings file → <source>/settings.toml
//! crawl     source/  →  output/      (convert .md, copy the rest)
//! blog      blog/*/  →  blog/index.html + blog/rss.xml
//! feed      registry →  sitemap.xml
//! ```
//!
//! Each crawl level returns a [`types::LinkRegistry`] for its subtree and the
//! parent appends it to its own, so the final registry lists every page in
//! the order the directory walk found it. The sitemap is rendered from that
//! registry once the walk is done.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`settings`] | Typed settings, TOML layering and validation |
//! | [`crawl`] | Recursive walk that routes each entry by kind |
//! | [`blog`] | Article collection, date sorting, index synthesis |
//! | [`frontmatter`] | YAML front-matter splitting and date parsing |
//! | [`convert`] | The [`convert::Converter`] seam: pandoc process or in-process rendering |
//! | [`feed`] | Sitemap and RSS documents |
//! | [`build`] | Whole-build entry point and fatal error classes |
//! | [`types`] | Registry and article records shared by the stages |
//! | [`output`] | End-of-build inventory printed by the CLI |
//!
//! # Design Decisions
//!
//! ## Conversion Behind a Trait
//!
//! Turning markdown into HTML is the converter's job, not the crawler's. The
//! crawler only computes what to hand over (header, footer, stylesheets
//! prefixed for the page's depth, passthrough flags). Pandoc does the real
//! work by default; [`convert::NativeConverter`] covers machines without it,
//! and tests plug in a recording mock.
//!
//! ## Best-Effort Per File
//!
//! A page that fails to convert, a file that cannot be copied or an article
//! with an unreadable date is logged and skipped. Only unusable settings or
//! roots stop the build; see [`build::BuildError::exit_code`].
//!
//! ## Deterministic Output
//!
//! Directory entries are processed in name order and articles are sorted
//! stably, so two builds of the same tree write byte-identical sitemap and
//! RSS files.

pub mod blog;
pub mod build;
pub mod convert;
pub mod crawl;
pub mod feed;
pub mod frontmatter;
pub mod output;
pub mod settings;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
