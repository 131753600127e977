//! Sitemap and RSS documents.
//!
//! Both are rendered from the link registry collected by the crawl:
//!
//! ```text
//! dist/
//! ├── sitemap.xml     # every regular page + every blog article
//! └── blog/
//!     └── rss.xml     # newest (or oldest) `rss_limit` articles of this blog
//! ```
//!
//! Links are made absolute by prefixing `site_root` when it is set. XML is
//! written with [quick-xml](https://docs.rs/quick-xml), which takes care of
//! escaping.

use crate::settings::Settings;
use crate::types::{Article, BlogResult, LinkRegistry};
use chrono::{TimeZone, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const RSS_FILE: &str = "rss.xml";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Characters left as-is in a path segment: RFC 3986 unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("XML error: {0}")]
    Xml(String),
}

/// Make an output-relative path absolute under `site_root`.
///
/// Each path segment is percent-encoded; `site_root` is used as written and
/// applied exactly once, whatever its trailing slashes.
pub fn resolve_url(site_root: &str, rel: &str) -> String {
    let rel = rel
        .trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    if site_root.is_empty() {
        rel
    } else {
        format!("{}/{}", site_root.trim_end_matches('/'), rel)
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

// ============================================================================
// XML plumbing
// ============================================================================

struct XmlDoc {
    writer: Writer<Vec<u8>>,
}

impl XmlDoc {
    fn new(pretty: bool) -> Result<Self, FeedError> {
        let writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        let mut doc = Self { writer };
        doc.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(doc)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), FeedError> {
        self.writer
            .write_event(event)
            .map_err(|e| FeedError::Xml(e.to_string()))
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.emit(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> Result<(), FeedError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), FeedError> {
        self.open(name, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> Result<String, FeedError> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| FeedError::Xml(e.to_string()))
    }
}

// ============================================================================
// Sitemap
// ============================================================================

/// Every URL the sitemap lists, in registry order.
pub fn sitemap_urls(settings: &Settings, registry: &LinkRegistry) -> Vec<String> {
    let regular = registry.regular.iter().cloned();
    let articles = registry
        .blogs
        .iter()
        .flat_map(|blog| blog.articles.iter().map(move |a| blog.article_path(a)));
    regular
        .chain(articles)
        .map(|p| resolve_url(&settings.site_root, &p))
        .collect()
}

pub fn render_sitemap(settings: &Settings, registry: &LinkRegistry) -> Result<String, FeedError> {
    let mut doc = XmlDoc::new(settings.sitemap_prettyprint)?;
    doc.open("urlset", &[("xmlns", SITEMAP_NS)])?;
    for url in sitemap_urls(settings, registry) {
        doc.open("url", &[])?;
        doc.text_element("loc", &[], &url)?;
        doc.close("url")?;
    }
    doc.close("urlset")?;
    doc.finish()
}

/// Write `sitemap.xml` into `output_root`.
pub fn write_sitemap(
    settings: &Settings,
    output_root: &Path,
    registry: &LinkRegistry,
) -> Result<PathBuf, FeedError> {
    let path = output_root.join(SITEMAP_FILE);
    fs::write(&path, render_sitemap(settings, registry)?)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

// ============================================================================
// RSS
// ============================================================================

fn item_guid(settings: &Settings, article: &Article, link: &str) -> (String, bool) {
    if settings.rss_guid_hash {
        match hash_file(&article.source_file) {
            Ok(hash) => return (hash, false),
            Err(e) => log::warn!(
                "Could not hash {} for its feed guid: {e}",
                article.source_file.display()
            ),
        }
    }
    (link.to_string(), true)
}

pub fn render_rss(settings: &Settings, blog: &BlogResult) -> Result<String, FeedError> {
    let mut doc = XmlDoc::new(true)?;
    doc.open("rss", &[("version", "2.0")])?;
    doc.open("channel", &[])?;
    doc.text_element("title", &[], &settings.blog_title)?;
    doc.text_element("link", &[], &resolve_url(&settings.site_root, &format!("{}/", blog.root)))?;
    doc.text_element("description", &[], &settings.blog_description)?;
    if !settings.rss_category.is_empty() {
        doc.text_element("category", &[], &settings.rss_category)?;
    }
    if !settings.rss_language.is_empty() {
        doc.text_element("language", &[], &settings.rss_language)?;
    }

    for article in blog.articles.iter().take(settings.rss_limit) {
        let link = resolve_url(&settings.site_root, &blog.article_path(article));
        let (guid, permalink) = item_guid(settings, article, &link);

        doc.open("item", &[])?;
        doc.text_element("title", &[], &article.title)?;
        doc.text_element("link", &[], &link)?;
        doc.text_element("description", &[], &article.abstract_text)?;
        if let Some(date) = &article.date_object {
            doc.text_element("pubDate", &[], &Utc.from_utc_datetime(date).to_rfc2822())?;
        }
        let is_permalink = if permalink { "true" } else { "false" };
        doc.text_element("guid", &[("isPermaLink", is_permalink)], &guid)?;
        doc.close("item")?;
    }

    doc.close("channel")?;
    doc.close("rss")?;
    doc.finish()
}

/// Write `rss.xml` for `blog` into its output directory.
pub fn write_rss(settings: &Settings, output_dir: &Path, blog: &BlogResult) -> Result<PathBuf, FeedError> {
    let path = output_dir.join(RSS_FILE);
    fs::write(&path, render_rss(settings, blog)?)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}
