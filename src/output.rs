//! CLI output formatting.
//!
//! Per-file progress goes through the `log` facade to stderr. What lands on
//! stdout is the end-of-build inventory, grouped by what a reader of the site
//! will see rather than by where files came from:
//!
//! ```text
//! Pages
//! 001 about.html
//! 002 notes/setup.html
//!
//! Blog blog (2 articles)
//! 001 2020-01-01 - EN - Hello → blog/post1/en.html
//! 002 EN - post2 → blog/post2/en.html
//!     Feed: blog/rss.xml
//!
//! Sitemap: sitemap.xml (4 URLs)
//! Built 2 pages, 1 blog, 2 articles
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write to stdout.

use crate::build::BuildSummary;
use crate::crawl::rel_string;
use crate::types::{Article, BlogResult};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// `2020-01-01 - EN - Hello`, without the date when there is none.
fn article_label(article: &Article) -> String {
    let lang = article.lang.to_uppercase();
    if article.date.is_empty() {
        format!("{} - {}", lang, article.title)
    } else {
        format!("{} - {} - {}", article.date, lang, article.title)
    }
}

// ============================================================================
// Build output
// ============================================================================

fn format_blog(blog: &BlogResult, feed: Option<&str>) -> Vec<String> {
    let mut lines = vec![format!(
        "Blog {} ({})",
        blog.root,
        plural(blog.articles.len(), "article", "articles")
    )];
    for (i, article) in blog.articles.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            article_label(article),
            blog.article_path(article)
        ));
    }
    if let Some(feed) = feed {
        lines.push(format!("    Feed: {}", feed));
    }
    lines
}

/// Format the inventory of a finished build. Paths are shown relative to
/// `output_root`.
pub fn format_build_output(summary: &BuildSummary, output_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let registry = &summary.registry;

    if !registry.regular.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in registry.regular.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), page));
        }
    }

    let feeds: Vec<String> = summary
        .feeds
        .iter()
        .map(|f| rel_string(output_root, f))
        .collect();
    for blog in &registry.blogs {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let feed = feeds
            .iter()
            .find(|f| Path::new(f.as_str()).parent() == Some(Path::new(&blog.root)));
        lines.extend(format_blog(blog, feed.map(String::as_str)));
    }

    if let Some(sitemap) = &summary.sitemap {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!(
            "Sitemap: {} ({})",
            rel_string(output_root, sitemap),
            plural(registry.url_count(), "URL", "URLs")
        ));
    }

    let articles: usize = registry.blogs.iter().map(|b| b.articles.len()).sum();
    lines.push(format!(
        "Built {}, {}, {}",
        plural(registry.regular.len(), "page", "pages"),
        plural(registry.blogs.len(), "blog", "blogs"),
        plural(articles, "article", "articles")
    ));
    lines
}

/// Print the build inventory to stdout.
pub fn print_build_output(summary: &BuildSummary, output_root: &Path) {
    for line in format_build_output(summary, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
