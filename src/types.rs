//! Shared records passed between the crawler, the blog builder and the feed
//! emitter.
//!
//! Registries are built bottom-up: every crawl level returns one for its
//! subtree and the caller appends it to its own. A registry is never touched
//! again once the level that built it has returned.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// Output locations produced by a crawl, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkRegistry {
    /// Output paths relative to the output root, `/`-separated.
    pub regular: Vec<String>,
    pub blogs: Vec<BlogResult>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a single blog and no regular links.
    pub fn from_blog(blog: BlogResult) -> Self {
        Self {
            regular: Vec::new(),
            blogs: vec![blog],
        }
    }

    /// Append `child` after everything already collected.
    pub fn extend(&mut self, child: LinkRegistry) {
        self.regular.extend(child.regular);
        self.blogs.extend(child.blogs);
    }

    /// Number of sitemap entries: regular links plus every blog article.
    pub fn url_count(&self) -> usize {
        self.regular.len() + self.blogs.iter().map(|b| b.articles.len()).sum::<usize>()
    }
}

/// One language variant of a blog article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Name of the article folder.
    pub folder: String,
    /// Language tag, from the markdown file stem (`en.md` → `en`).
    pub lang: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Date as written in front-matter, empty when absent.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_object: Option<NaiveDateTime>,
    /// Output path relative to the blog root, e.g. `post1/en.html`.
    pub file: String,
    pub source_file: PathBuf,
}

/// Articles collected from one blog subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogResult {
    /// Blog directory relative to the crawl root, `/`-separated.
    pub root: String,
    /// Sorted by `date_object`, undated articles counting as the earliest.
    pub articles: Vec<Article>,
}

impl BlogResult {
    /// Path of an article relative to the output root.
    pub fn article_path(&self, article: &Article) -> String {
        join_rel(&self.root, &article.file)
    }
}

/// Join two `/`-separated relative paths, tolerating an empty prefix.
pub fn join_rel(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), rel)
    }
}
