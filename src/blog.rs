//! Blog subtrees.
//!
//! A directory named `blog` holds one folder per article, and each article
//! folder holds one markdown file per language:
//!
//! ```text
//! blog/
//! ├── 2020-hello/
//! │   ├── en.md          # English variant, lang = "en"
//! │   ├── fr.md          # French variant, lang = "fr"
//! │   └── data/          # copied verbatim, replacing any previous copy
//! │       └── chart.svg
//! └── draft-notes/
//!     └── en.md
//! ```
//!
//! Every variant becomes an [`Article`]. Defaults (title = folder name, no
//! date, no abstract) are overlaid by the file's front-matter. Articles are
//! then sorted by date, and a synthesized markdown index listing them is
//! converted into `index.html` next to the article folders. With `rss`
//! enabled the blog also gets an `rss.xml`.

use crate::convert::conversion_options;
use crate::crawl::{Crawler, FileKind, collect_entries, ensure_dir, file_name};
use crate::feed;
use crate::frontmatter;
use crate::settings::Settings;
use crate::types::{Article, BlogResult, LinkRegistry};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Asset folder inside an article, copied without conversion.
pub const DATA_DIR: &str = "data";
/// Name of the synthesized index source, removed after conversion.
const INDEX_SOURCE: &str = "index.md";

/// Build the blog rooted at `blog_dir`, which sits `depth` levels below the
/// crawl root, into `output_dir`.
///
/// Never fails: unreadable folders and broken articles are logged and skipped.
pub fn build_blog(crawler: &Crawler, blog_dir: &Path, output_dir: &Path, depth: usize) -> LinkRegistry {
    let settings = crawler.settings;
    let mut articles = Vec::new();

    match collect_entries(blog_dir) {
        Ok(entries) => {
            let reserved = reserved_names(settings);
            for folder in entries.iter().filter(|p| p.is_dir()) {
                if settings.is_excluded(&crawler.rel(folder)) || crawler.is_output_root(folder) {
                    continue;
                }
                let name = file_name(folder);
                if reserved.contains(&name) {
                    log::warn!(
                        "Skipping article folder {}: {name} is generated for the blog",
                        crawler.rel(folder)
                    );
                    continue;
                }
                let out_folder = output_dir.join(file_name(folder));
                if !ensure_dir(&out_folder) {
                    continue;
                }
                articles.extend(build_article_folder(crawler, folder, &out_folder, depth + 1));
            }
        }
        Err(e) => log::warn!("Could not read blog {}: {e}", blog_dir.display()),
    }

    sort_articles(&mut articles, settings.reverse_order);
    let blog = BlogResult {
        root: crawler.rel(blog_dir),
        articles,
    };

    write_index(crawler, &blog, output_dir, depth);
    if settings.rss {
        if let Err(e) = feed::write_rss(settings, output_dir, &blog) {
            log::warn!("Could not write feed for {}: {e}", blog.root);
        }
    }
    log::info!("Blog {}: {} articles", blog.root, blog.articles.len());

    LinkRegistry::from_blog(blog)
}

/// File names the blog writes next to its article folders.
fn reserved_names(settings: &Settings) -> Vec<String> {
    let mut names = vec![
        INDEX_SOURCE.to_string(),
        format!("index{}", settings.output_extension),
    ];
    if settings.rss {
        names.push(feed::RSS_FILE.to_string());
    }
    names
}

/// Convert every language variant in one article folder.
fn build_article_folder(crawler: &Crawler, folder: &Path, output_dir: &Path, depth: usize) -> Vec<Article> {
    let settings = crawler.settings;
    let folder_name = file_name(folder);
    let entries = match collect_entries(folder) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Could not read article {}: {e}", folder.display());
            return Vec::new();
        }
    };

    let mut articles = Vec::new();
    for entry in entries {
        let name = file_name(&entry);
        if settings.is_excluded(&crawler.rel(&entry)) {
            continue;
        }
        if entry.is_dir() {
            if name == DATA_DIR {
                if let Err(e) = copy_tree_replacing(&entry, &output_dir.join(DATA_DIR)) {
                    log::warn!("Could not copy {}: {e}", entry.display());
                }
            } else {
                log::debug!("Ignoring nested directory {}", entry.display());
            }
            continue;
        }

        match FileKind::of(&entry) {
            FileKind::Markdown => {
                if let Some(file) = crawler.convert_markdown(&entry, output_dir, depth) {
                    articles.push(read_article(&entry, &folder_name, &file));
                }
            }
            _ if settings.duplicate_files => {
                crawler.copy_into(&entry, output_dir);
            }
            _ => {}
        }
    }
    articles
}

/// Build the article record for one converted variant.
fn read_article(source: &Path, folder: &str, output_file: &str) -> Article {
    let lang = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut article = Article {
        folder: folder.to_string(),
        lang,
        title: folder.to_string(),
        abstract_text: String::new(),
        date: String::new(),
        date_object: None,
        file: format!("{folder}/{output_file}"),
        source_file: source.to_path_buf(),
    };

    let content = match fs::read_to_string(source) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Could not read {}: {e}", source.display());
            return article;
        }
    };
    match frontmatter::read(&content) {
        Ok(fm) => {
            if let Some(title) = fm.title {
                article.title = title;
            }
            if let Some(abstract_text) = fm.abstract_text {
                article.abstract_text = abstract_text;
            }
            if let Some(date) = fm.date {
                article.date = date;
            }
        }
        Err(e) => log::warn!("Bad front-matter in article {folder} ({}): {e}", article.lang),
    }

    if !article.date.is_empty() {
        match frontmatter::parse_date(&article.date) {
            Ok(d) => article.date_object = Some(d),
            Err(e) => log::warn!("Article {folder}: {e}, sorting it as undated"),
        }
    }
    article
}

/// Sort by date, newest first when `newest_first`. Undated articles count as
/// the earliest possible date; ties keep discovery order.
pub fn sort_articles(articles: &mut [Article], newest_first: bool) {
    if newest_first {
        articles.sort_by(|a, b| b.date_object.cmp(&a.date_object));
    } else {
        articles.sort_by(|a, b| a.date_object.cmp(&b.date_object));
    }
}

#[derive(Serialize)]
struct IndexMeta<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
}

/// The markdown source of a blog index: front-matter, heading, one bullet per
/// article in the given order.
pub fn render_index(settings: &Settings, articles: &[Article]) -> Result<String, serde_yaml::Error> {
    let meta = serde_yaml::to_string(&IndexMeta {
        title: &settings.blog_title,
        description: &settings.blog_description,
    })?;

    let mut doc = format!("---\n{meta}...\n\n");
    if !settings.blog_h1.is_empty() {
        doc.push_str(&format!("# {}\n\n", settings.blog_h1));
    }
    for article in articles {
        let lang = article.lang.to_uppercase();
        let label = if article.date.is_empty() {
            format!("{lang} - {}", article.title)
        } else {
            format!("{} - {lang} - {}", article.date, article.title)
        };
        doc.push_str(&format!(
            "- [{}]({})\n",
            escape_link_text(&label),
            link_target(&article.file)
        ));
    }
    Ok(doc)
}

fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn link_target(file: &str) -> String {
    if file.contains([' ', '(', ')']) {
        format!("<{file}>")
    } else {
        file.to_string()
    }
}

/// Convert the synthesized index into `index<ext>` and drop its source.
fn write_index(crawler: &Crawler, blog: &BlogResult, output_dir: &Path, depth: usize) {
    let settings = crawler.settings;
    let source = output_dir.join(INDEX_SOURCE);
    let destination = output_dir.join(format!("index{}", settings.output_extension));

    let written = render_index(settings, &blog.articles)
        .map_err(|e| io::Error::other(e.to_string()))
        .and_then(|doc| fs::write(&source, doc));
    if let Err(e) = written {
        log::warn!("Could not write index source for {}: {e}", blog.root);
        return;
    }

    let options = conversion_options(settings, &crawler.root, depth);
    match crawler.converter.convert(&source, &destination, &options) {
        Ok(()) => log::info!("Converted index of {}", blog.root),
        Err(e) => log::warn!("Conversion of index for {} failed: {e}", blog.root),
    }
    if let Err(e) = fs::remove_file(&source) {
        log::warn!("Could not remove {}: {e}", source.display());
    }
}

/// Copy `src` to `dst` recursively, removing whatever was at `dst` first.
fn copy_tree_replacing(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.is_dir() {
        fs::remove_dir_all(dst)?;
    } else if dst.exists() {
        fs::remove_file(dst)?;
    }
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::MockConverter;
    use crate::frontmatter::parse_date;
    use crate::test_helpers::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn article(folder: &str, date: &str) -> Article {
        Article {
            folder: folder.into(),
            lang: "en".into(),
            title: folder.into(),
            abstract_text: String::new(),
            date: date.into(),
            date_object: parse_date(date).ok(),
            file: format!("{folder}/en.html"),
            source_file: PathBuf::new(),
        }
    }

    fn folders(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.folder.as_str()).collect()
    }

    /// Crawl `input` (which contains a `blog/`) and return the blog result.
    fn build(settings: &Settings, input: &Path, output: &Path, converter: &MockConverter) -> BlogResult {
        let registry = Crawler::new(settings, input, converter)
            .crawl(input, output, 0)
            .unwrap();
        registry.blogs.into_iter().next().expect("a blog")
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    #[test]
    fn sort_newest_first_with_undated_last() {
        let mut articles = vec![
            article("undated", ""),
            article("old", "2019-01-01"),
            article("new", "2021-01-01"),
        ];
        sort_articles(&mut articles, true);
        assert_eq!(folders(&articles), vec!["new", "old", "undated"]);
    }

    #[test]
    fn sort_oldest_first_with_undated_first() {
        let mut articles = vec![
            article("new", "2021-01-01"),
            article("undated", ""),
            article("old", "2019-01-01"),
        ];
        sort_articles(&mut articles, false);
        assert_eq!(folders(&articles), vec!["undated", "old", "new"]);
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let mut articles = vec![
            article("a", "2020-01-01"),
            article("b", "2020-01-01"),
            article("c", ""),
            article("d", ""),
        ];
        sort_articles(&mut articles, true);
        assert_eq!(folders(&articles), vec!["a", "b", "c", "d"]);
        sort_articles(&mut articles, false);
        assert_eq!(folders(&articles), vec!["c", "d", "a", "b"]);
    }

    // =========================================================================
    // Index rendering
    // =========================================================================

    #[test]
    fn index_lists_articles_in_order() {
        let settings = Settings {
            blog_title: "My Blog".into(),
            blog_h1: "Posts".into(),
            ..Settings::default()
        };
        let mut second = article("p2", "");
        second.title = "Second".into();
        second.lang = "fr".into();
        let mut first = article("p1", "2020-01-01");
        first.title = "Hello".into();

        let doc = render_index(&settings, &[first, second]).unwrap();
        assert!(doc.starts_with("---\ntitle: My Blog\n...\n"));
        assert!(doc.contains("# Posts\n"));
        let hello = doc.find("- [2020-01-01 - EN - Hello](p1/en.html)").unwrap();
        let second = doc.find("- [FR - Second](p2/en.html)").unwrap();
        assert!(hello < second);
    }

    #[test]
    fn index_front_matter_is_valid_yaml() {
        let settings = Settings {
            blog_title: "Notes: \"quoted\" # not a comment".into(),
            blog_description: "About things".into(),
            ..Settings::default()
        };
        let doc = render_index(&settings, &[]).unwrap();
        let fm = frontmatter::read(&doc).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Notes: \"quoted\" # not a comment"));
    }

    #[test]
    fn index_escapes_link_text() {
        let mut a = article("p1", "");
        a.title = "[draft] *wip*".into();
        let doc = render_index(&Settings::default(), &[a]).unwrap();
        assert!(doc.contains(r"- [EN - \[draft\] \*wip\*](p1/en.html)"));
    }

    // =========================================================================
    // Building
    // =========================================================================

    #[test]
    fn articles_from_front_matter_and_defaults() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[
                ("blog/post1/en.md", "---\ntitle: Hello\ndate: 2020-01-01\nabstract: Hi.\n---\nBody"),
                ("blog/post2/en.md", "No front-matter"),
            ],
        );
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);

        assert_eq!(blog.root, "blog");
        assert_eq!(folders(&blog.articles), vec!["post1", "post2"]);
        let hello = &blog.articles[0];
        assert_eq!(hello.title, "Hello");
        assert_eq!(hello.abstract_text, "Hi.");
        assert_eq!(hello.file, "post1/en.html");
        assert_eq!(hello.source_file, input.path().join("blog/post1/en.md"));
        let plain = &blog.articles[1];
        assert_eq!(plain.title, "post2");
        assert_eq!(plain.date, "");
        assert_eq!(plain.date_object, None);
    }

    #[test]
    fn language_variants_are_separate_articles() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[("blog/p/en.md", "---\ntitle: Hi\n---\n"), ("blog/p/de.md", "---\ntitle: Hallo\n---\n")],
        );
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);

        let langs: Vec<&str> = blog.articles.iter().map(|a| a.lang.as_str()).collect();
        assert_eq!(langs, vec!["de", "en"]);
        assert_eq!(blog.articles[0].file, "p/de.html");
    }

    #[test]
    fn malformed_date_keeps_article_as_undated() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[
                ("blog/a/en.md", "---\ndate: someday\n---\n"),
                ("blog/b/en.md", "---\ndate: 2020-05-05\n---\n"),
            ],
        );
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);

        assert_eq!(folders(&blog.articles), vec!["b", "a"]);
        assert_eq!(blog.articles[1].date, "someday");
        assert_eq!(blog.articles[1].date_object, None);
    }

    #[test]
    fn index_converted_at_blog_depth_and_source_removed() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[("style.css", "body{}"), ("blog/p/en.md", "---\ntitle: T\n---\n")],
        );
        let converter = MockConverter::new();
        build(&Settings::default(), input.path(), output.path(), &converter);

        let index = converter.find("blog/index.html");
        assert!(index.content.contains("- [EN - T](p/en.html)"));
        assert_eq!(index.options.stylesheets, vec!["../style.css"]);
        assert_eq!(
            converter.find("p/en.html").options.stylesheets,
            vec!["../../style.css"]
        );
        assert!(!output.path().join("blog/index.md").exists());
        assert!(output.path().join("blog/index.html").exists());
    }

    #[test]
    fn rss_written_when_enabled() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(input.path(), &[("blog/p/en.md", "x")]);
        let converter = MockConverter::new();

        build(&Settings::default(), input.path(), output.path(), &converter);
        assert!(output.path().join("blog/rss.xml").exists());

        let output2 = TempDir::new().unwrap();
        let settings = Settings {
            rss: false,
            ..Settings::default()
        };
        build(&settings, input.path(), output2.path(), &converter);
        assert!(!output2.path().join("blog/rss.xml").exists());
    }

    #[test]
    fn data_dir_replaces_previous_copy() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[("blog/p/en.md", "x"), ("blog/p/data/img/a.svg", "<svg/>")],
        );
        write_tree(output.path(), &[("blog/p/data/stale.txt", "old")]);
        let converter = MockConverter::new();
        build(&Settings::default(), input.path(), output.path(), &converter);

        assert!(output.path().join("blog/p/data/img/a.svg").exists());
        assert!(!output.path().join("blog/p/data/stale.txt").exists());
    }

    #[test]
    fn folder_without_markdown_yields_no_article() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[("blog/empty/notes.txt", "x"), ("blog/p/en.md", "y"), ("blog/loose.md", "z")],
        );
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);

        assert_eq!(folders(&blog.articles), vec!["p"]);
        // Loose files directly in the blog directory are not articles
        assert!(!output.path().join("blog/loose.html").exists());
        assert!(output.path().join("blog/empty/notes.txt").exists());
    }

    #[test]
    fn duplicate_md_copies_article_source() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(input.path(), &[("blog/p/en.md", "x")]);
        let settings = Settings {
            duplicate_md: true,
            ..Settings::default()
        };
        let converter = MockConverter::new();
        build(&settings, input.path(), output.path(), &converter);
        assert!(output.path().join("blog/p/en.md").exists());
        assert!(!output.path().join("blog/index.md").exists());
    }

    #[test]
    fn folders_named_like_generated_files_are_skipped() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(
            input.path(),
            &[
                ("blog/index.md/en.md", "a"),
                ("blog/index.html/en.md", "b"),
                ("blog/rss.xml/en.md", "c"),
                ("blog/p/en.md", "d"),
            ],
        );
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);

        assert_eq!(folders(&blog.articles), vec!["p"]);
        assert!(output.path().join("blog/index.html").is_file());
        assert!(output.path().join("blog/rss.xml").is_file());
        assert!(!output.path().join("blog/index.md").exists());
        assert!(converter.find("blog/index.html").content.contains("(p/en.html)"));
    }

    #[test]
    fn nested_blog_root_is_relative_to_crawl_root() {
        let (input, output) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_tree(input.path(), &[("site/blog/p/en.md", "x")]);
        let converter = MockConverter::new();
        let blog = build(&Settings::default(), input.path(), output.path(), &converter);
        assert_eq!(blog.root, "site/blog");
        assert_eq!(blog.article_path(&blog.articles[0]), "site/blog/p/en.html");
    }
}
