//! In-process conversion with [pulldown-cmark](https://docs.rs/pulldown-cmark)
//! and [maud](https://maud.lambda.xyz/).
//!
//! Produces a standalone HTML5 document close to what pandoc emits for the
//! same options: the front-matter `title` becomes `<title>`, header and footer
//! files are inlined around the body, stylesheets become `<link>` tags.
//! Passthrough flags are pandoc-specific and ignored.

use super::{ConversionOptions, ConvertError, Converter};
use crate::frontmatter;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for NativeConverter {
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<(), ConvertError> {
        let content = fs::read_to_string(source)?;
        let (block, body) = frontmatter::split(&content);

        let fallback = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let title = block
            .and_then(|b| frontmatter::parse(b).ok())
            .and_then(|fm| fm.title)
            .or_else(|| first_heading(body))
            .unwrap_or(fallback);

        let header = read_optional(options.header.as_deref())?;
        let footer = read_optional(options.footer.as_deref())?;

        if !options.passthrough.is_empty() {
            log::debug!("native converter ignores {:?}", options.passthrough);
        }

        let doc = render_document(&title, &options.stylesheets, &header, &render_markdown(body), &footer);
        fs::write(destination, doc.into_string())?;
        Ok(())
    }
}

fn read_optional(path: Option<&Path>) -> Result<String, ConvertError> {
    match path {
        Some(p) => Ok(fs::read_to_string(p)?),
        None => Ok(String::new()),
    }
}

fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find(|line| line.starts_with("# "))
        .map(|line| line.trim_start_matches("# ").trim().to_string())
}

fn render_markdown(markdown: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, opts);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn render_document(
    title: &str,
    stylesheets: &[String],
    header: &str,
    body_html: &str,
    footer: &str,
) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @for css in stylesheets {
                    link rel="stylesheet" href=(css);
                }
            }
            body {
                (PreEscaped(header))
                (PreEscaped(body_html))
                (PreEscaped(footer))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn convert(source: &str, options: &ConversionOptions) -> String {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("page.md");
        let dst = tmp.path().join("page.html");
        fs::write(&src, source).unwrap();
        NativeConverter::new().convert(&src, &dst, options).unwrap();
        fs::read_to_string(dst).unwrap()
    }

    #[test]
    fn renders_markdown_body() {
        let html = convert("This is **bold**.", &ConversionOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn title_from_front_matter_and_block_removed() {
        let html = convert("---\ntitle: Hello\n---\nBody", &ConversionOptions::default());
        assert!(html.contains("<title>Hello</title>"));
        assert!(!html.contains("title: Hello"));
    }

    #[test]
    fn title_falls_back_to_heading_then_stem() {
        let html = convert("# Heading\n\ntext", &ConversionOptions::default());
        assert!(html.contains("<title>Heading</title>"));
        let html = convert("text", &ConversionOptions::default());
        assert!(html.contains("<title>page</title>"));
    }

    #[test]
    fn stylesheets_and_header_footer() {
        let tmp = TempDir::new().unwrap();
        let header = tmp.path().join("header.html");
        let footer = tmp.path().join("footer.html");
        fs::write(&header, "<nav>top</nav>").unwrap();
        fs::write(&footer, "<footer>bottom</footer>").unwrap();

        let html = convert(
            "body",
            &ConversionOptions {
                header: Some(header),
                footer: Some(footer),
                stylesheets: vec!["../style.css".into()],
                passthrough: vec![],
            },
        );
        assert!(html.contains(r#"<link rel="stylesheet" href="../style.css">"#));
        let nav = html.find("<nav>top</nav>").unwrap();
        let body = html.find("<p>body</p>").unwrap();
        let foot = html.find("<footer>bottom</footer>").unwrap();
        assert!(nav < body && body < foot);
    }

    #[test]
    fn title_is_escaped() {
        let html = convert("---\ntitle: \"<b>x</b>\"\n---\n", &ConversionOptions::default());
        assert!(html.contains("<title>&lt;b&gt;x&lt;/b&gt;</title>"));
    }
}
