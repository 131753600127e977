//! Front-matter blocks at the top of markdown sources.
//!
//! A block opens with a line starting with `---` on the very first line and
//! closes at the next line starting with `---` or `...`:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2020-01-01
//! abstract: First post.
//! ...
//! Body text.
//! ```
//!
//! The block is YAML. Only `title`, `abstract` and `date` are applied to an
//! article; other keys are left for the converter and ignored here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front-matter is not a key-value mapping")]
    NotAMapping,
    #[error("unrecognized date {0:?}")]
    InvalidDate(String),
}

/// Fields of a front-matter block that overlay article defaults.
///
/// `None` leaves the default untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub date: Option<String>,
}

/// Split `content` into its front-matter block (without markers) and body.
///
/// Returns `None` for the block when the file does not open with `---` or the
/// block is never closed.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, content);
    };
    if !first.starts_with("---") {
        return (None, content);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.starts_with("---") || line.starts_with("...") {
            let block = &content[start..offset];
            let body = &content[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse a front-matter block into the fields articles care about.
///
/// An empty block yields all-`None`.
pub fn parse(block: &str) -> Result<FrontMatter, FrontMatterError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    let value: Value = serde_yaml::from_str(block)?;
    let mapping = match value {
        Value::Null => return Ok(FrontMatter::default()),
        Value::Mapping(m) => m,
        _ => return Err(FrontMatterError::NotAMapping),
    };

    let mut fm = FrontMatter::default();
    for (key, val) in mapping {
        let Some(key) = key.as_str() else { continue };
        match key {
            "title" => fm.title = scalar_string(&val),
            "abstract" => fm.abstract_text = scalar_string(&val),
            "date" => fm.date = scalar_string(&val),
            other => log::debug!("ignoring front-matter key {other:?}"),
        }
    }
    Ok(fm)
}

/// Extract and parse the front-matter of a whole source file.
///
/// Files without a block give an all-`None` result.
pub fn read(content: &str) -> Result<FrontMatter, FrontMatterError> {
    match split(content) {
        (Some(block), _) => parse(block),
        (None, _) => Ok(FrontMatter::default()),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a front-matter date into a naive timestamp.
///
/// Zoned forms (RFC 3339, RFC 2822) are converted to their UTC wall time.
pub fn parse_date(raw: &str) -> Result<NaiveDateTime, FrontMatterError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default());
        }
    }
    Err(FrontMatterError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn split_with_dash_terminator() {
        let (block, body) = split("---\ntitle: Hi\n---\nBody\n");
        assert_eq!(block, Some("title: Hi\n"));
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn split_with_dot_terminator() {
        let (block, body) = split("---\ndate: 2020-01-01\n...\n# Heading\n");
        assert_eq!(block, Some("date: 2020-01-01\n"));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn split_without_block() {
        let content = "# Title\n---\nnot front-matter\n";
        assert_eq!(split(content), (None, content));
    }

    #[test]
    fn split_unclosed_block_is_body() {
        let content = "---\ntitle: never closed\n";
        assert_eq!(split(content), (None, content));
    }

    #[test]
    fn parse_known_fields() {
        let fm = parse("title: Hello\nabstract: A post.\ndate: 2020-01-01\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.abstract_text.as_deref(), Some("A post."));
        assert_eq!(fm.date.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let fm = parse("title: Hello\nauthor: Someone\ntags: [a, b]\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.date, None);
    }

    #[test]
    fn parse_empty_block_is_default() {
        assert_eq!(parse("\n").unwrap(), FrontMatter::default());
    }

    #[test]
    fn parse_non_mapping_is_error() {
        assert!(matches!(
            parse("- just\n- a list\n"),
            Err(FrontMatterError::NotAMapping)
        ));
    }

    #[test]
    fn parse_numeric_title_becomes_string() {
        let fm = parse("title: 1984\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
    }

    #[test]
    fn read_whole_file() {
        let fm = read("---\ntitle: T\n---\nbody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("T"));
        assert_eq!(read("no block").unwrap(), FrontMatter::default());
    }

    #[test]
    fn parse_date_plain() {
        let d = parse_date("2020-01-01").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2020, 1, 1));
    }

    #[test]
    fn parse_date_with_time() {
        let d = parse_date("2021-03-04 10:30").unwrap();
        assert_eq!((d.hour(), d.minute()), (10, 30));
    }

    #[test]
    fn parse_date_rfc3339_converted_to_utc() {
        let d = parse_date("2021-03-04T10:00:00+02:00").unwrap();
        assert_eq!(d.hour(), 8);
    }

    #[test]
    fn parse_date_day_first() {
        let d = parse_date("31/12/2019").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2019, 12, 31));
    }

    #[test]
    fn parse_date_garbage_is_error() {
        assert!(matches!(
            parse_date("last tuesday"),
            Err(FrontMatterError::InvalidDate(_))
        ));
    }
}
