// src/infrastructure/parsers/twitter.rs
//! `bookmarks.js` from an X/Twitter data archive:
//! `window.YTD.bookmarks.part0 = [ { "bookmark": { "tweetId": ..., "fullText": ... } } ]`

use serde_json::Value;
use tracing::instrument;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::Tag;
use crate::infrastructure::parsers::{decode_text, ImportFormat, ImportParser};
use crate::util::text::sanitize_title;

pub const BOOKMARKS_PREFIX: &str = "window.YTD.bookmarks.part0";

const BOOKMARK_TAG: &str = "twitter-bookmark";
const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct TwitterParser;

impl ImportParser for TwitterParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Twitter
    }

    fn detect(&self, content: &[u8]) -> bool {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
        content
            .trim_ascii_start()
            .starts_with(BOOKMARKS_PREFIX.as_bytes())
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(text) => parse_twitter_bookmarks(text),
            Err(e) => ParseResult::failure(e.context("Failed to parse Twitter bookmarks")),
        }
    }
}

pub fn parse_twitter_bookmarks(content: &str) -> ParseResult {
    let entries = match bookmark_entries(content) {
        Ok(entries) => entries,
        Err(e) => return ParseResult::failure(e),
    };

    let mut collector = ResultCollector::new(ImportSource::Twitter);
    for (idx, entry) in entries.iter().enumerate() {
        collector.record(|| format!("Entry {idx}"), parse_entry(entry));
    }

    if collector.total() == 0 {
        collector.warn("No bookmarks found in Twitter archive.");
    }

    collector.finish()
}

/// Strip the JavaScript assignment and return the JSON array
fn bookmark_entries(content: &str) -> DomainResult<Vec<Value>> {
    let rest = content.trim_start().strip_prefix(BOOKMARKS_PREFIX).ok_or_else(|| {
        ImportError::InvalidFormat("Invalid Twitter bookmarks file format.".to_string())
    })?;
    let (_, json) = rest.split_once('=').ok_or_else(|| {
        ImportError::InvalidFormat("Invalid Twitter bookmarks file format.".to_string())
    })?;
    let json = json.trim();
    let json = json.strip_suffix(';').unwrap_or(json);

    match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(ImportError::InvalidFormat(
            "Expected an array of bookmark entries.".to_string(),
        )),
    }
}

fn parse_entry(entry: &Value) -> DomainResult<Option<ImportItem>> {
    let bookmark = &entry["bookmark"];
    let tweet_id = match &bookmark["tweetId"] {
        Value::String(id) if !id.trim().is_empty() => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return Err(ImportError::InvalidRecord("Missing tweetId".to_string())),
    };

    let full_text = bookmark["fullText"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let title = match full_text {
        Some(text) => tweet_title(text),
        None => format!("Tweet {tweet_id}"),
    };

    let mut item = ImportItem::link(
        title,
        format!("https://x.com/i/status/{tweet_id}"),
        ImportSource::Twitter,
    )
    .with_tags([Tag::new(BOOKMARK_TAG)?].into_iter().collect())
    .with_original_id(tweet_id);

    if let Some(text) = full_text {
        item = item.with_body(text);
    }

    Ok(Some(item))
}

/// Tweet text as a title, cut at 100 characters with an ellipsis
fn tweet_title(text: &str) -> String {
    let title = sanitize_title(text);
    if title.chars().count() > TITLE_MAX_CHARS {
        let cut: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = r#"window.YTD.bookmarks.part0 = [
  { "bookmark": { "tweetId": "1700000000000000001", "fullText": "Rust 2024 edition is out" } },
  { "bookmark": { "tweetId": 42 } },
  { "bookmark": { "fullText": "orphan" } }
];"#;

    #[test]
    fn given_archive_when_parse_then_links_to_status_pages() {
        let result = parse_twitter_bookmarks(ARCHIVE);
        assert!(result.success);
        assert_eq!(result.stats.total, 3);
        assert_eq!(result.stats.parsed, 2);

        let first = &result.items[0];
        assert_eq!(first.title, "Rust 2024 edition is out");
        assert_eq!(first.body.as_deref(), Some("Rust 2024 edition is out"));
        assert_eq!(
            first.url.as_deref(),
            Some("https://x.com/i/status/1700000000000000001")
        );
        assert_eq!(first.metadata.original_id.as_deref(), Some("1700000000000000001"));
        let tags: Vec<&str> = first.tags.iter().map(Tag::value).collect();
        assert_eq!(tags, vec!["twitter-bookmark"]);
    }

    #[test]
    fn given_numeric_id_without_text_when_parse_then_fallback_title() {
        let result = parse_twitter_bookmarks(ARCHIVE);
        let second = &result.items[1];
        assert_eq!(second.title, "Tweet 42");
        assert_eq!(second.body, None);
        assert_eq!(second.url.as_deref(), Some("https://x.com/i/status/42"));
    }

    #[test]
    fn given_entry_without_id_when_parse_then_labelled_error() {
        let result = parse_twitter_bookmarks(ARCHIVE);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].item.as_deref(), Some("Entry 2"));
        assert!(result.errors[0].message.contains("Missing tweetId"));
    }

    #[test]
    fn given_long_text_when_parse_then_title_truncated_with_ellipsis() {
        let text = "a".repeat(150);
        let content = format!(
            r#"window.YTD.bookmarks.part0 = [{{"bookmark":{{"tweetId":"1","fullText":"{text}"}}}}]"#
        );
        let result = parse_twitter_bookmarks(&content);
        let title = &result.items[0].title;
        assert_eq!(title.chars().count(), 101);
        assert!(title.ends_with('…'));
        assert_eq!(result.items[0].body.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn given_bad_payloads_when_parse_then_structural_failure() {
        assert!(!parse_twitter_bookmarks("var x = []").success);
        assert!(!parse_twitter_bookmarks("window.YTD.bookmarks.part0 []").success);
        assert!(!parse_twitter_bookmarks("window.YTD.bookmarks.part0 = [{").success);
        assert!(!parse_twitter_bookmarks("window.YTD.bookmarks.part0 = {}").success);
    }

    #[test]
    fn given_empty_array_when_parse_then_warning() {
        let result = parse_twitter_bookmarks("window.YTD.bookmarks.part0 = []");
        assert!(result.success);
        assert_eq!(result.stats.total, 0);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn given_leading_whitespace_when_detect_then_prefix_found() {
        assert!(TwitterParser.detect(b"\n  window.YTD.bookmarks.part0 = []"));
        assert!(!TwitterParser.detect(b"window.YTD.tweets.part0 = []"));
    }
}
