// src/infrastructure/parsers/bookmarks.rs
//! Netscape bookmark file format, as exported by Chrome, Firefox, Safari and Edge.

use select::document::Document;
use select::node::Node;
use select::predicate::Name;
use tracing::instrument;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::{folder_path_to_tags, Tag};
use crate::infrastructure::parsers::{decode_text, sniff, ImportFormat, ImportParser};
use crate::util::date::parse_date;
use crate::util::text::{decode_html_entities, sanitize_title, strip_html};
use crate::util::url::normalize_url;

/// Schemes that never lead anywhere worth importing
const NON_NAVIGABLE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:", "place:"];

#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarksParser;

impl ImportParser for BookmarksParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Bookmarks
    }

    fn detect(&self, content: &[u8]) -> bool {
        is_bookmarks_file(&sniff(content))
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(html) => parse_bookmarks(html),
            Err(e) => ParseResult::failure(e.context("Failed to parse bookmarks file")),
        }
    }
}

/// Signature check on lower-cased content
pub fn is_bookmarks_file(lower: &str) -> bool {
    lower.contains("<!doctype netscape-bookmark-file")
        || lower.contains("netscape-bookmark-file-1")
        || (lower.contains("<dl") && lower.contains("<dt") && lower.contains("href="))
}

pub fn parse_bookmarks(html: &str) -> ParseResult {
    let document = Document::from(html);
    let mut collector = ResultCollector::new(ImportSource::Bookmarks);

    for anchor in document.find(Name("a")) {
        collector.record(|| label(&anchor), parse_anchor(&anchor));
    }

    if collector.total() == 0 {
        collector.warn(
            "No bookmarks found in file. Make sure this is a valid bookmarks HTML export.",
        );
    }

    collector.finish()
}

fn label(anchor: &Node) -> String {
    let text = anchor.text();
    let text = text.trim();
    if text.is_empty() {
        "Unknown".to_string()
    } else {
        text.to_string()
    }
}

fn parse_anchor(anchor: &Node) -> DomainResult<Option<ImportItem>> {
    let href = match anchor.attr("href").map(str::trim) {
        Some(href) if !href.is_empty() && !is_non_navigable(href) => href,
        _ => return Ok(None),
    };

    let url = normalize_url(href).ok_or_else(|| ImportError::InvalidUrl(href.to_string()))?;

    let folder_path = folder_path(anchor);
    let mut tags = folder_path_to_tags(&folder_path);
    if let Some(extra) = anchor.attr("tags") {
        tags.extend(Tag::parse_tags(extra, &[',']));
    }

    let title = sanitize_title(&decode_html_entities(&anchor.text()));
    let created_at = anchor.attr("add_date").and_then(|d| parse_date(d));

    let mut item = ImportItem::link(title, url, ImportSource::Bookmarks)
        .with_tags(tags)
        .with_created_at(created_at)
        .with_folder_path(folder_path);

    if let Some(description) = description(anchor) {
        item = item.with_body(description);
    }
    if let Some(icon) = anchor.attr("icon").filter(|i| !i.is_empty()) {
        item = item.with_meta("icon", icon);
    }
    if let Some(modified) = anchor.attr("last_modified").and_then(|d| parse_date(d)) {
        item = item.with_meta("lastModified", modified.to_rfc3339());
    }

    Ok(Some(item))
}

fn is_non_navigable(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    NON_NAVIGABLE_SCHEMES.iter().any(|s| lower.starts_with(s))
}

/// Reconstruct the folder hierarchy of a bookmark.
///
/// Folder headings (`<H3>`) are siblings of the lists they label, not parents, so
/// each level scans the preceding siblings of the current element for headings and
/// then ascends to the enclosing list container.
fn folder_path(anchor: &Node) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = anchor.parent();

    while let Some(element) = current {
        let mut sibling = element.prev();
        while let Some(node) = sibling {
            if node.name() == Some("h3") {
                let name = decode_html_entities(node.text().trim());
                if !name.is_empty() {
                    parts.push(name);
                }
            }
            sibling = node.prev();
        }
        current = element
            .parent()
            .filter(|p| matches!(p.name(), Some("dl") | Some("dt")));
    }

    parts.reverse();
    parts.join("/")
}

/// Text of a `<DD>` directly following the bookmark's `<DT>`
fn description(anchor: &Node) -> Option<String> {
    let dt = anchor.parent().filter(|p| p.name() == Some("dt"))?;
    let mut sibling = dt.next();
    while let Some(node) = sibling {
        match node.name() {
            Some("dd") => {
                let text = strip_html(&node.inner_html());
                return if text.is_empty() { None } else { Some(text) };
            }
            Some(_) => return None,
            None => sibling = node.next(),
        }
    }
    None
}
