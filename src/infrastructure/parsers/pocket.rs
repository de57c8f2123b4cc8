// src/infrastructure/parsers/pocket.rs
//! Pocket exports: the classic `ril_export.html` and the newer CSV export.

use std::collections::HashMap;

use select::document::Document;
use select::node::Node;
use select::predicate::{Name, Or};
use tracing::instrument;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::Tag;
use crate::infrastructure::parsers::raindrop::is_raindrop_header;
use crate::infrastructure::parsers::{decode_text, first_line, sniff, ImportFormat, ImportParser};
use crate::util::csv::{csv_records, CsvHeader, CsvRecord};
use crate::util::date::parse_date;
use crate::util::text::{decode_html_entities, sanitize_title};
use crate::util::url::normalize_url;

const URL_COLUMNS: &[&str] = &["url", "link"];
const TITLE_COLUMNS: &[&str] = &["title", "name"];
const TAG_COLUMNS: &[&str] = &["tags", "tag"];
const DATE_COLUMNS: &[&str] = &["date", "time_added", "added"];
const STATUS_COLUMNS: &[&str] = &["status"];
const DETECT_COLUMNS: &[&[&str]] = &[TITLE_COLUMNS, TAG_COLUMNS, &["time_added"]];
const UNKNOWN_SECTION: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct PocketHtmlParser;

#[derive(Debug, Clone, Copy, Default)]
pub struct PocketCsvParser;

impl ImportParser for PocketHtmlParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::PocketHtml
    }

    fn detect(&self, content: &[u8]) -> bool {
        is_pocket_file(&sniff(content))
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(html) => parse_pocket(html),
            Err(e) => ParseResult::failure(e.context("Failed to parse Pocket export")),
        }
    }
}

impl ImportParser for PocketCsvParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::PocketCsv
    }

    fn detect(&self, content: &[u8]) -> bool {
        let sniffed = sniff(content);
        let header = CsvHeader::parse(first_line(&sniffed));
        header.position(URL_COLUMNS).is_some()
            && DETECT_COLUMNS
                .iter()
                .any(|names| header.position(names).is_some())
            && !is_raindrop_header(first_line(&sniffed))
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(csv) => parse_pocket_csv(csv),
            Err(e) => ParseResult::failure(e.context("Failed to parse CSV")),
        }
    }
}

/// Signature check on lower-cased content
pub fn is_pocket_file(lower: &str) -> bool {
    lower.contains("pocket")
        || lower.contains("getpocket.com")
        || lower.contains("<h1>unread</h1>")
        || lower.contains("<h1>read</h1>")
}

pub fn parse_pocket(html: &str) -> ParseResult {
    let document = Document::from(html);
    let sections = link_sections(&document);
    let mut collector = ResultCollector::new(ImportSource::Pocket);

    for anchor in document.find(Name("a")) {
        let section = sections.get(&anchor.index()).copied().unwrap_or(UNKNOWN_SECTION);
        collector.record(|| anchor_label(&anchor), parse_anchor(&anchor, section));
    }

    if collector.total() == 0 {
        if is_pocket_file(&html.to_lowercase()) {
            collector.warn("No items found in Pocket export.");
        } else {
            collector.warn(
                "This does not appear to be a Pocket export file. Please export from Pocket settings.",
            );
        }
    }

    collector.finish()
}

fn anchor_label(anchor: &Node) -> String {
    let text = anchor.text();
    match text.trim() {
        "" => "Unknown".to_string(),
        t => t.to_string(),
    }
}

fn parse_anchor(anchor: &Node, section: &'static str) -> DomainResult<Option<ImportItem>> {
    let href = match anchor.attr("href").map(str::trim) {
        Some(href) if !href.is_empty() => href,
        _ => return Ok(None),
    };

    let url = normalize_url(href).ok_or_else(|| ImportError::InvalidUrl(href.to_string()))?;
    let tags = anchor
        .attr("tags")
        .map(|t| Tag::parse_tags(t, &[',']))
        .unwrap_or_default();
    let created_at = anchor.attr("time_added").and_then(|t| parse_date(t));

    let item = ImportItem::link(
        sanitize_title(&decode_html_entities(&anchor.text())),
        url,
        ImportSource::Pocket,
    )
    .with_tags(tags)
    .with_created_at(created_at)
    .with_meta("section", section);

    Ok(Some(item))
}

/// Section of every link keyed by node index.
///
/// Nodes are visited once in document order; the last "Unread" or "Read" heading seen
/// decides, links before any such heading are unknown.
fn link_sections(document: &Document) -> HashMap<usize, &'static str> {
    let mut sections = HashMap::new();
    let mut current = UNKNOWN_SECTION;

    for node in document.find(Or(Name("a"), Or(Name("h1"), Name("h2")))) {
        if node.name() == Some("a") {
            sections.insert(node.index(), current);
        } else if let Some(section) = classify_heading(&node.text()) {
            current = section;
        }
    }

    sections
}

fn classify_heading(text: &str) -> Option<&'static str> {
    let text = text.trim().to_lowercase();
    if text.starts_with("unread") {
        Some("unread")
    } else if text.starts_with("read") {
        Some("read")
    } else {
        None
    }
}

pub fn parse_pocket_csv(csv: &str) -> ParseResult {
    let mut records = csv_records(csv).into_iter();

    let header = match records.next() {
        Some(record) => CsvHeader::from_record(&record),
        None => {
            return ParseResult::failure(ImportError::InvalidFormat(
                "Invalid CSV format. Expected columns: url, title, tags".to_string(),
            ))
        }
    };

    let Some(url_idx) = header.position(URL_COLUMNS) else {
        return ParseResult::failure(ImportError::MissingColumn(
            "CSV must have a URL column".to_string(),
        ));
    };
    let columns = PocketColumns {
        url: url_idx,
        title: header.position(TITLE_COLUMNS),
        tags: header.position(TAG_COLUMNS),
        date: header.position(DATE_COLUMNS),
        status: header.position(STATUS_COLUMNS),
    };

    let mut collector = ResultCollector::new(ImportSource::Pocket);
    for record in records {
        collector.record(|| row_label(&record, &columns), parse_row(&record, &columns));
    }

    if collector.total() == 0 {
        collector.warn("No items found in Pocket CSV export.");
    }

    collector.finish()
}

#[derive(Debug)]
struct PocketColumns {
    url: usize,
    title: Option<usize>,
    tags: Option<usize>,
    date: Option<usize>,
    status: Option<usize>,
}

fn row_label(record: &CsvRecord, columns: &PocketColumns) -> String {
    record
        .get(columns.title)
        .filter(|t| !t.is_empty())
        .or_else(|| record.get(Some(columns.url)).filter(|u| !u.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Row {}", record.line))
}

fn parse_row(record: &CsvRecord, columns: &PocketColumns) -> DomainResult<Option<ImportItem>> {
    let raw_url = record.get(Some(columns.url)).unwrap_or("");
    let url = normalize_url(raw_url).ok_or_else(|| {
        ImportError::InvalidUrl(if raw_url.is_empty() { "empty" } else { raw_url }.to_string())
    })?;

    let title = match record.get(columns.title).filter(|t| !t.is_empty()) {
        Some(title) => sanitize_title(title),
        None => sanitize_title(&url),
    };
    let tags = record
        .get(columns.tags)
        .map(|t| Tag::parse_tags(t, &[',', '|', ';']))
        .unwrap_or_default();
    let created_at = record.get(columns.date).and_then(|d| parse_date(d));

    let mut item = ImportItem::link(title, url, ImportSource::Pocket)
        .with_tags(tags)
        .with_created_at(created_at);

    if let Some(status) = record.get(columns.status).filter(|s| !s.is_empty()) {
        let section = match status.to_lowercase().as_str() {
            "archive" | "archived" | "read" => "read",
            "unread" => "unread",
            _ => UNKNOWN_SECTION,
        };
        item = item.with_meta("section", section);
    }

    Ok(Some(item))
}
