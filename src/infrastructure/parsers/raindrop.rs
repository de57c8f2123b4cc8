// src/infrastructure/parsers/raindrop.rs
//! Raindrop.io CSV export.

use tracing::instrument;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::{folder_path_to_tags, Tag};
use crate::infrastructure::parsers::{decode_text, first_line, sniff, ImportFormat, ImportParser};
use crate::util::csv::{csv_records, CsvHeader, CsvRecord};
use crate::util::date::parse_date;
use crate::util::text::sanitize_title;
use crate::util::url::normalize_url;

const HIGHLIGHTS_PREFIX: &str = "**Highlights:** ";

#[derive(Debug, Clone, Copy, Default)]
pub struct RaindropParser;

impl ImportParser for RaindropParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Raindrop
    }

    fn detect(&self, content: &[u8]) -> bool {
        is_raindrop_header(first_line(&sniff(content)))
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(csv) => parse_raindrop(csv),
            Err(e) => ParseResult::failure(e.context("Failed to parse Raindrop.io CSV")),
        }
    }
}

/// Raindrop headers carry a folder, a url and either an excerpt or highlights column
pub fn is_raindrop_header(header_line: &str) -> bool {
    let lower = header_line.to_lowercase();
    lower.contains("folder")
        && lower.contains("url")
        && (lower.contains("excerpt") || lower.contains("highlights"))
}

#[derive(Debug)]
struct RaindropColumns {
    id: Option<usize>,
    title: Option<usize>,
    note: Option<usize>,
    excerpt: Option<usize>,
    url: usize,
    folder: Option<usize>,
    tags: Option<usize>,
    created: Option<usize>,
    highlights: Option<usize>,
    favorite: Option<usize>,
}

impl RaindropColumns {
    fn resolve(header: &CsvHeader) -> DomainResult<Self> {
        let url = header
            .position(&["url"])
            .ok_or_else(|| ImportError::MissingColumn("CSV must have a URL column".to_string()))?;
        Ok(Self {
            id: header.position(&["id"]),
            title: header.position(&["title"]),
            note: header.position(&["note"]),
            excerpt: header.position(&["excerpt"]),
            url,
            folder: header.position(&["folder"]),
            tags: header.position(&["tags"]),
            created: header.position(&["created"]),
            highlights: header.position(&["highlights"]),
            favorite: header.position(&["favorite"]),
        })
    }
}

pub fn parse_raindrop(csv: &str) -> ParseResult {
    let mut records = csv_records(csv).into_iter();

    let header = match records.next() {
        Some(record) if is_raindrop_header(&record.values.join(",")) => {
            CsvHeader::from_record(&record)
        }
        _ => {
            return ParseResult::failure(ImportError::InvalidFormat(
                "Invalid CSV format. This does not appear to be a Raindrop.io export.".to_string(),
            ))
        }
    };

    let columns = match RaindropColumns::resolve(&header) {
        Ok(columns) => columns,
        Err(e) => return ParseResult::failure(e),
    };

    let mut collector = ResultCollector::new(ImportSource::Raindrop);
    for record in records {
        collector.record(|| row_label(&record, &columns), parse_row(&record, &columns));
    }

    if collector.total() == 0 {
        collector.warn("No items found in Raindrop.io export.");
    }

    collector.finish()
}

fn row_label(record: &CsvRecord, columns: &RaindropColumns) -> String {
    record
        .get(columns.title)
        .filter(|t| !t.is_empty())
        .or_else(|| record.get(Some(columns.url)).filter(|u| !u.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Row {}", record.line))
}

fn parse_row(record: &CsvRecord, columns: &RaindropColumns) -> DomainResult<Option<ImportItem>> {
    let field = |idx: Option<usize>| record.get(idx).filter(|v| !v.is_empty());

    let raw_url = record.get(Some(columns.url)).unwrap_or("");
    let url = normalize_url(raw_url).ok_or_else(|| {
        ImportError::InvalidUrl(if raw_url.is_empty() { "empty" } else { raw_url }.to_string())
    })?;

    let mut body_parts: Vec<String> = Vec::new();
    if let Some(note) = field(columns.note) {
        body_parts.push(note.to_string());
    }
    if let Some(excerpt) = field(columns.excerpt) {
        body_parts.push(excerpt.to_string());
    }
    if let Some(highlights) = field(columns.highlights) {
        body_parts.push(format!("{HIGHLIGHTS_PREFIX}{highlights}"));
    }

    let folder = field(columns.folder);
    let mut tags = field(columns.tags)
        .map(|t| Tag::parse_tags(t, &[',']))
        .unwrap_or_default();
    if let Some(folder) = folder {
        tags.extend(folder_path_to_tags(folder));
    }

    let title = sanitize_title(field(columns.title).unwrap_or(&url));
    let created_at = field(columns.created).and_then(|c| parse_date(c));

    let mut item = ImportItem::link(title, url, ImportSource::Raindrop)
        .with_body(body_parts.join("\n\n"))
        .with_tags(tags)
        .with_created_at(created_at);

    if let Some(folder) = folder {
        item = item.with_folder_path(folder);
    }
    if let Some(id) = field(columns.id) {
        item = item.with_original_id(id);
    }
    if let Some(favorite) = field(columns.favorite) {
        item = item.with_meta("favorite", favorite.to_lowercase());
    }

    Ok(Some(item))
}
