// src/infrastructure/parsers/evernote.rs
//! Evernote ENEX export.
//!
//! ENML bodies are informal HTML inside CDATA, so notes and their fields are located
//! with bounded non-greedy pattern matching rather than a validating XML parser.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::instrument;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource, UNTITLED};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::normalize_tags;
use crate::infrastructure::parsers::{decode_text, sniff, ImportFormat, ImportParser};
use crate::util::date::parse_date;
use crate::util::text::{decode_html_entities, sanitize_title, strip_html};

const FIELDS: [&str; 5] = ["title", "content", "created", "updated", "source-url"];

static EXPORT_ROOT: OnceLock<Regex> = OnceLock::new();
static NOTE_OPEN: OnceLock<Regex> = OnceLock::new();
static NOTE_CLOSE: OnceLock<Regex> = OnceLock::new();
static FIELD: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
static CONTENT_BLOCK: OnceLock<Regex> = OnceLock::new();
static TAG: OnceLock<Regex> = OnceLock::new();
static NOTEBOOK: OnceLock<Regex> = OnceLock::new();
static CDATA: OnceLock<Regex> = OnceLock::new();
static EN_NOTE: OnceLock<Regex> = OnceLock::new();
static TODO_CHECKED: OnceLock<Regex> = OnceLock::new();
static TODO: OnceLock<Regex> = OnceLock::new();
static MEDIA: OnceLock<Regex> = OnceLock::new();
static CRYPT: OnceLock<Regex> = OnceLock::new();

fn export_root_regex() -> &'static Regex {
    EXPORT_ROOT.get_or_init(|| Regex::new(r"(?i)<en-export\b").expect("compile export root regex"))
}

fn note_open_regex() -> &'static Regex {
    NOTE_OPEN.get_or_init(|| Regex::new(r"(?i)<note(\s[^>]*)?>").expect("compile note open regex"))
}

fn note_close_regex() -> &'static Regex {
    NOTE_CLOSE.get_or_init(|| Regex::new(r"(?i)</note\s*>").expect("compile note close regex"))
}

fn content_block_regex() -> &'static Regex {
    CONTENT_BLOCK.get_or_init(|| {
        Regex::new(r"(?is)<content\b[^>]*>.*?</content\s*>").expect("compile content block regex")
    })
}

fn tag_regex() -> &'static Regex {
    TAG.get_or_init(|| Regex::new(r"(?is)<tag>(.*?)</tag>").expect("compile tag regex"))
}

fn notebook_regex() -> &'static Regex {
    NOTEBOOK.get_or_init(|| {
        Regex::new(r#"(?i)\bnotebook\s*=\s*["']([^"']*)["']"#).expect("compile notebook regex")
    })
}

fn cdata_regex() -> &'static Regex {
    CDATA.get_or_init(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("compile cdata regex"))
}

fn en_note_regex() -> &'static Regex {
    EN_NOTE.get_or_init(|| Regex::new(r"(?i)</?en-note\b[^>]*>").expect("compile en-note regex"))
}

fn todo_checked_regex() -> &'static Regex {
    TODO_CHECKED.get_or_init(|| {
        Regex::new(r#"(?i)<en-todo\b[^>]*checked\s*=\s*["']true["'][^>]*>"#)
            .expect("compile checked todo regex")
    })
}

fn todo_regex() -> &'static Regex {
    TODO.get_or_init(|| Regex::new(r"(?i)<en-todo\b[^>]*>").expect("compile todo regex"))
}

fn media_regex() -> &'static Regex {
    MEDIA.get_or_init(|| Regex::new(r"(?i)<en-media\b[^>]*>").expect("compile media regex"))
}

fn crypt_regex() -> &'static Regex {
    CRYPT.get_or_init(|| {
        Regex::new(r"(?is)<en-crypt\b[^>]*>.*?</en-crypt\s*>").expect("compile crypt regex")
    })
}

/// Trimmed text of the first `<name>` element in `xml`
fn field<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let patterns = FIELD.get_or_init(|| {
        FIELDS
            .iter()
            .map(|name| {
                let pattern = format!(r"(?is)<{name}\b[^>]*>(.*?)</{name}\s*>");
                (*name, Regex::new(&pattern).expect("compile enex field regex"))
            })
            .collect()
    });
    let (_, regex) = patterns.iter().find(|(n, _)| *n == name)?;
    regex
        .captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvernoteParser;

impl ImportParser for EvernoteParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Evernote
    }

    fn detect(&self, content: &[u8]) -> bool {
        let lower = sniff(content);
        lower.contains("<en-export") || (lower.contains("<note") && lower.contains("<content>"))
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        match decode_text(content) {
            Ok(xml) => parse_evernote(xml),
            Err(e) => ParseResult::failure(e.context("Failed to parse Evernote export")),
        }
    }
}

pub fn parse_evernote(xml: &str) -> ParseResult {
    if !export_root_regex().is_match(xml) && !note_open_regex().is_match(xml) {
        return ParseResult::failure(ImportError::InvalidFormat(
            "Invalid ENEX format. File does not contain Evernote export data.".to_string(),
        ));
    }

    let mut collector = ResultCollector::new(ImportSource::Evernote);
    let mut cursor = 0;
    let mut index = 0;

    while let Some(open) = note_open_regex().captures_at(xml, cursor) {
        index += 1;
        let Some(whole) = open.get(0) else { break };

        let Some(close) = note_close_regex().find_at(xml, whole.end()) else {
            let partial = &xml[whole.end()..];
            collector.record(
                || note_label(partial, index),
                Err(ImportError::InvalidRecord("unterminated <note> element".to_string())),
            );
            break;
        };

        let inner = &xml[whole.end()..close.start()];
        collector.record(|| note_label(inner, index), parse_note(&open, inner));
        cursor = close.end();
    }

    if collector.total() == 0 {
        collector.warn("No notes found in ENEX file. Make sure this is a valid Evernote export.");
    }

    collector.finish()
}

fn note_label(note_xml: &str, index: usize) -> String {
    let without_content = content_block_regex().replace(note_xml, "");
    field(&without_content, "title")
        .map(decode_html_entities)
        .unwrap_or_else(|| format!("Note {index}"))
}

fn parse_note(open: &Captures, note_xml: &str) -> DomainResult<Option<ImportItem>> {
    let body = match field(note_xml, "content") {
        Some(content) => enml_to_text(&unwrap_content(content)?),
        None => String::new(),
    };

    // fields below must not be picked up from inside the note body
    let meta = content_block_regex().replace(note_xml, "");

    let title = sanitize_title(&field(&meta, "title").map(decode_html_entities).unwrap_or_default());
    if title == UNTITLED && body.is_empty() {
        return Ok(None);
    }

    let tags = normalize_tags(
        tag_regex()
            .captures_iter(&meta)
            .filter_map(|c| c.get(1))
            .map(|m| decode_html_entities(m.as_str().trim())),
    );
    let created_at = field(&meta, "created")
        .and_then(|d| parse_date(d))
        .or_else(|| field(&meta, "updated").and_then(|d| parse_date(d)));

    let mut item = ImportItem::note(title, body, ImportSource::Evernote)
        .with_tags(tags)
        .with_created_at(created_at);

    if let Some(source_url) = field(&meta, "source-url") {
        item = item.with_meta("sourceUrl", decode_html_entities(source_url));
    }
    if let Some(notebook) = open
        .get(1)
        .and_then(|attrs| notebook_regex().captures(attrs.as_str()))
        .and_then(|c| c.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()))
        .filter(|n| !n.is_empty())
    {
        item = item.with_meta("notebook", notebook);
    }

    Ok(Some(item))
}

/// ENML from a `<content>` element: CDATA payload, or entity-escaped markup
fn unwrap_content(content: &str) -> DomainResult<String> {
    if let Some(captures) = cdata_regex().captures(content) {
        return Ok(captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default());
    }
    if content.contains("<![CDATA[") {
        return Err(ImportError::InvalidRecord(
            "unterminated CDATA section in note content".to_string(),
        ));
    }
    Ok(decode_html_entities(content))
}

/// Plain text from ENML: checkboxes become `[x] `/`[ ] `, attachments and encrypted
/// blocks become placeholders, everything else goes through [`strip_html`].
pub fn enml_to_text(enml: &str) -> String {
    if enml.trim().is_empty() {
        return String::new();
    }

    let text = en_note_regex().replace_all(enml, "");
    let text = todo_checked_regex().replace_all(&text, "[x] ");
    let text = todo_regex().replace_all(&text, "[ ] ");
    let text = media_regex().replace_all(&text, "[attachment]");
    let text = crypt_regex().replace_all(&text, "[encrypted content]");

    strip_html(&text)
}
