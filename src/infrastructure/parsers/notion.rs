// src/infrastructure/parsers/notion.rs
//! Notion workspace export: a ZIP archive of HTML or Markdown pages, one folder level
//! per parent page.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::Regex;
use select::document::Document;
use select::predicate::{And, Class, Name};
use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource, UNTITLED};
use crate::domain::parse_result::{ParseResult, ResultCollector};
use crate::domain::tag::{folder_path_to_tags, normalize_tags, Tag};
use crate::infrastructure::parsers::{ImportFormat, ImportParser};
use crate::util::text::{sanitize_title, strip_html};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const INLINE_TAG_MIN: usize = 2;
const INLINE_TAG_MAX: usize = 30;

static HEX_SUFFIX: OnceLock<Regex> = OnceLock::new();
static PAREN_SUFFIX: OnceLock<Regex> = OnceLock::new();
static UUID_SUFFIX: OnceLock<Regex> = OnceLock::new();
static INLINE_TAG: OnceLock<Regex> = OnceLock::new();

fn hex_suffix_regex() -> &'static Regex {
    HEX_SUFFIX.get_or_init(|| Regex::new(r"(?i)\s+[0-9a-f]{32}$").expect("compile hex suffix regex"))
}

fn paren_suffix_regex() -> &'static Regex {
    PAREN_SUFFIX
        .get_or_init(|| Regex::new(r"(?i)\s+\([0-9a-f-]+\)$").expect("compile paren suffix regex"))
}

fn uuid_suffix_regex() -> &'static Regex {
    UUID_SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)[-_\s][0-9a-f]{8}(-[0-9a-f]{4}){3}-[0-9a-f]{12}$")
            .expect("compile uuid suffix regex")
    })
}

fn inline_tag_regex() -> &'static Regex {
    INLINE_TAG.get_or_init(|| {
        Regex::new(r"(?m)(?:^|[\s(\[,;])#([A-Za-z][A-Za-z0-9_-]*)").expect("compile inline tag regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Html,
    Markdown,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotionParser;

impl ImportParser for NotionParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Notion
    }

    /// Needs the whole archive: the central directory sits at the end.
    fn detect(&self, content: &[u8]) -> bool {
        if !content.starts_with(ZIP_MAGIC) {
            return false;
        }
        match ZipArchive::new(Cursor::new(content)) {
            Ok(archive) => archive
                .file_names()
                .any(|name| name.contains('/') && page_kind(name).is_some()),
            Err(_) => false,
        }
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn parse(&self, content: &[u8]) -> ParseResult {
        parse_notion(content)
    }
}

/// Parse on the blocking pool so archive decompression never stalls the runtime
pub async fn parse_notion_async(bytes: Vec<u8>) -> ParseResult {
    match tokio::task::spawn_blocking(move || parse_notion(&bytes)).await {
        Ok(result) => result,
        Err(e) => ParseResult::failure(ImportError::Other(format!(
            "Notion parse task failed: {}",
            e
        ))),
    }
}

pub fn parse_notion(bytes: &[u8]) -> ParseResult {
    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            return ParseResult::failure(
                ImportError::from(e).context("Failed to parse Notion export"),
            )
        }
    };
    debug!("Notion archive with {} entries", archive.len());

    let mut collector = ResultCollector::new(ImportSource::Notion);
    for idx in 0..archive.len() {
        let mut entry = match archive.by_index(idx) {
            Ok(entry) => entry,
            Err(e) => {
                collector.record(|| format!("Entry {}", idx), Err(e.into()));
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let path = entry.name().to_string();
        let Some(kind) = page_kind(&path) else {
            continue;
        };

        let outcome = read_entry(&mut entry).and_then(|text| parse_page(&path, kind, &text));
        collector.record(|| path, outcome);
    }

    if collector.total() == 0 {
        collector.warn(
            "No content files found in ZIP. Make sure this is a Notion export with HTML or Markdown format.",
        );
    }

    collector.finish()
}

/// Page type for content entries; `None` for OS metadata and everything else
fn page_kind(path: &str) -> Option<PageKind> {
    if path.ends_with('/') || path.starts_with("__MACOSX") {
        return None;
    }
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name == ".DS_Store" || file_name.starts_with("._") {
        return None;
    }

    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => Some(PageKind::Html),
        "md" | "markdown" => Some(PageKind::Markdown),
        _ => None,
    }
}

fn read_entry(entry: &mut impl Read) -> DomainResult<String> {
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    String::from_utf8(buf).map_err(|e| ImportError::Decode(e.utf8_error()))
}

fn parse_page(path: &str, kind: PageKind, text: &str) -> DomainResult<Option<ImportItem>> {
    let (folder, file_name) = match path.rsplit_once('/') {
        Some((folder, file_name)) => (folder, file_name),
        None => ("", path),
    };

    let (title, body) = match kind {
        PageKind::Html => html_page(text, file_name),
        PageKind::Markdown => markdown_page(text, file_name),
    };
    let title = sanitize_title(&title);
    if title == UNTITLED && body.is_empty() {
        return Ok(None);
    }

    let folder_path = clean_folder_path(folder);
    let mut tags = folder_path_to_tags(&folder_path);
    tags.extend(inline_tags(&body));

    let item = ImportItem::note(title, body, ImportSource::Notion)
        .with_tags(tags)
        .with_folder_path(folder_path)
        .with_meta("originalFileName", file_name);

    Ok(Some(item))
}

/// Title and flattened body of an HTML page
fn html_page(html: &str, file_name: &str) -> (String, String) {
    let document = Document::from(html);

    let title = [
        document.find(And(Name("h1"), Class("page-title"))).next(),
        document.find(Name("title")).next(),
        document.find(Name("h1")).next(),
    ]
    .into_iter()
    .flatten()
    .map(|node| node.text().trim().to_string())
    .find(|text| !text.is_empty())
    .unwrap_or_else(|| title_from_file_name(file_name));

    let root = document
        .find(Name("article"))
        .next()
        .or_else(|| document.find(Class("page-body")).next())
        .or_else(|| document.find(Name("body")).next());

    let body_html = match root {
        Some(root) => {
            let inner = root.inner_html();
            let heading = [
                root.find(And(Name("h1"), Class("page-title"))).next(),
                root.find(Name("header")).next(),
                root.find(Name("h1")).next(),
            ]
            .into_iter()
            .flatten()
            .next();
            match heading {
                Some(heading) => inner.replacen(&heading.html(), "", 1),
                None => inner,
            }
        }
        None => html.to_string(),
    };

    (title, strip_html(&body_html))
}

/// Title from a leading `# ` heading, body is everything after it
fn markdown_page(markdown: &str, file_name: &str) -> (String, String) {
    let lines: Vec<&str> = markdown.lines().collect();
    let heading = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .and_then(|idx| {
            lines[idx]
                .trim()
                .strip_prefix("# ")
                .map(|title| (idx, title.trim().to_string()))
        });

    match heading {
        Some((idx, title)) if !title.is_empty() => {
            (title, lines[idx + 1..].join("\n").trim().to_string())
        }
        _ => (title_from_file_name(file_name), markdown.trim().to_string()),
    }
}

/// Drop the export id Notion appends to page names
fn strip_export_id(name: &str) -> String {
    let name = hex_suffix_regex().replace(name, "");
    let name = paren_suffix_regex().replace(&name, "");
    let name = uuid_suffix_regex().replace(&name, "");
    name.trim().to_string()
}

fn title_from_file_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    percent_decode(&strip_export_id(stem)).trim().to_string()
}

fn clean_folder_path(folder: &str) -> String {
    folder
        .split('/')
        .map(|part| percent_decode(&strip_export_id(part)))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode `%XX` escapes; the input is returned unchanged when the result is not UTF-8
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).unwrap_or_else(|_| input.to_string())
}

/// `#word` tokens in page text
fn inline_tags(body: &str) -> BTreeSet<Tag> {
    normalize_tags(
        inline_tag_regex()
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|tag| (INLINE_TAG_MIN..=INLINE_TAG_MAX).contains(&tag.len())),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    const HTML_PAGE: &str = r#"<html><head><title>Roadmap</title></head><body>
<article><header><h1 class="page-title">Roadmap 2024</h1></header>
<div class="page-body"><p>Ship the importer #planning</p><ul><li>Parsers</li><li>CLI</li></ul></div>
</article></body></html>"#;

    fn tag_values(item: &ImportItem) -> Vec<&str> {
        item.tags.iter().map(Tag::value).collect()
    }

    #[test]
    fn given_html_page_when_parse_then_title_and_body_without_heading() {
        let zip = build_zip(&[
            ("Workspace 0123456789abcdef0123456789abcdef/", b"".as_slice()),
            (
                "Workspace 0123456789abcdef0123456789abcdef/Roadmap 11112222333344445555666677778888.html",
                HTML_PAGE.as_bytes(),
            ),
        ]);
        let result = parse_notion(&zip);
        assert!(result.success);
        assert_eq!(result.stats.total, 1);

        let page = &result.items[0];
        assert_eq!(page.title, "Roadmap 2024");
        let body = page.body.as_deref().unwrap_or_default();
        assert!(body.contains("Ship the importer"));
        assert!(body.contains("• Parsers"));
        assert!(!body.contains("Roadmap 2024"));
        assert_eq!(page.metadata.folder_path.as_deref(), Some("Workspace"));
        assert_eq!(
            page.metadata.get("originalFileName"),
            Some("Roadmap 11112222333344445555666677778888.html")
        );
        assert_eq!(tag_values(page), vec!["planning", "workspace"]);
    }

    #[test]
    fn given_markdown_page_when_parse_then_heading_is_title() {
        let zip = build_zip(&[(
            "Notes/Ideas.md",
            b"\n# Ideas\n\nFirst idea #Rust and #x\n\nSee page#anchor".as_slice(),
        )]);
        let result = parse_notion(&zip);
        let page = &result.items[0];
        assert_eq!(page.title, "Ideas");
        assert_eq!(
            page.body.as_deref(),
            Some("First idea #Rust and #x\n\nSee page#anchor")
        );
        assert_eq!(tag_values(page), vec!["notes", "rust"]);
    }

    #[test]
    fn given_hash_inside_word_or_url_when_inline_tags_then_not_a_tag() {
        let tags = inline_tags("(#alpha) list,#beta https://site.io/page#gamma word#delta\n#epsilon");
        let values: Vec<&str> = tags.iter().map(Tag::value).collect();
        assert_eq!(values, vec!["alpha", "beta", "epsilon"]);
    }

    #[test]
    fn given_markdown_without_heading_when_parse_then_file_name_title() {
        let zip = build_zip(&[(
            "Space/My%20Page%20abc (12ab-34cd).MD",
            b"just text".as_slice(),
        )]);
        let result = parse_notion(&zip);
        assert_eq!(result.items[0].title, "My Page abc");
        assert_eq!(result.items[0].body.as_deref(), Some("just text"));
    }

    #[test]
    fn given_os_metadata_and_other_files_when_parse_then_ignored() {
        let zip = build_zip(&[
            ("__MACOSX/Space/._Page.html", b"junk".as_slice()),
            ("Space/.DS_Store", b"junk".as_slice()),
            ("Space/data.csv", b"a,b".as_slice()),
            ("Space/image.png", b"png".as_slice()),
            ("Space/Page.html", b"<h1>Page</h1><p>x</p>".as_slice()),
        ]);
        let result = parse_notion(&zip);
        assert_eq!(result.stats.total, 1);
        assert_eq!(result.stats.parsed, 1);
    }

    #[test]
    fn given_empty_untitled_page_when_parse_then_skipped() {
        let zip = build_zip(&[("Space/.md", b"   ".as_slice())]);
        let result = parse_notion(&zip);
        assert_eq!(result.stats.total, 1);
        assert_eq!(result.stats.skipped, 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn given_non_utf8_entry_when_parse_then_item_error() {
        let zip = build_zip(&[
            ("Space/Bad.md", [0xffu8, 0xfe].as_slice()),
            ("Space/Good.md", b"# Good\nbody".as_slice()),
        ]);
        let result = parse_notion(&zip);
        assert!(result.success);
        assert_eq!(result.stats.parsed, 1);
        assert_eq!(result.errors[0].item.as_deref(), Some("Space/Bad.md"));
    }

    #[test]
    fn given_non_zip_when_parse_then_structural_failure() {
        let result = parse_notion(b"definitely not a zip");
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn given_archive_without_pages_when_parse_then_warning() {
        let zip = build_zip(&[("readme.txt", b"hi".as_slice())]);
        let result = parse_notion(&zip);
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn given_archives_when_detect_then_requires_nested_pages() {
        let nested = build_zip(&[("Space/Page.md", b"# P".as_slice())]);
        let flat = build_zip(&[("Page.md", b"# P".as_slice())]);
        assert!(NotionParser.detect(&nested));
        assert!(!NotionParser.detect(&flat));
        assert!(!NotionParser.detect(b"PK\x03\x04garbage"));
    }

    #[test]
    fn given_export_names_when_strip_export_id_then_clean() {
        assert_eq!(strip_export_id("Page 0123456789abcdef0123456789abcdef"), "Page");
        assert_eq!(strip_export_id("Page (a1b2-c3)"), "Page");
        assert_eq!(
            strip_export_id("Page-12345678-1234-1234-1234-123456789abc"),
            "Page"
        );
        assert_eq!(strip_export_id("Plain"), "Plain");
        assert_eq!(percent_decode("a%20b%zz%E2%9C%93"), "a b%zz✓");
        assert_eq!(percent_decode("%FF"), "%FF");
    }

    #[tokio::test]
    async fn given_bytes_when_parse_async_then_same_result() {
        let zip = build_zip(&[("Space/Page.md", b"# Page\nbody".as_slice())]);
        let result = parse_notion_async(zip.clone()).await;
        assert_eq!(result, parse_notion(&zip));
        assert_eq!(result.items[0].title, "Page");
    }
}
