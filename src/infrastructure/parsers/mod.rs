// src/infrastructure/parsers/mod.rs
use std::fmt;
use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::ImportSource;
use crate::domain::parse_result::ParseResult;

pub mod bookmarks;
pub mod evernote;
pub mod notion;
pub mod pocket;
pub mod raindrop;
pub mod twitter;

pub use bookmarks::BookmarksParser;
pub use evernote::EvernoteParser;
pub use notion::{parse_notion_async, NotionParser};
pub use pocket::{PocketCsvParser, PocketHtmlParser};
pub use raindrop::RaindropParser;
pub use twitter::TwitterParser;

/// Detectors only look at this many leading bytes
pub const DETECT_WINDOW: usize = 64 * 1024;

/// A source specific parser paired with its format detector
pub trait ImportParser: Send + Sync + Debug {
    fn format(&self) -> ImportFormat;

    /// Cheap, false-positive averse check on the leading bytes; never a full parse
    fn detect(&self, content: &[u8]) -> bool;

    /// Convert raw export bytes into canonical items
    fn parse(&self, content: &[u8]) -> ParseResult;
}

/// Closed set of supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    Bookmarks,
    PocketHtml,
    PocketCsv,
    Evernote,
    Notion,
    Twitter,
    Raindrop,
}

impl ImportFormat {
    pub const ALL: [ImportFormat; 7] = [
        ImportFormat::Bookmarks,
        ImportFormat::PocketHtml,
        ImportFormat::PocketCsv,
        ImportFormat::Evernote,
        ImportFormat::Notion,
        ImportFormat::Twitter,
        ImportFormat::Raindrop,
    ];

    /// Probe order for detection: specific signatures before generic ones
    pub const DETECT_ORDER: [ImportFormat; 7] = [
        ImportFormat::Notion,
        ImportFormat::Twitter,
        ImportFormat::Evernote,
        ImportFormat::Raindrop,
        ImportFormat::PocketCsv,
        ImportFormat::Bookmarks,
        ImportFormat::PocketHtml,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImportFormat::Bookmarks => "bookmarks",
            ImportFormat::PocketHtml => "pocket-html",
            ImportFormat::PocketCsv => "pocket-csv",
            ImportFormat::Evernote => "evernote",
            ImportFormat::Notion => "notion",
            ImportFormat::Twitter => "twitter",
            ImportFormat::Raindrop => "raindrop",
        }
    }

    pub fn source(&self) -> ImportSource {
        match self {
            ImportFormat::Bookmarks => ImportSource::Bookmarks,
            ImportFormat::PocketHtml | ImportFormat::PocketCsv => ImportSource::Pocket,
            ImportFormat::Evernote => ImportSource::Evernote,
            ImportFormat::Notion => ImportSource::Notion,
            ImportFormat::Twitter => ImportSource::Twitter,
            ImportFormat::Raindrop => ImportSource::Raindrop,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImportFormat::Bookmarks | ImportFormat::PocketHtml => &["html", "htm"],
            ImportFormat::PocketCsv | ImportFormat::Raindrop => &["csv"],
            ImportFormat::Evernote => &["enex"],
            ImportFormat::Notion => &["zip"],
            ImportFormat::Twitter => &["js"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ImportFormat::Bookmarks => "Browser bookmarks (Netscape HTML: Chrome, Firefox, Safari, Edge)",
            ImportFormat::PocketHtml => "Pocket HTML export",
            ImportFormat::PocketCsv => "Pocket CSV export",
            ImportFormat::Evernote => "Evernote ENEX export",
            ImportFormat::Notion => "Notion ZIP export (HTML or Markdown)",
            ImportFormat::Twitter => "X/Twitter archive bookmarks.js",
            ImportFormat::Raindrop => "Raindrop.io CSV export",
        }
    }

    /// Dispatch table from format to its parser
    pub fn parser(&self) -> &'static dyn ImportParser {
        match self {
            ImportFormat::Bookmarks => &BookmarksParser,
            ImportFormat::PocketHtml => &PocketHtmlParser,
            ImportFormat::PocketCsv => &PocketCsvParser,
            ImportFormat::Evernote => &EvernoteParser,
            ImportFormat::Notion => &NotionParser,
            ImportFormat::Twitter => &TwitterParser,
            ImportFormat::Raindrop => &RaindropParser,
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImportFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bookmarks" | "browser" => Ok(ImportFormat::Bookmarks),
            "pocket" | "pocket-html" => Ok(ImportFormat::PocketHtml),
            "pocket-csv" => Ok(ImportFormat::PocketCsv),
            "evernote" | "enex" => Ok(ImportFormat::Evernote),
            "notion" => Ok(ImportFormat::Notion),
            "twitter" | "x" => Ok(ImportFormat::Twitter),
            "raindrop" => Ok(ImportFormat::Raindrop),
            other => Err(ImportError::InvalidFormat(format!(
                "unknown import format '{}'",
                other
            ))),
        }
    }
}

/// Probe every detector in [`ImportFormat::DETECT_ORDER`]
#[instrument(level = "debug", skip_all, fields(len = content.len()))]
pub fn detect_format(content: &[u8]) -> Option<ImportFormat> {
    let found = ImportFormat::DETECT_ORDER
        .into_iter()
        .find(|format| format.parser().detect(content));
    debug!("Detected format: {:?}", found);
    found
}

/// Pick the format for an input: explicit choice first, then detection.
///
/// A `.csv` file resolved to Pocket selects the CSV variant.
pub fn resolve_format(
    explicit: Option<ImportFormat>,
    file_name: Option<&Path>,
    content: &[u8],
) -> Option<ImportFormat> {
    let is_csv = file_name
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    match explicit.or_else(|| detect_format(content))? {
        ImportFormat::PocketHtml if is_csv => Some(ImportFormat::PocketCsv),
        format => Some(format),
    }
}

/// Run the parser for `format` over raw bytes
pub fn parse_with(format: ImportFormat, content: &[u8]) -> ParseResult {
    format.parser().parse(content)
}

/// Decode text input, dropping a UTF-8 byte order mark
pub(crate) fn decode_text(content: &[u8]) -> DomainResult<&str> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    Ok(std::str::from_utf8(content)?)
}

/// Lower-cased leading window of the input for signature checks
pub(crate) fn sniff(content: &[u8]) -> String {
    let window = &content[..content.len().min(DETECT_WINDOW)];
    String::from_utf8_lossy(window).to_lowercase()
}

/// First non-blank line of a sniffed window
pub(crate) fn first_line(sniffed: &str) -> &str {
    sniffed
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .find(|l| !l.is_empty())
        .unwrap_or("")
}
