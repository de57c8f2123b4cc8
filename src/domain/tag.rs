// src/domain/tag.rs
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainResult, ImportError};

/// Maximum length of a normalized tag
pub const MAX_TAG_LENGTH: usize = 50;

/// Generic root folder names that carry no meaning as tags
const EXCLUDED_FOLDERS: &[&str] = &[
    "bookmarks",
    "bookmarks bar",
    "bookmarks menu",
    "bookmarks toolbar",
    "other bookmarks",
    "mobile bookmarks",
    "favorites",
    "favorites bar",
    "unfiled bookmarks",
    "root",
    "export",
    "exported",
];

/// Represents a single normalized tag as a value object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag {
    value: String,
}

impl Tag {
    /// Creates a new Tag, normalizing the raw value.
    ///
    /// Fails when nothing usable is left after normalization.
    pub fn new<S: AsRef<str>>(value: S) -> DomainResult<Self> {
        let normalized = normalize_tag(value.as_ref());

        if normalized.is_empty() {
            return Err(ImportError::InvalidTag(format!(
                "'{}' is empty after normalization",
                value.as_ref()
            )));
        }

        Ok(Self { value: normalized })
    }

    /// Get the tag value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parse a delimited tag string into a set of valid Tags, dropping empty entries
    pub fn parse_tags<S: AsRef<str>>(tag_str: S, delimiters: &[char]) -> BTreeSet<Tag> {
        normalize_tags(tag_str.as_ref().split(|c| delimiters.contains(&c)))
    }

    /// Format a set of tags into a comma separated string
    pub fn format_tags(tags: &BTreeSet<Tag>) -> String {
        tags.iter().map(Tag::value).join(",")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// Lower-case, hyphenate and truncate a raw tag.
///
/// Every character outside `[a-z0-9_-]` becomes a hyphen, hyphen runs collapse and
/// leading/trailing hyphens are dropped. Idempotent.
pub fn normalize_tag(tag: &str) -> String {
    let mut normalized = String::with_capacity(tag.len());
    for c in tag.trim().to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && normalized.ends_with('-') {
            continue;
        }
        normalized.push(c);
    }

    let trimmed = normalized.trim_matches('-');
    // only ASCII is left, so byte slicing is safe
    let truncated = &trimmed[..trimmed.len().min(MAX_TAG_LENGTH)];
    truncated.trim_end_matches('-').to_string()
}

/// Normalize many raw tags into a de-duplicated set, dropping empty results
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<Tag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|t| Tag::new(t).ok())
        .collect()
}

/// Convert a folder path to tags, e.g. "Bookmarks Bar/Development/JavaScript"
/// becomes `development, javascript`.
pub fn folder_path_to_tags(folder_path: &str) -> BTreeSet<Tag> {
    let segments = folder_path
        .split(['/', '\\', '>'])
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty() && !EXCLUDED_FOLDERS.contains(&part.as_str()));

    normalize_tags(segments)
}
