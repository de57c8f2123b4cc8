// src/domain/item.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::tag::Tag;
use crate::util::url::normalize_url;

/// Title used whenever a source gives nothing usable
pub const UNTITLED: &str = "Untitled";

/// The service an export originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Bookmarks,
    Pocket,
    Notion,
    Evernote,
    Twitter,
    Raindrop,
}

impl ImportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportSource::Bookmarks => "bookmarks",
            ImportSource::Pocket => "pocket",
            ImportSource::Notion => "notion",
            ImportSource::Evernote => "evernote",
            ImportSource::Twitter => "twitter",
            ImportSource::Raindrop => "raindrop",
        }
    }

    /// Items of a source are either all links or all notes
    pub fn item_type(&self) -> ItemType {
        match self {
            ImportSource::Notion | ImportSource::Evernote => ItemType::Note,
            _ => ItemType::Link,
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Note,
    Link,
}

/// Provenance of an item. Source specific fields live in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub source: ImportSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ItemMetadata {
    pub fn new(source: ImportSource) -> Self {
        Self {
            source,
            folder_path: None,
            original_id: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Canonical, source-agnostic unit produced by every parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: BTreeSet<Tag>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: ItemMetadata,
}

impl ImportItem {
    /// Create a link item; `url` is expected to be normalized already
    pub fn link(title: impl Into<String>, url: impl Into<String>, source: ImportSource) -> Self {
        Self {
            title: title.into(),
            body: None,
            url: Some(url.into()),
            tags: BTreeSet::new(),
            item_type: ItemType::Link,
            created_at: None,
            metadata: ItemMetadata::new(source),
        }
    }

    pub fn note(title: impl Into<String>, body: impl Into<String>, source: ImportSource) -> Self {
        Self {
            title: title.into(),
            body: None,
            url: None,
            tags: BTreeSet::new(),
            item_type: ItemType::Note,
            created_at: None,
            metadata: ItemMetadata::new(source),
        }
        .with_body(body)
    }

    /// Set the body, dropping it when blank
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.trim().is_empty() { None } else { Some(body) };
        self
    }

    pub fn with_tags(mut self, tags: BTreeSet<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the folder path, ignoring empty paths
    pub fn with_folder_path(mut self, folder_path: impl Into<String>) -> Self {
        let folder_path = folder_path.into();
        if !folder_path.is_empty() {
            self.metadata.folder_path = Some(folder_path);
        }
        self
    }

    pub fn with_original_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.original_id = Some(id.into());
        self
    }

    /// Attach a source specific metadata field
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.extra.insert(key.into(), value.into());
        self
    }

    /// Checks the invariants every emitted item must satisfy
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(ImportError::InvalidRecord("item has an empty title".to_string()));
        }
        if self.item_type == ItemType::Link {
            match self.url.as_deref().map(normalize_url) {
                Some(Some(_)) => {}
                _ => {
                    return Err(ImportError::InvalidUrl(
                        self.url.clone().unwrap_or_else(|| "missing".to_string()),
                    ))
                }
            }
        }
        Ok(())
    }

    pub fn dedup_key(&self) -> String {
        generate_dedup_key(self.url.as_deref(), &self.title)
    }
}

/// Key used to recognize the same logical item across sources and imports.
///
/// Links are keyed by normalized URL, everything else by lower-cased title.
pub fn generate_dedup_key(url: Option<&str>, title: &str) -> String {
    match url.filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            let normalized = normalize_url(url).unwrap_or_else(|| url.trim().to_string());
            format!("url:{}", normalized)
        }
        None => format!("title:{}", title.trim().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tag::normalize_tags;

    #[test]
    fn given_missing_scheme_when_generate_dedup_key_then_matches_full_url() {
        assert_eq!(
            generate_dedup_key(Some("example.com"), "a"),
            generate_dedup_key(Some("https://example.com"), "b")
        );
        assert_eq!(
            generate_dedup_key(Some("example.com"), ""),
            "url:https://example.com"
        );
    }

    #[test]
    fn given_note_when_generate_dedup_key_then_uses_lowercased_title() {
        assert_eq!(generate_dedup_key(None, "  My Note "), "title:my note");
        let note = ImportItem::note("Meeting Notes", "body", ImportSource::Evernote);
        assert_eq!(note.dedup_key(), "title:meeting notes");
    }

    #[test]
    fn given_source_when_item_type_then_fixed_per_source() {
        assert_eq!(ImportSource::Bookmarks.item_type(), ItemType::Link);
        assert_eq!(ImportSource::Raindrop.item_type(), ItemType::Link);
        assert_eq!(ImportSource::Twitter.item_type(), ItemType::Link);
        assert_eq!(ImportSource::Evernote.item_type(), ItemType::Note);
        assert_eq!(ImportSource::Notion.item_type(), ItemType::Note);
    }

    #[test]
    fn given_link_without_url_when_validate_then_fails() {
        let mut item = ImportItem::link("Title", "https://example.com", ImportSource::Pocket);
        assert!(item.validate().is_ok());
        item.url = None;
        assert!(item.validate().is_err());
        item.url = Some("http://".to_string());
        assert!(item.validate().is_err());
    }

    #[test]
    fn given_blank_title_when_validate_then_fails() {
        let item = ImportItem::note(" ", "body", ImportSource::Notion);
        assert!(item.validate().is_err());
    }

    #[test]
    fn given_item_when_serialize_then_uses_camel_case_and_flattened_metadata() {
        let item = ImportItem::link("Rust", "https://rust-lang.org", ImportSource::Bookmarks)
            .with_tags(normalize_tags(["Dev", "rust"]))
            .with_folder_path("Bookmarks Bar/Dev")
            .with_meta("icon", "data:image/png;base64,AAA");

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "link");
        assert_eq!(json["tags"], serde_json::json!(["dev", "rust"]));
        assert_eq!(json["metadata"]["source"], "bookmarks");
        assert_eq!(json["metadata"]["folderPath"], "Bookmarks Bar/Dev");
        assert_eq!(json["metadata"]["icon"], "data:image/png;base64,AAA");
        assert!(json.get("body").is_none());
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn given_blank_body_when_with_body_then_none() {
        let item = ImportItem::link("t", "https://a.io", ImportSource::Raindrop).with_body("  ");
        assert!(item.body.is_none());
    }
}
