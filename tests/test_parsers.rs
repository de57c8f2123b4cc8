use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use kbimport::{
    detect_format, parse_notion_async, parse_with, resolve_format, ImportFormat, ImportItem,
    ImportSource, ItemType, ParseResult, Tag,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

fn read_resource(name: &str) -> Vec<u8> {
    fs::read(resource(name)).unwrap_or_else(|e| panic!("cannot read {name}: {e}"))
}

fn find<'a>(result: &'a ParseResult, title: &str) -> &'a ImportItem {
    result
        .items
        .iter()
        .find(|i| i.title == title)
        .unwrap_or_else(|| panic!("no item titled {title}"))
}

fn tag_values(item: &ImportItem) -> Vec<&str> {
    item.tags.iter().map(Tag::value).collect()
}

fn assert_stats_consistent(result: &ParseResult) {
    assert_eq!(result.stats.parsed, result.items.len());
    assert_eq!(result.stats.parsed + result.stats.skipped, result.stats.total);
    assert!(result.errors.len() <= result.stats.skipped);
}

#[test]
fn given_fixture_files_when_detect_format_then_each_recognized() {
    let cases = [
        ("bookmarks.html", ImportFormat::Bookmarks),
        ("pocket.html", ImportFormat::PocketHtml),
        ("pocket.csv", ImportFormat::PocketCsv),
        ("export.enex", ImportFormat::Evernote),
        ("bookmarks.js", ImportFormat::Twitter),
        ("raindrop.csv", ImportFormat::Raindrop),
    ];
    for (name, expected) in cases {
        assert_eq!(
            detect_format(&read_resource(name)),
            Some(expected),
            "wrong format for {name}"
        );
    }
}

#[test]
fn given_browser_export_when_parse_then_folders_errors_and_collisions_reported() {
    let result = parse_with(ImportFormat::Bookmarks, &read_resource("bookmarks.html"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.total, 6);
    assert_eq!(result.stats.parsed, 4);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item.as_deref(), Some("Broken"));

    let blog = find(&result, "Rust Blog");
    assert_eq!(
        blog.metadata.folder_path.as_deref(),
        Some("Bookmarks bar/Reading")
    );
    assert_eq!(tag_values(blog), vec!["reading"]);
    assert_eq!(blog.body.as_deref(), Some("Official announcements"));
    assert_eq!(blog.created_at.map(|d| d.timestamp()), Some(1_695_000_000));

    let hn = find(&result, "Hacker News");
    assert_eq!(hn.url.as_deref(), Some("https://news.ycombinator.com"));
    assert_eq!(tag_values(hn), vec!["news", "tech"]);

    let collisions = result.dedup_collisions();
    assert_eq!(collisions.len(), 1);
    assert!(collisions.contains_key("url:https://www.rust-lang.org/"));
    assert!(result.items.iter().all(|i| i.item_type == ItemType::Link));
}

#[test]
fn given_pocket_html_when_parse_then_sections_and_tags() {
    let result = parse_with(ImportFormat::PocketHtml, &read_resource("pocket.html"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.items.len(), 3);

    let ownership = find(&result, "Understanding Ownership");
    assert_eq!(ownership.metadata.get("section"), Some("unread"));
    assert_eq!(tag_values(ownership), vec!["learning", "rust"]);
    assert_eq!(
        ownership.created_at.map(|d| d.timestamp()),
        Some(1_700_000_000)
    );

    let done = find(&result, "Finished & filed");
    assert_eq!(done.metadata.get("section"), Some("read"));
    assert_eq!(done.metadata.source, ImportSource::Pocket);
}

#[test]
fn given_pocket_csv_when_parse_then_quoted_fields_and_row_errors() {
    let result = parse_with(ImportFormat::PocketCsv, &read_resource("pocket.csv"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.parsed, 2);

    let first = find(&result, "Title with, comma");
    assert_eq!(tag_values(first), vec!["tag1", "tag2"]);
    assert_eq!(find(&result, "Second").metadata.get("section"), Some("read"));

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item.as_deref(), Some("No URL"));
    assert_eq!(result.errors[0].message, "Invalid URL: empty");
}

#[test]
fn given_enex_export_when_parse_then_notes_with_plain_text_bodies() {
    let result = parse_with(ImportFormat::Evernote, &read_resource("export.enex"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.parsed, 2);
    assert!(result.errors.is_empty());

    let groceries = find(&result, "Groceries");
    assert_eq!(groceries.item_type, ItemType::Note);
    assert_eq!(groceries.url, None);
    let body = groceries.body.as_deref().unwrap_or_default();
    assert!(body.contains("[x] Milk"), "body was {body:?}");
    assert!(body.contains("[ ] Bread"), "body was {body:?}");
    assert!(body.contains("[attachment]"), "body was {body:?}");
    assert_eq!(tag_values(groceries), vec!["home", "shopping-list"]);
    assert_eq!(
        groceries.metadata.get("sourceUrl"),
        Some("https://example.com/list")
    );
    assert_eq!(
        groceries.created_at.map(|d| d.to_rfc3339()),
        Some("2023-11-14T22:13:20+00:00".to_string())
    );

    let secrets = find(&result, "Secrets");
    assert!(secrets
        .body
        .as_deref()
        .is_some_and(|b| b.contains("[encrypted content]")));
}

#[test]
fn given_twitter_archive_when_parse_then_tweets_become_links() {
    let result = parse_with(ImportFormat::Twitter, &read_resource("bookmarks.js"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.parsed, 2);

    let long = &result.items[0];
    assert!(long.title.ends_with('…'));
    assert!(long.title.chars().count() <= 101);
    assert_eq!(
        long.url.as_deref(),
        Some("https://x.com/i/status/1724561234567890123")
    );
    assert!(long.body.as_deref().is_some_and(|b| b.contains("garbage collector")));
    assert_eq!(tag_values(long), vec!["twitter-bookmark"]);

    assert_eq!(result.items[1].title, "Tweet 1724561234567890999");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item.as_deref(), Some("Entry 2"));
}

#[test]
fn given_raindrop_export_when_parse_then_bodies_folders_and_flags() {
    let result = parse_with(ImportFormat::Raindrop, &read_resource("raindrop.csv"));
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.parsed, 2);

    let tokio = find(&result, "Tokio tutorial");
    assert_eq!(
        tokio.body.as_deref(),
        Some("Start here\n\nLearn async Rust, step by step\n\n**Highlights:** Runtime basics")
    );
    assert_eq!(tag_values(tokio), vec!["async", "dev", "rust"]);
    assert_eq!(tokio.metadata.folder_path.as_deref(), Some("Dev/Rust"));
    assert_eq!(tokio.metadata.original_id.as_deref(), Some("801"));
    assert_eq!(tokio.metadata.get("favorite"), Some("true"));

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item.as_deref(), Some("Broken"));
}

#[test]
fn given_parse_result_when_serialized_then_camel_case_json() {
    let result = parse_with(ImportFormat::Raindrop, &read_resource("raindrop.csv"));
    let json = serde_json::to_value(&result).unwrap();

    let first = &json["items"][0];
    assert_eq!(first["type"], "link");
    assert_eq!(first["metadata"]["source"], "raindrop");
    assert_eq!(first["metadata"]["folderPath"], "Dev/Rust");
    assert_eq!(first["metadata"]["originalId"], "801");
    assert!(first["createdAt"].is_string());
    assert_eq!(json["stats"]["total"], 3);

    let back: ParseResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn given_csv_named_pocket_file_when_resolve_then_csv_variant() {
    let content = read_resource("pocket.csv");
    let format = resolve_format(
        Some(ImportFormat::PocketHtml),
        Some(&resource("pocket.csv")),
        &content,
    );
    assert_eq!(format, Some(ImportFormat::PocketCsv));
}

fn notion_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[tokio::test]
async fn given_notion_archive_when_parse_async_then_pages_become_notes() {
    let archive = notion_zip(&[
        (
            "Export 0123456789abcdef0123456789abcdef/Projects/Roadmap 11112222333344445555666677778888.md",
            b"# Roadmap\n\nShip the importer #planning".as_slice(),
        ),
        (
            "Export 0123456789abcdef0123456789abcdef/Projects/Meeting.html",
            b"<html><head><title>Meeting</title></head><body><article><h1 class=\"page-title\">Weekly Sync</h1><p>Agenda</p></article></body></html>".as_slice(),
        ),
        ("Export 0123456789abcdef0123456789abcdef/Projects/logo.png", b"png".as_slice()),
    ]);
    assert_eq!(detect_format(&archive), Some(ImportFormat::Notion));

    let result = parse_notion_async(archive.clone()).await;
    assert!(result.success);
    assert_stats_consistent(&result);
    assert_eq!(result.stats.total, 2);

    let roadmap = find(&result, "Roadmap");
    assert_eq!(roadmap.item_type, ItemType::Note);
    assert_eq!(roadmap.body.as_deref(), Some("Ship the importer #planning"));
    assert_eq!(tag_values(roadmap), vec!["planning", "projects"]);

    let sync = find(&result, "Weekly Sync");
    assert_eq!(sync.body.as_deref(), Some("Agenda"));
    assert_eq!(sync.metadata.source, ImportSource::Notion);

    assert_eq!(result, parse_with(ImportFormat::Notion, &archive));
}
