// src/cli/display.rs
use std::fmt::Write;

use crossterm::style::Stylize;
use itertools::Itertools;

use crate::domain::parse_result::ParseResult;
use crate::domain::tag::Tag;
use crate::infrastructure::parsers::ImportFormat;
use crate::util::text::truncate_text;

/// Titles longer than this are shortened in the summary
const SUMMARY_TITLE_WIDTH: usize = 80;

/// Human readable report of a parse run
pub fn render_summary(source: &str, format: ImportFormat, result: &ParseResult, color: bool) -> String {
    let mut out = String::new();
    let paint = |text: String, style: fn(String) -> String| if color { style(text) } else { text };

    let status = if result.success {
        paint("ok".to_string(), |s| s.green().to_string())
    } else {
        paint("failed".to_string(), |s| s.red().to_string())
    };
    let _ = writeln!(out, "{} ({}): {}", source, format, status);
    let _ = writeln!(
        out,
        "  total: {}  parsed: {}  skipped: {}",
        result.stats.total, result.stats.parsed, result.stats.skipped
    );

    for item in &result.items {
        let tags = Tag::format_tags(&item.tags);
        let target = item.url.as_deref().unwrap_or("-");
        let title = truncate_text(&item.title, SUMMARY_TITLE_WIDTH);
        let _ = write!(out, "  {} {}", paint(title, |s| s.green().to_string()), target);
        if !tags.is_empty() {
            let _ = write!(out, " [{}]", paint(tags, |s| s.yellow().to_string()));
        }
        out.push('\n');
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out, "{}", paint("Errors:".to_string(), |s| s.red().to_string()));
        for error in &result.errors {
            match &error.item {
                Some(item) => {
                    let _ = writeln!(out, "  {}: {}", item, error.message);
                }
                None => {
                    let _ = writeln!(out, "  {}", error.message);
                }
            }
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "{}", paint("Warnings:".to_string(), |s| s.yellow().to_string()));
        for warning in &result.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }

    let collisions = result.dedup_collisions();
    if !collisions.is_empty() {
        let shared: usize = collisions.values().map(Vec::len).sum();
        let _ = writeln!(
            out,
            "  {} items share {} dedup keys (all kept)",
            shared,
            collisions.len()
        );
    }

    out
}

/// One line per supported format: name, extensions, description
pub fn render_formats() -> String {
    ImportFormat::ALL
        .iter()
        .map(|format| {
            format!(
                "{:<12} {:<10} {}",
                format.name(),
                format.extensions().join(","),
                format.description()
            )
        })
        .join("\n")
}
