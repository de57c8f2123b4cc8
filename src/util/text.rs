// src/util/text.rs
use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::domain::item::UNTITLED;

/// Maximum title length in characters, ellipsis included
pub const MAX_TITLE_LENGTH: usize = 500;

const ELLIPSIS: &str = "...";

static ENTITY: OnceLock<Regex> = OnceLock::new();
static SCRIPT_OR_STYLE: OnceLock<Regex> = OnceLock::new();
static COMMENT: OnceLock<Regex> = OnceLock::new();
static LIST_ITEM: OnceLock<Regex> = OnceLock::new();
static BLOCK_ELEMENT: OnceLock<Regex> = OnceLock::new();
static ANY_TAG: OnceLock<Regex> = OnceLock::new();
static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

fn entity_regex() -> &'static Regex {
    ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});")
            .expect("compile html entity regex")
    })
}

fn script_or_style_regex() -> &'static Regex {
    SCRIPT_OR_STYLE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
            .expect("compile script/style regex")
    })
}

fn comment_regex() -> &'static Regex {
    COMMENT.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("compile html comment regex"))
}

fn list_item_regex() -> &'static Regex {
    LIST_ITEM.get_or_init(|| Regex::new(r"(?i)<li\b[^>]*>").expect("compile list item regex"))
}

fn block_element_regex() -> &'static Regex {
    BLOCK_ELEMENT.get_or_init(|| {
        Regex::new(r"(?i)<(br|p|div|h[1-6]|tr)\b[^>]*>").expect("compile block element regex")
    })
}

fn any_tag_regex() -> &'static Regex {
    ANY_TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("compile tag regex"))
}

fn blank_lines_regex() -> &'static Regex {
    BLANK_LINES.get_or_init(|| Regex::new(r"\n\s*\n").expect("compile blank lines regex"))
}

/// Trim, collapse whitespace, drop control characters and cap the length of a title.
///
/// Falls back to "Untitled" when nothing is left.
pub fn sanitize_title(title: &str) -> String {
    let collapsed: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let collapsed = collapsed.trim();

    if collapsed.is_empty() {
        return UNTITLED.to_string();
    }

    if collapsed.chars().count() > MAX_TITLE_LENGTH {
        let keep = MAX_TITLE_LENGTH - ELLIPSIS.len();
        let mut truncated: String = collapsed.chars().take(keep).collect();
        truncated.push_str(ELLIPSIS);
        return truncated;
    }

    collapsed.to_string()
}

/// Cut `text` to `max_length` characters, preferring a word boundary in the last 20%.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_length).collect();
    let last_space = truncated
        .char_indices()
        .filter(|(_, c)| *c == ' ')
        .map(|(byte_idx, _)| (byte_idx, truncated[..byte_idx].chars().count()))
        .last();

    match last_space {
        Some((byte_idx, char_idx)) if char_idx * 5 > max_length * 4 => {
            format!("{}{}", &truncated[..byte_idx], ELLIPSIS)
        }
        _ => format!("{}{}", truncated, ELLIPSIS),
    }
}

/// Decode named, decimal and hexadecimal HTML entities in a single pass.
///
/// Unknown named entities are left untouched.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(num) = body.strip_prefix('#') {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse::<u32>().ok(),
                };
                match code {
                    Some(160) => Some(' '),
                    Some(code) => char::from_u32(code).filter(|c| *c != '\0'),
                    None => None,
                }
            } else {
                named_entity(&body.to_ascii_lowercase())
            };

            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(c)
}

/// Convert an HTML fragment to plain text, keeping line structure.
///
/// Block elements start a new line, list items get a bullet, every other tag is
/// dropped, entities are decoded and blank line runs collapse to one.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let text = script_or_style_regex().replace_all(html, "");
    let text = comment_regex().replace_all(&text, "");
    let text = list_item_regex().replace_all(&text, "\n• ");
    let text = block_element_regex().replace_all(&text, "\n");
    let text = any_tag_regex().replace_all(&text, "");
    let text = decode_html_entities(&text);
    let text = blank_lines_regex().replace_all(&text, "\n\n");

    text.trim().to_string()
}
