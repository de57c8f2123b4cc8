// src/util/url.rs
use url::Url;

/// Trim and validate a URL, defaulting to `https://` when no http(s) scheme is given.
///
/// Returns `None` unless the result is an absolute URL with a host.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match Url::parse(&normalized) {
        Ok(parsed) if parsed.has_host() => Some(normalized),
        _ => None,
    }
}

/// Host of the URL without a leading `www.`
pub fn extract_domain(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
