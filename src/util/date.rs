// src/util/date.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::trace;

/// Raw numbers above this are epoch milliseconds, below it epoch seconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Naive layouts tried after RFC 3339 and RFC 2822; interpreted as UTC
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%dT%H%M%SZ",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];

/// Input accepted by [`parse_date`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput<'a> {
    Epoch(i64),
    Text(&'a str),
}

impl From<i64> for DateInput<'_> {
    fn from(value: i64) -> Self {
        DateInput::Epoch(value)
    }
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(value: &'a str) -> Self {
        DateInput::Text(value)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(value: &'a String) -> Self {
        DateInput::Text(value.as_str())
    }
}

/// Parse dates the way export files encode them.
///
/// Numbers (and purely numeric strings) are epoch seconds, or epoch milliseconds when
/// above 10^12. Anything else is tried against common date layouts. Results before
/// 1990-01-01 or more than a day in the future are rejected.
pub fn parse_date<'a>(input: impl Into<DateInput<'a>>) -> Option<DateTime<Utc>> {
    parse_date_at(input, Utc::now())
}

/// Like [`parse_date`] with an explicit "now" for the plausibility window
pub fn parse_date_at<'a>(input: impl Into<DateInput<'a>>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let parsed = match input.into() {
        DateInput::Epoch(value) => from_epoch(value),
        DateInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else if text.bytes().all(|b| b.is_ascii_digit()) {
                text.parse::<i64>().ok().and_then(from_epoch)
            } else {
                parse_date_string(text)
            }
        }
    };

    let date = parsed?;
    if is_plausible(&date, now) {
        Some(date)
    } else {
        trace!("Rejecting implausible date {}", date);
        None
    }
}

fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    let millis = if value > MILLIS_THRESHOLD {
        value
    } else {
        value.checked_mul(1000)?
    };
    Utc.timestamp_millis_opt(millis).single()
}

fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

fn is_plausible(date: &DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let earliest = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).single();
    match earliest {
        Some(earliest) => *date >= earliest && *date <= now + Duration::days(1),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_seconds_and_millis_when_parse_date_then_same_instant() {
        let secs = parse_date(1_700_000_000_i64).unwrap();
        let millis = parse_date(1_700_000_000_000_i64).unwrap();
        assert_eq!(secs, millis);
        assert_eq!(secs.timestamp(), 1_700_000_000);
    }

    #[test]
    fn given_numeric_string_when_parse_date_then_epoch() {
        assert_eq!(
            parse_date("1700000000"),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
        assert_eq!(
            parse_date(" 1700000000000 "),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn given_iso_strings_when_parse_date_then_parsed() {
        assert_eq!(
            parse_date("2024-01-15T14:30:22Z"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap())
        );
        assert_eq!(
            parse_date("2024-01-15T14:30:22.123+02:00").map(|d| d.timestamp()),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 22).unwrap().timestamp())
        );
        assert_eq!(
            parse_date("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("Mon, 15 Jan 2024 14:30:22 +0000"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap())
        );
    }

    #[test]
    fn given_date_before_1990_when_parse_date_then_none() {
        assert_eq!(parse_date("1800-01-01"), None);
        assert_eq!(parse_date("1989-12-31"), None);
        assert_eq!(parse_date(100_i64), None);
    }

    #[test]
    fn given_future_date_when_parse_date_then_none() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(parse_date_at("2024-06-01T12:00:00Z", now).is_some());
        assert!(parse_date_at("2024-06-03", now).is_none());
    }

    #[test]
    fn given_garbage_when_parse_date_then_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(0_i64), None);
        assert_eq!(parse_date(-5_i64), None);
        assert_eq!(parse_date("99999999999999999999999"), None);
    }
}
