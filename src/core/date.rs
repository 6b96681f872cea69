//! Rendering of blame timestamps.
//!
//! Recent timestamps (within the last five days) render as a relative phrase
//! such as "2 days ago"; older ones render with the configured date format.
//!
//! The format accepts the placeholders `YYYY`, `YY`, `MMMM`, `MMM`, `MM`,
//! `DD`, `HH`, `hh`, `mm`, `ss` and `A`. A format containing `%` is taken to be
//! a chrono strftime pattern and used as is.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use std::fmt::Write;

/// Format used when none is configured
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Timestamps newer than this many days render relatively
pub const RELATIVE_WINDOW_DAYS: i64 = 5;

const FALLBACK_PATTERN: &str = "%Y-%m-%d";

const PLACEHOLDERS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("A", "%p"),
];

/// Translate a placeholder format into a strftime pattern
pub fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        return format.to_string();
    }

    let mut pattern = String::with_capacity(format.len() * 2);
    let mut rest = format;
    'outer: while let Some(c) = rest.chars().next() {
        for (placeholder, spec) in PLACEHOLDERS {
            if let Some(tail) = rest.strip_prefix(placeholder) {
                pattern.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        pattern.push(c);
        rest = &rest[c.len_utf8()..];
    }
    pattern
}

/// Parse `YYYY-MM-DD HH:MM:SS +ZZZZ`; a missing offset is read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

/// Relative phrase for an elapsed duration, without the "ago"/"in" wrapper
fn humanize(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().unsigned_abs() as f64;
    let seconds = secs.round();
    let minutes = (secs / 60.0).round();
    let hours = (secs / 3_600.0).round();
    let days = (secs / 86_400.0).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes as i64)
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours as i64)
    } else if days <= 1.0 {
        "a day".to_string()
    } else {
        format!("{} days", days as i64)
    }
}

/// Renders raw blame timestamps for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRenderer {
    pattern: String,
}

impl Default for DateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl DateRenderer {
    pub fn new(format: &str) -> Self {
        let pattern = to_strftime(format);
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            log::warn!("Invalid date format '{format}', falling back to {DEFAULT_DATE_FORMAT}");
            return Self {
                pattern: FALLBACK_PATTERN.to_string(),
            };
        }
        Self { pattern }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render `raw` as seen at `now`. Unparsable input is returned verbatim.
    pub fn render(&self, raw: &str, now: DateTime<Utc>) -> String {
        let Some(timestamp) = parse_timestamp(raw) else {
            return raw.to_string();
        };

        let elapsed = now.signed_duration_since(timestamp);
        if elapsed > Duration::days(RELATIVE_WINDOW_DAYS) {
            let mut out = String::new();
            if write!(out, "{}", timestamp.format(&self.pattern)).is_err() {
                return raw.to_string();
            }
            return out;
        }

        let phrase = humanize(elapsed);
        if elapsed < Duration::zero() {
            format!("in {phrase}")
        } else {
            format!("{phrase} ago")
        }
    }

    pub fn render_now(&self, raw: &str) -> String {
        self.render(raw, Utc::now())
    }
}
