// PacketSleuth - core/parser.rs
//
// Line-oriented log parsing. A total function: every line yields a LogEntry,
// with each derived field present only when the line encodes it.
//
// Parsing is an ordered sequence of independent extractors:
//   1. JSON-lines record (the server's native file format).
//   2. Plain-text prefix: timestamp and level tokens, in either order.
//   3. user=... token anywhere in the line.
// None of them blocks another; a miss simply leaves the field as None.
//
// Core layer: pure string processing, never touches the filesystem.

use crate::core::model::LogEntry;
use crate::util::constants;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Parse one raw log line (terminator already stripped) into a `LogEntry`.
///
/// Trailing whitespace is ignored for extraction but preserved in `raw`.
/// If nothing structured is recognised the whole line becomes the message.
pub fn parse_line(raw: &str) -> LogEntry {
    let line = raw.trim_end();

    if let Some(entry) = parse_json_record(raw, line) {
        return entry;
    }

    let mut rest = line;
    let mut timestamp = None;
    let mut level = None;

    // Timestamp and level may appear in either order ("2024-.. ERROR msg" or
    // "info [2024-..] msg"); each extractor gets one shot at the remaining text.
    for _ in 0..2 {
        if timestamp.is_none() {
            if let Some((ts, remaining)) = extract_timestamp(rest) {
                timestamp = Some(ts);
                rest = remaining;
                continue;
            }
        }
        if level.is_none() {
            if let Some((lv, remaining)) = extract_level(rest) {
                level = Some(lv);
                rest = remaining;
                continue;
            }
        }
        break;
    }

    let user = extract_user(line);

    let message = if timestamp.is_none() && level.is_none() {
        line.to_string()
    } else {
        // A user token directly after the prefix is part of the prefix.
        if let Some((token, remaining)) = split_token(rest) {
            if user_token_value(token).is_some() {
                rest = remaining;
            }
        }
        rest.trim().to_string()
    };

    LogEntry {
        timestamp,
        level,
        user,
        message,
        raw: raw.to_string(),
        location: None,
    }
}

// =============================================================================
// JSON-lines extractor
// =============================================================================

/// Parse a JSON object line. Returns `None` if the line is not a JSON object,
/// in which case the plain-text extractors take over.
fn parse_json_record(raw: &str, line: &str) -> Option<LogEntry> {
    if !line.trim_start().starts_with('{') {
        return None;
    }
    let object = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };

    let timestamp = first_str(&object, constants::JSON_TIMESTAMP_KEYS).and_then(parse_datetime);
    let level = first_str(&object, constants::JSON_LEVEL_KEYS).map(str::to_string);
    let user = first_str(&object, constants::JSON_USER_KEYS).map(str::to_string);
    let message = first_str(&object, constants::JSON_MESSAGE_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| line.to_string());

    Some(LogEntry {
        timestamp,
        level,
        user,
        message,
        raw: raw.to_string(),
        location: None,
    })
}

/// First non-empty string value found under any of `keys`.
fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| object.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

// =============================================================================
// Plain-text extractors
// =============================================================================

/// Split off the next whitespace-delimited token, returning it and the text
/// after it (leading whitespace of the remainder is kept).
fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Leading timestamp in one of these shapes:
///   `2024-01-01T10:00:00Z`                 (single RFC 3339 token)
///   `2024-01-01 10:00:00.000 [Z|UTC|+02:00]` (date and time tokens)
///   `[2024-01-01 10:00:00.000 Z]`          (bracketed, any supported form)
fn extract_timestamp(s: &str) -> Option<(DateTime<Utc>, &str)> {
    let trimmed = s.trim_start();

    if let Some(inner) = trimmed.strip_prefix('[') {
        let close = inner.find(']')?;
        let ts = parse_datetime(&inner[..close])?;
        return Some((ts, &inner[close + 1..]));
    }

    let (first, rest) = split_token(trimmed)?;
    if let Some(ts) = parse_datetime(first) {
        return Some((ts, rest));
    }

    if NaiveDate::parse_from_str(first, "%Y-%m-%d").is_err() {
        return None;
    }
    let (second, rest) = split_token(rest)?;
    if let Some((zone, after)) = split_token(rest) {
        if zone == "Z" || zone == "UTC" {
            let ts = parse_datetime(&format!("{first} {second}"))?;
            return Some((ts, after));
        }
        // A malformed offset leaves the timestamp absent rather than
        // silently reading the time as UTC.
        if looks_like_utc_offset(zone) {
            let ts = parse_datetime(&format!("{first} {second} {zone}"))?;
            return Some((ts, after));
        }
    }
    let ts = parse_datetime(&format!("{first} {second}"))?;
    Some((ts, rest))
}

/// `+HH:MM`, `-HH:MM`, `+HHMM` or `-HHMM`.
fn looks_like_utc_offset(token: &str) -> bool {
    let Some(body) = token.strip_prefix(['+', '-']) else {
        return false;
    };
    let digits = body.chars().filter(char::is_ascii_digit).count();
    digits == 4 && body.chars().all(|c| c.is_ascii_digit() || c == ':')
}

/// Leading severity token, optionally bracketed or colon-terminated.
/// The token is returned in its original case, brackets removed.
fn extract_level(s: &str) -> Option<(String, &str)> {
    let (token, rest) = split_token(s)?;
    let bare = token
        .trim_end_matches(':')
        .trim_start_matches('[')
        .trim_end_matches(']');
    constants::KNOWN_LEVELS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(bare))
        .then(|| (bare.to_string(), rest))
}

/// First `user=...`-style token anywhere in the line.
fn extract_user(line: &str) -> Option<String> {
    line.split_whitespace()
        .find_map(user_token_value)
        .map(str::to_string)
}

/// Value of a `key=value` token when `key` is a recognised user key.
fn user_token_value(token: &str) -> Option<&str> {
    let (key, value) = token.split_once('=')?;
    if !constants::USER_KEYS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(key))
    {
        return None;
    }
    let value = value.trim_end_matches(',').trim_matches('"').trim_matches('\'');
    (!value.is_empty()).then_some(value)
}

// =============================================================================
// Timestamp parsing
// =============================================================================

/// Parse a textual point in time, as used for filter bounds.
///
/// Accepts everything `parse_datetime` does, plus a bare `YYYY-MM-DD`
/// date (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    parse_datetime(trimmed).or_else(|| {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| ndt.and_utc())
    })
}

/// Parse a date-and-time string. Strategies, in order:
///   1. RFC 3339 (`2024-01-01T10:00:00Z`, `2024-01-01T10:00:00.5+02:00`).
///   2. Space-separated with numeric offset (`2024-01-01 10:00:00.000 +02:00`).
///   3. Naive `YYYY-MM-DD[ T]HH:MM:SS[.fff]`, optionally suffixed by `Z` or
///      `UTC`, interpreted as UTC. This is the server's own emission format.
fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.into());
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %:z")
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %z"))
    {
        return Some(dt.into());
    }

    let naive = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim_end()
        .replacen('T', " ", 1);

    NaiveDateTime::parse_from_str(&naive, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&naive, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|ndt| ndt.and_utc())
}
