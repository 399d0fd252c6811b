// PacketSleuth - core/filter.rs
//
// Filter engine for log entries.
// All set criteria are AND-combined; an unset criterion never excludes.
// Core layer: pure logic, no I/O.

use crate::core::model::LogEntry;
use crate::core::parser::parse_timestamp;
use crate::util::constants;
use crate::util::error::FilterError;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Textual criteria as supplied by an operator (CLI flags, config, API).
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default)]
pub struct CriteriaInput {
    pub search: Option<String>,
    pub regex: Option<String>,
    pub level: Option<String>,
    pub user: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Complete, validated filter criteria for one run.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Literal, case-sensitive substring of the raw line.
    pub substring: Option<String>,

    /// Compiled regex, matched anywhere in the raw line.
    pub pattern: Option<Regex>,

    /// Exact level token.
    pub level: Option<String>,

    /// Exact user token.
    pub user: Option<String>,

    /// Start of time range (inclusive).
    pub start: Option<DateTime<Utc>>,

    /// End of time range (inclusive).
    pub end: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    /// Validate textual criteria. Every error here is a configuration mistake
    /// and is raised before any archive is touched.
    pub fn from_input(input: &CriteriaInput) -> Result<Self, FilterError> {
        let mut criteria = Self {
            substring: non_empty(&input.search),
            level: non_empty(&input.level),
            user: non_empty(&input.user),
            start: parse_bound("start", &input.start)?,
            end: parse_bound("end", &input.end)?,
            ..Default::default()
        };

        if let (Some(start), Some(end)) = (criteria.start, criteria.end) {
            if start > end {
                return Err(FilterError::InvertedTimeRange {
                    start: start.to_rfc3339(),
                    end: end.to_rfc3339(),
                });
            }
        }

        if let Some(pattern) = non_empty(&input.regex) {
            criteria.set_regex(&pattern)?;
        }

        Ok(criteria)
    }

    /// Returns true if no criteria are set.
    pub fn is_empty(&self) -> bool {
        self.substring.is_none()
            && self.pattern.is_none()
            && self.level.is_none()
            && self.user.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    /// Set the regex search pattern, compiling it.
    /// An empty pattern clears the regex criterion.
    pub fn set_regex(&mut self, pattern: &str) -> Result<(), FilterError> {
        if pattern.is_empty() {
            self.pattern = None;
            return Ok(());
        }
        if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
            return Err(FilterError::RegexTooLong {
                length: pattern.len(),
                max_length: constants::MAX_REGEX_PATTERN_LENGTH,
            });
        }
        let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        self.pattern = Some(regex);
        Ok(())
    }

    /// Check a single entry against every set criterion.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        matches(entry, self)
    }

    /// One-line summary of the active criteria, for logging.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref s) = self.substring {
            parts.push(format!("search={s:?}"));
        }
        if let Some(ref re) = self.pattern {
            parts.push(format!("regex={:?}", re.as_str()));
        }
        if let Some(ref level) = self.level {
            parts.push(format!("level={level}"));
        }
        if let Some(ref user) = self.user {
            parts.push(format!("user={user}"));
        }
        if let Some(start) = self.start {
            parts.push(format!("start={}", start.to_rfc3339()));
        }
        if let Some(end) = self.end {
            parts.push(format!("end={}", end.to_rfc3339()));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_bound(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<DateTime<Utc>>, FilterError> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| FilterError::InvalidTimestamp {
                field,
                value: text.to_string(),
            }),
    }
}

/// Check if a single entry matches all set criteria.
pub fn matches(entry: &LogEntry, criteria: &FilterCriteria) -> bool {
    // Substring (literal, case-sensitive)
    if let Some(ref needle) = criteria.substring {
        if !entry.raw.contains(needle.as_str()) {
            return false;
        }
    }

    // Regex
    if let Some(ref regex) = criteria.pattern {
        if !regex.is_match(&entry.raw) {
            return false;
        }
    }

    // Level
    if let Some(ref level) = criteria.level {
        if entry.level.as_deref() != Some(level.as_str()) {
            return false;
        }
    }

    // User
    if let Some(ref user) = criteria.user {
        if entry.user.as_deref() != Some(user.as_str()) {
            return false;
        }
    }

    // Time range; entries without timestamps cannot satisfy a bound
    if let Some(start) = criteria.start {
        match entry.timestamp {
            Some(ts) if ts >= start => {}
            _ => return false,
        }
    }
    if let Some(end) = criteria.end {
        match entry.timestamp {
            Some(ts) if ts <= end => {}
            _ => return false,
        }
    }

    true
}
