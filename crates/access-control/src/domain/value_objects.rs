//! # Value Objects
//!
//! Immutable primitives of the access-control domain: ledger keys, daily
//! access windows, timestamps and boolean flags, plus the serde adapters that
//! keep their stored text form stable.

use crate::errors::ContractError;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use std::fmt;

// =============================================================================
// LEDGER KEYS
// =============================================================================

/// Default namespace prefix for policy records.
pub const DEFAULT_POLICY_PREFIX: &str = "policy_";

/// Highest Unicode scalar; appended to a prefix to bound a range scan.
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Builds the ledger key of a policy record.
#[must_use]
pub fn policy_key(prefix: &str, policy_id: &str) -> String {
    format!("{prefix}{policy_id}")
}

/// Exclusive upper bound for a scan over every key starting with `prefix`.
#[must_use]
pub fn prefix_range_end(prefix: &str) -> String {
    format!("{prefix}{MAX_UNICODE_RUNE}")
}

/// Validates a policy scope: every device id non-empty, at most `max` entries.
pub fn check_objects_list(field: &str, ids: &[String], max: usize) -> Result<(), ContractError> {
    if ids.len() > max {
        return Err(ContractError::malformed(
            field,
            format!("{} objects exceeds the limit of {max}", ids.len()),
        ));
    }
    if ids.iter().any(String::is_empty) {
        return Err(ContractError::malformed(field, "object identifiers must be non-empty"));
    }
    Ok(())
}

// =============================================================================
// ACCESS HOURS
// =============================================================================

/// Daily access window `"HH:MM-HH:MM"`, bounds inclusive.
///
/// Both bounds are fixed-width, zero-padded 24-hour clock strings, so
/// lexicographic order equals chronological order. A window that starts after
/// it ends (`"22:00-06:00"`) does not wrap midnight and matches no clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessHours {
    start: String,
    end: String,
}

impl AccessHours {
    /// Parses `"HH:MM-HH:MM"`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let (start, end) = text
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got {text:?}"))?;

        if !is_clock(start) || !is_clock(end) {
            return Err(format!("expected HH:MM-HH:MM, got {text:?}"));
        }

        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    /// Window start, `"HH:MM"`.
    #[must_use]
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Window end, `"HH:MM"`.
    #[must_use]
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Returns true if `clock` (`"HH:MM"`) falls inside the window.
    #[must_use]
    pub fn contains(&self, clock: &str) -> bool {
        self.start.as_str() <= clock && clock <= self.end.as_str()
    }
}

impl fmt::Display for AccessHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn is_clock(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u8> {
        let part = &text[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    matches!((digits(0..2), digits(3..5)), (Some(h), Some(m)) if h < 24 && m < 60)
}

/// Extracts the UTC `"HH:MM"` of a timestamp.
#[must_use]
pub fn clock_of(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H:%M").to_string()
}

// =============================================================================
// TIMESTAMPS & FLAGS
// =============================================================================

/// Parses an RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_timestamp(field: &str, text: &str) -> Result<DateTime<Utc>, ContractError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ContractError::malformed(field, format!("{text:?} is not RFC 3339: {e}")))
}

/// Parses a policy expiration: RFC 3339, or a bare `YYYY-MM-DD` date taken as
/// midnight UTC.
pub fn parse_expiration(field: &str, text: &str) -> Result<DateTime<Utc>, ContractError> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    parse_timestamp(field, text)
}

/// Formats a timestamp the way it is stored (`2030-01-01T00:00:00Z`).
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses a `"true"` / `"false"` argument.
pub fn parse_flag(field: &str, text: &str) -> Result<bool, ContractError> {
    match text.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ContractError::malformed(
            field,
            format!("expected \"true\" or \"false\", got {other:?}"),
        )),
    }
}

// =============================================================================
// SERDE ADAPTERS
// =============================================================================

/// `Option<AccessHours>` stored as a string, `""` when unset.
pub(crate) mod opt_access_hours {
    use super::AccessHours;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<AccessHours>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(hours) => s.collect_str(hours),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AccessHours>, D::Error> {
        let text = String::deserialize(d)?;
        if text.is_empty() {
            return Ok(None);
        }
        AccessHours::parse(&text).map(Some).map_err(D::Error::custom)
    }
}

/// `Option<DateTime<Utc>>` stored as RFC 3339 text, `""` when unset. Date-only
/// values are read as midnight UTC.
pub(crate) mod opt_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_str(&super::format_timestamp(ts)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let text = String::deserialize(d)?;
        if text.is_empty() {
            return Ok(None);
        }
        super::parse_expiration("PolicyExpiration", &text)
            .map(Some)
            .map_err(D::Error::custom)
    }
}

/// Accepts a JSON number or a numeric string; older records stored the
/// request cap as text, and an empty string reads as 0.
pub(crate) mod lenient_u32 {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(u32),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        match NumberOrText::deserialize(d)? {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) if text.trim().is_empty() => Ok(0),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("{text:?} is not an unsigned integer"))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
