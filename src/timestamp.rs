//! Timestamp grammar shared by ingestion and query bounds
//!
//! Timestamps arrive as text, either from the ingestion body or from the `start_time`/`end_time`
//! query parameters. Both the space separated form (`2022-01-01 00:00:00.000000`) and the ISO
//! form (`2022-01-01T00:00:00.000000`) must resolve to the same instant. Values without an offset
//! are taken to be UTC. Everything is truncated to microsecond precision, which is what the
//! storage backends keep.

use crate::error::TimestampError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};

/// Formats with an explicit offset, tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive formats, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Wire format used when serialising an [`Event`](crate::Event) timestamp
pub const SERIALIZE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Parse a client supplied timestamp
///
/// # Examples
///
/// ```rust
/// use the_eye::timestamp::parse;
///
/// let space = parse("2022-01-01 00:00:00.2").unwrap();
/// let iso = parse("2022-01-01T00:00:00.200000").unwrap();
///
/// assert_eq!(space, iso);
/// ```
pub fn parse(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Some(dt) = parse_with_offset(input) {
        return Ok(dt);
    }

    if let Some(dt) = restore_plus(input).and_then(|restored| parse_with_offset(&restored)) {
        return Ok(dt);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive).trunc_subsecs(6));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(TimestampError::Malformed(input.to_string()))
}

fn parse_with_offset(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(6));
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(input, format).ok())
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(6))
}

/// An unencoded `+` in a query string decodes to a space, so `+02:00` may arrive as ` 02:00`
fn restore_plus(input: &str) -> Option<String> {
    let (head, offset) = input.rsplit_once(' ')?;

    let digits = offset.chars().filter(char::is_ascii_digit).count();
    let offset_shaped = match offset.len() {
        5 => digits == 4 && offset.as_bytes()[2] == b':',
        4 => digits == 4,
        _ => false,
    };

    // `2022-01-01 00:00` is a minutes-precision time, not a date with an offset
    if !offset_shaped || !head.contains(':') {
        return None;
    }

    Some(format!("{}+{}", head, offset))
}

/// Render a timestamp in the serialised event format
pub fn format(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(SERIALIZE_FORMAT).to_string()
}

/// `#[serde(with)]` adapter for event timestamps
pub mod serde_format {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        super::parse(&raw).map_err(de::Error::custom)
    }
}
