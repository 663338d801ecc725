//! Wire-date handling.
//!
//! The upstream data uses ISO-8601 strings and a `.NET`-style zero-date
//! sentinel (`0001-01-01T00:00:00`) for "no date set". The sentinel and the
//! empty string both deserialize to `None`; an unparsable string is an error,
//! never silently dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// The zero-date sentinel, date part.
pub const ZERO_DATE: NaiveDate = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();

/// Parse a wire date: plain date, naive datetime, or RFC 3339.
///
/// Returns `Ok(None)` for blank input and for the zero-date sentinel.
pub fn parse_wire_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let date = if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        d
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.date()
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.naive_utc().date()
    } else {
        return Err(format!("invalid date: {s:?}"));
    };

    if date == ZERO_DATE {
        return Ok(None);
    }
    Ok(Some(date))
}

/// Deserialize a required wire date. Blank/sentinel input is rejected.
pub fn deserialize_required<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_wire_date(&raw)
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("date is required"))
}

/// Deserialize an optional wire date. Missing, null, blank, and the zero-date
/// sentinel all become `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_wire_date(&raw).map_err(serde::de::Error::custom),
    }
}
