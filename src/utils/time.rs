//! Time utilities: instants, time-of-day boundaries and UTC offsets.
//!
//! Instants are persisted as RFC 3339 UTC strings with second precision
//! (`2025-10-06T07:40:00Z`). Session boundaries are plain time-of-day values
//! in the school's canonical timezone.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Canonical storage form of an instant.
pub fn to_db_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored or user-supplied instant. Accepts RFC 3339 with any offset,
/// plus a naive `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive_datetime(s).map(|n| n.and_utc())
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parse a session boundary into a time-of-day in the canonical timezone.
///
/// Pure `HH:MM` / `HH:MM:SS` values are taken as-is. Datetime forms have
/// their date dropped: an offset-carrying value is first shifted into `tz`,
/// a naive one is read as already local.
pub fn parse_time_of_day(s: &str, tz: &FixedOffset) -> AppResult<NaiveTime> {
    let s = s.trim();

    for fmt in ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(tz).time());
    }

    parse_naive_datetime(s)
        .map(|n| n.time())
        .ok_or_else(|| AppError::InvalidTime(s.to_string()))
}

/// Canonical storage form of a time-of-day.
pub fn to_db_time(t: &NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Parse a fixed UTC offset such as `+08:00`, `-0530`, `+8`, `UTC` or `Z`.
pub fn parse_utc_offset(s: &str) -> AppResult<FixedOffset> {
    let raw = s.trim();
    let err = || AppError::InvalidTimezone(raw.to_string());

    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(err);
    }

    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(err()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => (&rest[..2], &rest[2..]),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().map_err(|_| err())?;
    let minutes: i32 = minutes.parse().map_err(|_| err())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(err());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}

/// Render an instant in the canonical timezone for console output.
pub fn format_local(dt: &DateTime<Utc>, tz: &FixedOffset) -> String {
    dt.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `HH:MM` of an instant in the canonical timezone.
pub fn format_local_hm(dt: &DateTime<Utc>, tz: &FixedOffset) -> String {
    dt.with_timezone(tz).format("%H:%M").to_string()
}
