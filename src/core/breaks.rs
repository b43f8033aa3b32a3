//! Break ledger kept inside an attendance record.
//!
//! Intervals are deduplicated by their `(start, end)` boundaries, carry a
//! derived duration when both boundaries parse, and the record's
//! `total_break_seconds` is always the sum over the retained intervals.

use crate::models::attendance::AttendanceRecord;
use crate::models::break_interval::BreakInterval;
use crate::utils::time::{parse_instant, to_db_instant};
use chrono::{DateTime, Utc};

/// Seconds between two stored boundaries, or `None` if either is malformed
/// or the interval runs backwards.
pub fn duration_seconds(start: &str, end: &str) -> Option<i64> {
    let s = parse_instant(start)?;
    let e = parse_instant(end)?;
    let secs = (e - s).num_seconds();
    (secs >= 0).then_some(secs)
}

/// `"42s"` under a minute, otherwise whole minutes (`"5m"`, truncated).
pub fn format_short_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else {
        format!("{}m", seconds / 60)
    }
}

impl BreakInterval {
    /// Build an interval from stored boundary text, deriving durations when possible.
    pub fn from_raw(start: &str, end: &str) -> Self {
        let secs = duration_seconds(start, end);
        Self {
            start: start.to_string(),
            end: end.to_string(),
            duration_seconds: secs,
            duration: secs.map(format_short_duration),
        }
    }

    pub fn between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Self {
        Self::from_raw(&to_db_instant(start), &to_db_instant(end))
    }

    /// Boundary pair normalised for dedup: parseable values compare as
    /// instants, anything else as trimmed text.
    fn dedup_key(&self) -> (String, String) {
        let norm = |raw: &str| {
            parse_instant(raw)
                .map(|dt| to_db_instant(&dt))
                .unwrap_or_else(|| raw.trim().to_string())
        };
        (norm(&self.start), norm(&self.end))
    }
}

/// Sum of the known durations.
pub fn total_seconds(breaks: &[BreakInterval]) -> i64 {
    breaks.iter().filter_map(|b| b.duration_seconds).sum()
}

/// Append `interval` unless one with the same boundaries is already present.
/// Returns whether it was appended.
pub fn append_unique(breaks: &mut Vec<BreakInterval>, interval: BreakInterval) -> bool {
    let key = interval.dedup_key();
    if breaks.iter().any(|b| b.dedup_key() == key) {
        return false;
    }
    breaks.push(interval);
    true
}

/// Book a break on `record` and refresh its running total.
pub fn record_break(
    record: &mut AttendanceRecord,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> bool {
    let appended = append_unique(&mut record.breaks, BreakInterval::between(start, end));
    record.total_break_seconds = total_seconds(&record.breaks);
    appended
}

/// Re-derive durations for intervals read back from storage.
pub fn normalize(breaks: Vec<BreakInterval>) -> Vec<BreakInterval> {
    breaks
        .into_iter()
        .map(|b| BreakInterval::from_raw(&b.start, &b.end))
        .collect()
}
