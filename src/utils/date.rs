use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc, Weekday};

/// Lesson date of an instant, i.e. its calendar date in the canonical timezone.
pub fn local_date(at: &DateTime<Utc>, tz: &FixedOffset) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Three-letter weekday code used in the timetable ("Mon" … "Sun").
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Accepts "Mon", "monday", "MO", … (first two letters are enough).
pub fn parse_weekday(s: &str) -> AppResult<Weekday> {
    let lower = s.trim().to_lowercase();
    let day = match lower.get(..2) {
        Some("mo") => Weekday::Mon,
        Some("tu") => Weekday::Tue,
        Some("we") => Weekday::Wed,
        Some("th") => Weekday::Thu,
        Some("fr") => Weekday::Fri,
        Some("sa") => Weekday::Sat,
        Some("su") => Weekday::Sun,
        _ => return Err(AppError::InvalidWeekday(s.to_string())),
    };
    Ok(day)
}

/// Parse a date filter into inclusive bounds.
///
/// Supports `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and `A:B` where both sides use
/// the same format.
pub fn parse_range(r: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let r = r.trim();
    if let Some((start, end)) = r.split_once(':') {
        let (start, end) = (start.trim(), end.trim());
        if start.len() != end.len() {
            return Err(AppError::InvalidDate(format!(
                "range bounds must share a format: {r}"
            )));
        }
        let (from, _) = period_bounds(start)?;
        let (_, to) = period_bounds(end)?;
        if to < from {
            return Err(AppError::InvalidDate(format!("empty range: {r}")));
        }
        return Ok((from, to));
    }
    period_bounds(r)
}

fn period_bounds(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidDate(p.to_string());

    match p.len() {
        4 => {
            let year: i32 = p.parse().map_err(|_| invalid())?;
            let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
            let to = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
            Ok((from, to))
        }
        7 => {
            let from = NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d")
                .map_err(|_| invalid())?;
            let next_month = if from.month() == 12 {
                NaiveDate::from_ymd_opt(from.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(from.year(), from.month() + 1, 1)
            };
            let to = next_month.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;
            Ok((from, to))
        }
        10 => {
            let d = parse_date(p).ok_or_else(invalid)?;
            Ok((d, d))
        }
        _ => Err(invalid()),
    }
}

/// Resolve the common `--date` / `--range` pair into optional bounds.
pub fn resolve_date_filter(
    date: &Option<String>,
    range: &Option<String>,
) -> AppResult<Option<(NaiveDate, NaiveDate)>> {
    match (date, range) {
        (Some(d), _) => {
            let d = parse_date(d).ok_or_else(|| AppError::InvalidDate(d.clone()))?;
            Ok(Some((d, d)))
        }
        (None, Some(r)) if r.eq_ignore_ascii_case("all") => Ok(None),
        (None, Some(r)) => parse_range(r).map(Some),
        (None, None) => Ok(None),
    }
}
