//! Schedule resolver: which session, if any, is running for a student at an instant.
//!
//! Weekday and calendar date are taken in the canonical timezone. A session
//! whose end precedes its start runs past midnight, so at an instant we look
//! at the sessions of the instant's own weekday first and then at the
//! overnight sessions that started on the previous day.
//!
//! When definitions overlap the first one in definition order wins; overlaps
//! are a timetable data problem and are not arbitrated.

use crate::db::queries::schedules;
use crate::errors::AppResult;
use crate::models::schedule::{ActiveSession, Scope, SessionDefinition};
use crate::utils::date::local_date;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use rusqlite::Connection;

/// Pure resolution over an in-memory list of definitions.
pub fn resolve(
    definitions: &[SessionDefinition],
    scopes: &[Scope],
    at: &DateTime<Utc>,
    tz: &FixedOffset,
) -> Option<ActiveSession> {
    let today = local_date(at, tz);
    let in_scope = |d: &&SessionDefinition| scopes.contains(&d.scope);

    let same_day = definitions
        .iter()
        .filter(in_scope)
        .filter(|d| d.weekday == today.weekday())
        .filter_map(|d| d.anchored_on(today, tz))
        .find(|s| s.contains(at));

    if same_day.is_some() {
        return same_day;
    }

    let yesterday = today.pred_opt()?;
    definitions
        .iter()
        .filter(in_scope)
        .filter(|d| d.is_overnight() && d.weekday == yesterday.weekday())
        .filter_map(|d| d.anchored_on(yesterday, tz))
        .find(|s| s.contains(at))
}

/// Scopes a student belongs to: their section and their own id.
pub fn scopes_for(section: &str, student_id: &str) -> Vec<Scope> {
    vec![
        Scope::Section(section.to_string()),
        Scope::Student(student_id.to_string()),
    ]
}

/// Resolve against the timetable store.
pub fn resolve_for(
    conn: &Connection,
    scopes: &[Scope],
    at: &DateTime<Utc>,
    tz: &FixedOffset,
) -> AppResult<Option<ActiveSession>> {
    let today = local_date(at, tz);
    let mut days = vec![today.weekday()];
    if let Some(prev) = today.pred_opt() {
        days.push(prev.weekday());
    }

    let candidates = schedules::load_for_scopes(conn, scopes, &days)?;
    let found = resolve(&candidates, scopes, at, tz);

    match &found {
        Some(s) => log::debug!(
            "resolved {} ({} → {}) for {}",
            s.subject(),
            s.starts_at,
            s.ends_at,
            at
        ),
        None => log::debug!(
            "no session among {} candidates at {}",
            candidates.len(),
            at
        ),
    }

    Ok(found)
}
