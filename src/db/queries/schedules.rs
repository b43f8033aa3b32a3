use super::text_conversion_error;
use crate::errors::{AppError, AppResult};
use crate::models::schedule::{Scope, SessionDefinition};
use crate::utils::date::{parse_weekday, weekday_code};
use crate::utils::time::{to_db_instant, to_db_time};
use chrono::{NaiveTime, Utc, Weekday};
use rusqlite::{Connection, Row, ToSql, params, params_from_iter};

fn parse_stored_time(raw: &str, idx: usize) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| text_conversion_error(idx, AppError::InvalidTime(raw.to_string())))
}

pub fn map_row(row: &Row) -> rusqlite::Result<SessionDefinition> {
    let kind: String = row.get("scope_kind")?;
    let scope_value: String = row.get("scope")?;
    let scope = Scope::from_db(&kind, scope_value)
        .ok_or_else(|| text_conversion_error(1, AppError::InvalidScope(kind.clone())))?;

    let day_str: String = row.get("weekday")?;
    let weekday = parse_weekday(&day_str).map_err(|e| text_conversion_error(3, e))?;

    let start: String = row.get("start_time")?;
    let end: String = row.get("end_time")?;

    Ok(SessionDefinition {
        id: row.get("id")?,
        scope,
        weekday,
        start: parse_stored_time(&start, 4)?,
        end: parse_stored_time(&end, 5)?,
        subject: row.get("subject")?,
        room: row.get("room")?,
    })
}

/// Store a definition; `def.id` is ignored. Returns the new id.
pub fn insert(conn: &Connection, def: &SessionDefinition) -> AppResult<i64> {
    if def.subject.trim().is_empty() {
        return Err(AppError::Other("schedule subject must not be empty".into()));
    }
    if def.start == def.end {
        return Err(AppError::InvalidTime(format!(
            "session '{}' starts and ends at {}",
            def.subject, def.start
        )));
    }

    conn.execute(
        "INSERT INTO schedules (scope_kind, scope, weekday, start_time, end_time, subject, room, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            def.scope.kind(),
            def.scope.value(),
            weekday_code(def.weekday),
            to_db_time(&def.start),
            to_db_time(&def.end),
            def.subject.trim(),
            def.room,
            to_db_instant(&Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Candidate definitions for any of `scopes` on any of `days`, in definition order.
pub fn load_for_scopes(
    conn: &Connection,
    scopes: &[Scope],
    days: &[Weekday],
) -> AppResult<Vec<SessionDefinition>> {
    if scopes.is_empty() || days.is_empty() {
        return Ok(Vec::new());
    }

    let scope_clause = vec!["(scope_kind = ? AND scope = ?)"; scopes.len()].join(" OR ");
    let day_placeholders = vec!["?"; days.len()].join(",");
    let sql = format!(
        "SELECT * FROM schedules
         WHERE ({scope_clause}) AND weekday IN ({day_placeholders})
         ORDER BY id ASC"
    );

    let mut values: Vec<String> = Vec::new();
    for s in scopes {
        values.push(s.kind().to_string());
        values.push(s.value().to_string());
    }
    for d in days {
        values.push(weekday_code(*d).to_string());
    }
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Definition of `subject` for `scopes` on `day` (first in definition order).
pub fn find_for_subject(
    conn: &Connection,
    scopes: &[Scope],
    day: Weekday,
    subject: &str,
) -> AppResult<Option<SessionDefinition>> {
    Ok(load_for_scopes(conn, scopes, &[day])?
        .into_iter()
        .find(|d| d.subject == subject))
}

pub fn list(
    conn: &Connection,
    section: Option<&str>,
    day: Option<Weekday>,
) -> AppResult<Vec<SessionDefinition>> {
    let day = day.map(weekday_code);
    let mut stmt = conn.prepare(
        "SELECT * FROM schedules
         WHERE (?1 IS NULL OR (scope_kind = 'section' AND scope = ?1))
           AND (?2 IS NULL OR weekday = ?2)
         ORDER BY scope_kind ASC, scope ASC,
                  CASE weekday
                      WHEN 'Mon' THEN 1 WHEN 'Tue' THEN 2 WHEN 'Wed' THEN 3
                      WHEN 'Thu' THEN 4 WHEN 'Fri' THEN 5 WHEN 'Sat' THEN 6
                      ELSE 7
                  END,
                  start_time ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![section, day], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
