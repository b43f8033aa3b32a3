//! Audit trails: the internal `log` table, the raw tap log and the per-day
//! presence mirror. Tap-side writes here are secondary: callers swallow
//! their failures.

use crate::errors::AppResult;
use crate::models::presence::TapAction;
use crate::models::student::Attendee;
use crate::models::tap_log::{PresenceLogEntry, TapLogEntry};
use crate::utils::time::to_db_instant;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Write an internal log line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = Local::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}

/// Internal log rows, oldest first: (id, date, operation, target, message).
pub fn load_log(conn: &Connection) -> AppResult<Vec<(i64, String, String, String, String)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, IFNULL(target, ''), message FROM log ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// One raw tap attempt as it reached the ingress.
pub struct TapAttempt<'a> {
    pub at: &'a DateTime<Utc>,
    pub badge_tag: &'a str,
    pub student_id: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub action: Option<TapAction>,
    pub accepted: bool,
    pub message: &'a str,
}

pub fn record_tap(conn: &Connection, t: &TapAttempt) -> AppResult<()> {
    conn.execute(
        "INSERT INTO tap_log (at, badge_tag, student_id, subject, action, outcome, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            to_db_instant(t.at),
            t.badge_tag,
            t.student_id,
            t.subject,
            t.action.map(|a| a.as_str()),
            if t.accepted { "accepted" } else { "rejected" },
            t.message,
        ],
    )?;
    Ok(())
}

fn map_tap(row: &Row) -> rusqlite::Result<TapLogEntry> {
    Ok(TapLogEntry {
        id: row.get("id")?,
        at: row.get("at")?,
        badge_tag: row.get("badge_tag")?,
        student_id: row.get("student_id")?,
        subject: row.get("subject")?,
        action: row.get("action")?,
        outcome: row.get("outcome")?,
        message: row.get("message")?,
    })
}

/// Most recent tap attempts, newest first.
pub fn load_taps(conn: &Connection, limit: usize) -> AppResult<Vec<TapLogEntry>> {
    let mut stmt = conn.prepare("SELECT * FROM tap_log ORDER BY id DESC LIMIT ?1")?;
    let rows = stmt.query_map([limit as i64], map_tap)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Mirror a tap into the per-day presence log.
///
/// Tap-ins open a new span; a tap-out closes the latest open span of the day
/// or, when none is open, records an out-only span.
pub fn mirror_presence(
    conn: &Connection,
    who: &Attendee,
    lesson_date: &NaiveDate,
    action: TapAction,
    at: &DateTime<Utc>,
    device: &str,
) -> AppResult<()> {
    let date = lesson_date.format("%Y-%m-%d").to_string();
    let at = to_db_instant(at);
    let now = to_db_instant(&Utc::now());

    if action.is_tap_in() {
        conn.execute(
            "INSERT INTO presence_log
                (student_id, student_name, section, lesson_date, time_in, time_out, from_device, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?7)",
            params![who.student_id, who.student_name, who.section, date, at, device, now],
        )?;
        return Ok(());
    }

    let open: Option<i64> = conn
        .query_row(
            "SELECT id FROM presence_log
             WHERE student_id = ?1 AND lesson_date = ?2 AND time_out IS NULL
             ORDER BY time_in DESC, id DESC
             LIMIT 1",
            params![who.student_id, date],
            |row| row.get(0),
        )
        .optional()?;

    match open {
        Some(id) => {
            conn.execute(
                "UPDATE presence_log SET time_out = ?1, updated_at = ?2 WHERE id = ?3",
                params![at, now, id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO presence_log
                    (student_id, student_name, section, lesson_date, time_in, time_out, from_device, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?7)",
                params![who.student_id, who.student_name, who.section, date, at, device, now],
            )?;
        }
    }
    Ok(())
}

fn map_presence(row: &Row) -> rusqlite::Result<PresenceLogEntry> {
    Ok(PresenceLogEntry {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        student_name: row.get("student_name")?,
        section: row.get("section")?,
        lesson_date: row.get("lesson_date")?,
        time_in: row.get("time_in")?,
        time_out: row.get("time_out")?,
        from_device: row.get("from_device")?,
    })
}

pub fn load_presence(
    conn: &Connection,
    student_id: Option<&str>,
    date: Option<&NaiveDate>,
) -> AppResult<Vec<PresenceLogEntry>> {
    let date = date.map(|d| d.format("%Y-%m-%d").to_string());
    let mut stmt = conn.prepare(
        "SELECT * FROM presence_log
         WHERE (?1 IS NULL OR student_id = ?1)
           AND (?2 IS NULL OR lesson_date = ?2)
         ORDER BY lesson_date ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![student_id, date], map_presence)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
