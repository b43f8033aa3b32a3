use super::text_conversion_error;
use crate::core::breaks;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{AttendanceRecord, Status};
use crate::models::break_interval::BreakInterval;
use crate::utils::date::parse_date;
use crate::utils::time::{parse_instant, to_db_instant};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

/// Read the stored break ledger. Entries without a `start` are dropped;
/// malformed boundaries are kept as text with no derived duration.
fn parse_breaks(raw: &str) -> Vec<BreakInterval> {
    let items: Vec<Value> = match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("unreadable break ledger {raw:?}: {e}");
            Vec::new()
        }
    };

    let intervals = items
        .iter()
        .filter_map(|v| {
            let start = v.get("start")?.as_str()?;
            let end = v.get("end").and_then(Value::as_str).unwrap_or("");
            Some(BreakInterval::from_raw(start, end))
        })
        .collect();

    breaks::normalize(intervals)
}

fn parse_opt_instant(raw: Option<String>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_instant(&s)
            .map(Some)
            .ok_or_else(|| text_conversion_error(idx, AppError::InvalidTime(s))),
    }
}

pub fn map_row(row: &Row) -> rusqlite::Result<AttendanceRecord> {
    let status_str: String = row.get("status")?;
    let status = Status::from_db_str(&status_str)
        .ok_or_else(|| text_conversion_error(6, AppError::InvalidStatus(status_str.clone())))?;

    let date_str: String = row.get("lesson_date")?;
    let lesson_date = parse_date(&date_str)
        .ok_or_else(|| text_conversion_error(5, AppError::InvalidDate(date_str.clone())))?;

    let breaks_raw: String = row.get("breaks")?;
    let breaks = parse_breaks(&breaks_raw);

    Ok(AttendanceRecord {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        student_name: row.get("student_name")?,
        section: row.get("section")?,
        subject: row.get("subject")?,
        lesson_date,
        status,
        late: row.get::<_, i32>("late")? == 1,
        left_early: row.get::<_, i32>("left_early")? == 1,
        time_in: parse_opt_instant(row.get("time_in")?, 9)?,
        time_out: parse_opt_instant(row.get("time_out")?, 10)?,
        total_break_seconds: breaks::total_seconds(&breaks),
        breaks,
        converted_to_absence: row.get::<_, i32>("converted_to_absence")? == 1,
        remarks: row.get("remarks")?,
        from_device: row.get("from_device")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn date_str(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM attendance WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

pub fn find_by_key(
    conn: &Connection,
    student_id: &str,
    subject: &str,
    lesson_date: &NaiveDate,
) -> AppResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance
         WHERE student_id = ?1 AND subject = ?2 AND lesson_date = ?3",
    )?;
    Ok(stmt
        .query_row(params![student_id, subject, date_str(lesson_date)], map_row)
        .optional()?)
}

/// A stored ledger that is not a JSON array would read back empty; saving
/// over it would erase the history it still holds.
fn ensure_ledger_readable(conn: &Connection, id: i64) -> AppResult<()> {
    let raw: Option<String> = conn
        .query_row("SELECT breaks FROM attendance WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;

    match raw {
        Some(raw) if serde_json::from_str::<Vec<Value>>(&raw).is_err() => Err(
            AppError::Integrity(format!("attendance record #{id} has an unreadable break ledger")),
        ),
        _ => Ok(()),
    }
}

/// Insert (`id == 0`) or update a record. Returns its id.
/// Updating a record whose stored ledger is unreadable fails with `Integrity`.
pub fn save(conn: &Connection, r: &AttendanceRecord) -> AppResult<i64> {
    let now = to_db_instant(&Utc::now());
    let breaks_json = serde_json::to_string(&r.breaks)?;
    let time_in = r.time_in.as_ref().map(to_db_instant);
    let time_out = r.time_out.as_ref().map(to_db_instant);

    if r.id == 0 {
        conn.execute(
            "INSERT INTO attendance
                (student_id, student_name, section, subject, lesson_date, status,
                 late, left_early, time_in, time_out, breaks, total_break_seconds,
                 converted_to_absence, remarks, from_device, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                r.student_id,
                r.student_name,
                r.section,
                r.subject,
                date_str(&r.lesson_date),
                r.status.to_db_str(),
                r.late as i32,
                r.left_early as i32,
                time_in,
                time_out,
                breaks_json,
                r.total_break_seconds,
                r.converted_to_absence as i32,
                r.remarks,
                r.from_device,
                now,
            ],
        )?;
        return Ok(conn.last_insert_rowid());
    }

    ensure_ledger_readable(conn, r.id)?;

    let changed = conn.execute(
        "UPDATE attendance
         SET student_name = ?1, section = ?2, status = ?3, late = ?4, left_early = ?5,
             time_in = ?6, time_out = ?7, breaks = ?8, total_break_seconds = ?9,
             converted_to_absence = ?10, remarks = ?11, from_device = ?12, updated_at = ?13
         WHERE id = ?14",
        params![
            r.student_name,
            r.section,
            r.status.to_db_str(),
            r.late as i32,
            r.left_early as i32,
            time_in,
            time_out,
            breaks_json,
            r.total_break_seconds,
            r.converted_to_absence as i32,
            r.remarks,
            r.from_device,
            now,
            r.id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::NotFound(format!("attendance record #{}", r.id)));
    }
    Ok(r.id)
}

/// Selection used by listings, reports and exports.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub student_id: Option<String>,
    pub section: Option<String>,
    /// Case-insensitive substring of the subject.
    pub subject: Option<String>,
    /// Inclusive lesson date bounds.
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

pub fn list(conn: &Connection, f: &RecordFilter) -> AppResult<Vec<AttendanceRecord>> {
    let (from, to) = match &f.dates {
        Some((a, b)) => (Some(date_str(a)), Some(date_str(b))),
        None => (None, None),
    };

    let mut stmt = conn.prepare(
        "SELECT * FROM attendance
         WHERE (?1 IS NULL OR student_id = ?1)
           AND (?2 IS NULL OR section = ?2)
           AND (?3 IS NULL OR instr(lower(subject), lower(?3)) > 0)
           AND (?4 IS NULL OR lesson_date >= ?4)
           AND (?5 IS NULL OR lesson_date <= ?5)
         ORDER BY lesson_date ASC, section ASC, student_name ASC, subject ASC, id ASC",
    )?;
    let rows = stmt.query_map(
        params![f.student_id, f.section, f.subject, from, to],
        map_row,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Unconverted late records of one student in one subject, oldest first.
pub fn unconverted_lates(
    conn: &Connection,
    student_id: &str,
    subject: &str,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance
         WHERE student_id = ?1 AND subject = ?2
           AND late = 1 AND converted_to_absence = 0
         ORDER BY lesson_date ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![student_id, subject], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Mark one record of a late batch as consumed. Only touches records that
/// are still unconverted; returns whether the row changed.
pub fn mark_converted(
    conn: &Connection,
    id: i64,
    to_absent: bool,
    remark: Option<&str>,
) -> AppResult<bool> {
    let now = to_db_instant(&Utc::now());
    let changed = if to_absent {
        conn.execute(
            "UPDATE attendance
             SET converted_to_absence = 1, late = 0, status = 'Absent',
                 remarks = ?1, updated_at = ?2
             WHERE id = ?3 AND converted_to_absence = 0",
            params![remark, now, id],
        )?
    } else {
        conn.execute(
            "UPDATE attendance
             SET converted_to_absence = 1, late = 0, updated_at = ?1
             WHERE id = ?2 AND converted_to_absence = 0",
            params![now, id],
        )?
    };
    Ok(changed == 1)
}

/// Rewrite the derived flags of a stored record.
pub fn update_flags(
    conn: &Connection,
    id: i64,
    status: Status,
    late: bool,
    left_early: bool,
) -> AppResult<()> {
    conn.execute(
        "UPDATE attendance
         SET status = ?1, late = ?2, left_early = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            status.to_db_str(),
            late as i32,
            left_early as i32,
            to_db_instant(&Utc::now()),
            id
        ],
    )?;
    Ok(())
}

/// Carry a directory edit over to the records already stamped with the
/// student's identity.
pub fn rename_student(
    conn: &Connection,
    old_id: &str,
    new_id: &str,
    name: &str,
    section: &str,
) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE attendance
         SET student_id = ?1, student_name = ?2, section = ?3, updated_at = ?4
         WHERE student_id = ?5",
        params![new_id, name, section, to_db_instant(&Utc::now()), old_id],
    )?;
    Ok(n)
}
