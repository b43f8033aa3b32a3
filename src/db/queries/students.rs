use super::map_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::models::student::Student;
use crate::utils::time::to_db_instant;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Fields accepted when registering a student.
pub struct NewStudent<'a> {
    pub student_no: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub section: &'a str,
    pub badge_tag: &'a str,
}

pub fn map_row(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        student_no: row.get("student_no")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        section: row.get("section")?,
        badge_tag: row.get("badge_tag")?,
        is_active: row.get::<_, i32>("is_active")? == 1,
        created_at: row.get("created_at")?,
    })
}

pub fn insert(conn: &Connection, s: &NewStudent) -> AppResult<Student> {
    conn.execute(
        "INSERT INTO students (student_no, first_name, last_name, section, badge_tag, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        params![
            s.student_no,
            s.first_name.trim(),
            s.last_name.trim(),
            s.section.trim(),
            s.badge_tag.trim(),
            to_db_instant(&Utc::now()),
        ],
    )
    .map_err(|e| {
        map_unique_violation(e, || {
            format!(
                "badge '{}' or student number '{}' is already registered",
                s.badge_tag,
                s.student_no.unwrap_or("-")
            )
        })
    })?;

    find_by_id(conn, conn.last_insert_rowid())?
        .ok_or_else(|| AppError::Other("inserted student vanished".into()))
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<Student>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM students WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Directory lookup used by the tap ingress. Inactive students do not match.
pub fn find_by_badge(conn: &Connection, badge_tag: &str) -> AppResult<Option<Student>> {
    let mut stmt = conn
        .prepare_cached("SELECT * FROM students WHERE badge_tag = ?1 AND is_active = 1")?;
    Ok(stmt.query_row([badge_tag.trim()], map_row).optional()?)
}

pub fn find_by_no(conn: &Connection, student_no: &str) -> AppResult<Option<Student>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM students WHERE student_no = ?1")?;
    Ok(stmt.query_row([student_no.trim()], map_row).optional()?)
}

pub fn list(conn: &Connection, section: Option<&str>) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM students
         WHERE (?1 IS NULL OR section = ?1)
         ORDER BY section ASC, last_name ASC, first_name ASC",
    )?;
    let rows = stmt.query_map([section], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Persist every mutable column of `s` (matched by internal id).
pub fn update(conn: &Connection, s: &Student) -> AppResult<()> {
    let changed = conn
        .execute(
            "UPDATE students
             SET student_no = ?1, first_name = ?2, last_name = ?3,
                 section = ?4, badge_tag = ?5, is_active = ?6
             WHERE id = ?7",
            params![
                s.student_no,
                s.first_name,
                s.last_name,
                s.section,
                s.badge_tag,
                if s.is_active { 1 } else { 0 },
                s.id,
            ],
        )
        .map_err(|e| {
            map_unique_violation(e, || {
                format!("badge '{}' or student number is already taken", s.badge_tag)
            })
        })?;

    if changed == 0 {
        return Err(AppError::NotFound(format!("student #{}", s.id)));
    }
    Ok(())
}
