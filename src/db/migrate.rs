//! Schema migrations.
//!
//! Every step runs at most once: applied versions are recorded in the `log`
//! table as `migration_applied` rows, and each step runs in its own
//! transaction so a failure leaves the version unmarked.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20251001_0001_create_students",
        description: "Created students directory",
        sql: r#"
        CREATE TABLE IF NOT EXISTS students (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            student_no  TEXT UNIQUE,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            section     TEXT NOT NULL,
            badge_tag   TEXT NOT NULL UNIQUE,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_students_section ON students(section);
        "#,
    },
    Migration {
        version: "20251001_0002_create_schedules",
        description: "Created schedules timetable",
        sql: r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            scope_kind  TEXT NOT NULL CHECK(scope_kind IN ('section','student')),
            scope       TEXT NOT NULL,
            weekday     TEXT NOT NULL CHECK(weekday IN ('Mon','Tue','Wed','Thu','Fri','Sat','Sun')),
            start_time  TEXT NOT NULL,
            end_time    TEXT NOT NULL,
            subject     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_schedules_scope_day ON schedules(scope_kind, scope, weekday);
        "#,
    },
    Migration {
        version: "20251001_0003_create_attendance",
        description: "Created attendance records",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id            TEXT NOT NULL,
            student_name          TEXT NOT NULL,
            section               TEXT NOT NULL,
            subject               TEXT NOT NULL,
            lesson_date           TEXT NOT NULL,
            status                TEXT NOT NULL CHECK(status IN ('Present','Late','Absent')),
            late                  INTEGER NOT NULL DEFAULT 0,
            left_early            INTEGER NOT NULL DEFAULT 0,
            time_in               TEXT,
            time_out              TEXT,
            breaks                TEXT NOT NULL DEFAULT '[]',
            total_break_seconds   INTEGER NOT NULL DEFAULT 0,
            converted_to_absence  INTEGER NOT NULL DEFAULT 0,
            remarks               TEXT,
            from_device           TEXT NOT NULL DEFAULT 'rfid',
            created_at            TEXT NOT NULL,
            updated_at            TEXT NOT NULL,
            UNIQUE(student_id, subject, lesson_date)
        );
        CREATE INDEX IF NOT EXISTS idx_attendance_section_subject_date
            ON attendance(section, subject, lesson_date);
        CREATE INDEX IF NOT EXISTS idx_attendance_conversion
            ON attendance(student_id, subject, late, converted_to_absence);
        "#,
    },
    Migration {
        version: "20251001_0004_create_tap_logs",
        description: "Created tap_log and presence_log",
        sql: r#"
        CREATE TABLE IF NOT EXISTS tap_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            at          TEXT NOT NULL,
            badge_tag   TEXT NOT NULL,
            student_id  TEXT,
            subject     TEXT,
            action      TEXT,
            outcome     TEXT NOT NULL CHECK(outcome IN ('accepted','rejected')),
            message     TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE IF NOT EXISTS presence_log (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id    TEXT NOT NULL,
            student_name  TEXT NOT NULL,
            section       TEXT NOT NULL,
            lesson_date   TEXT NOT NULL,
            time_in       TEXT,
            time_out      TEXT,
            from_device   TEXT NOT NULL DEFAULT 'rfid',
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_presence_student_date ON presence_log(student_id, lesson_date);
        "#,
    },
    Migration {
        version: "20251014_0005_add_schedule_room",
        description: "Added room column to schedules",
        sql: "ALTER TABLE schedules ADD COLUMN room TEXT;",
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;

    tx.commit()?;
    Ok(())
}

/// Public entry point: run all pending migrations.
/// Returns the number of steps applied.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        log::info!("migration applied: {} ({})", m.version, m.description);
        applied += 1;
    }

    Ok(applied)
}
