#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, FixedOffset, NaiveTime, Utc, Weekday};
use rollcall::config::Config;
use rollcall::core::policy::Policy;
use rollcall::db::pool::DbPool;
use rollcall::db::queries::schedules;
use rollcall::db::queries::students::{self, NewStudent};
use rollcall::models::schedule::{Scope, SessionDefinition};
use rollcall::models::student::Student;
use rollcall::utils::time::parse_instant;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rc() -> Command {
    cargo_bin_cmd!("rollcall")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rollcall.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Initialize a DB through the CLI and register one student with a Monday
/// 07:30–09:00 "MATH 101" session (school timezone +08:00).
pub fn init_db_with_class(db_path: &str) {
    rc().args(["--db", db_path, "--test", "init"])
        .assert()
        .success();

    rc().args([
        "--db", db_path, "student", "add", "--no", "S-001", "--first", "Ada", "--last",
        "Lovelace", "--section", "10-A", "--badge", "BADGE-1",
    ])
    .assert()
    .success();

    rc().args([
        "--db", db_path, "schedule", "add", "--section", "10-A", "--day", "Mon", "--start",
        "07:30", "--end", "09:00", "--subject", "MATH 101",
    ])
    .assert()
    .success();
}

// ---------------------------------------------------------------------------
// Library-level helpers (in-memory database, UTC school timezone)
// ---------------------------------------------------------------------------

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("utc offset")
}

pub fn policy() -> Policy {
    Policy::new(10, 3, utc()).expect("policy")
}

pub fn utc_config() -> Config {
    Config {
        database: ":memory:".to_string(),
        timezone: "+00:00".to_string(),
        ..Config::default()
    }
}

pub fn memory_pool() -> DbPool {
    DbPool::in_memory().expect("in-memory db")
}

pub fn at(s: &str) -> DateTime<Utc> {
    parse_instant(s).unwrap_or_else(|| panic!("bad instant {s}"))
}

pub fn hm(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("time")
}

pub fn add_student(pool: &DbPool, no: Option<&str>, name: &str, section: &str, badge: &str) -> Student {
    let (first, last) = name.split_once(' ').unwrap_or((name, ""));
    students::insert(
        &pool.conn,
        &NewStudent {
            student_no: no,
            first_name: first,
            last_name: last,
            section,
            badge_tag: badge,
        },
    )
    .expect("insert student")
}

pub fn definition(scope: Scope, day: Weekday, start: &str, end: &str, subject: &str) -> SessionDefinition {
    SessionDefinition {
        id: 0,
        scope,
        weekday: day,
        start: hm(start),
        end: hm(end),
        subject: subject.to_string(),
        room: None,
    }
}

pub fn add_section_session(
    pool: &DbPool,
    section: &str,
    day: Weekday,
    start: &str,
    end: &str,
    subject: &str,
) -> i64 {
    let def = definition(Scope::Section(section.to_string()), day, start, end, subject);
    schedules::insert(&pool.conn, &def).expect("insert schedule")
}
