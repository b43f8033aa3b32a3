use chrono::{NaiveDate, Weekday};
use rollcall::core::resolver::{resolve, resolve_for, scopes_for};
use rollcall::models::schedule::Scope;
use rollcall::utils::time::parse_time_of_day;

mod common;
use common::{add_section_session, at, definition, hm, memory_pool, utc};

fn section(s: &str) -> Scope {
    Scope::Section(s.to_string())
}

// 2025-10-06 is a Monday.

#[test]
fn active_session_matches_weekday_and_half_open_window() {
    let defs = vec![definition(section("10-A"), Weekday::Mon, "07:30", "09:00", "MATH 101")];
    let scopes = vec![section("10-A")];

    let s = resolve(&defs, &scopes, &at("2025-10-06T07:30:00Z"), &utc()).expect("active");
    assert_eq!(s.subject(), "MATH 101");
    assert_eq!(s.lesson_date, NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());

    assert!(resolve(&defs, &scopes, &at("2025-10-06T08:59:59Z"), &utc()).is_some());
    assert!(resolve(&defs, &scopes, &at("2025-10-06T09:00:00Z"), &utc()).is_none());
    assert!(resolve(&defs, &scopes, &at("2025-10-06T07:29:59Z"), &utc()).is_none());
    // Same time on a Tuesday
    assert!(resolve(&defs, &scopes, &at("2025-10-07T08:00:00Z"), &utc()).is_none());
}

#[test]
fn overnight_session_spans_midnight() {
    let defs = vec![definition(section("N-1"), Weekday::Mon, "23:00", "01:00", "NIGHT LAB")];
    let scopes = vec![section("N-1")];

    let late_evening = resolve(&defs, &scopes, &at("2025-10-06T23:30:00Z"), &utc()).expect("23:30");
    let after_midnight = resolve(&defs, &scopes, &at("2025-10-07T00:30:00Z"), &utc()).expect("00:30");

    // Both belong to the lesson that started on Monday.
    let monday = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
    assert_eq!(late_evening.lesson_date, monday);
    assert_eq!(after_midnight.lesson_date, monday);
    assert_eq!(after_midnight.ends_at, at("2025-10-07T01:00:00Z"));

    assert!(resolve(&defs, &scopes, &at("2025-10-06T12:00:00Z"), &utc()).is_none());
    assert!(resolve(&defs, &scopes, &at("2025-10-07T01:00:00Z"), &utc()).is_none());
}

#[test]
fn scope_filters_out_other_sections_and_includes_personal_sessions() {
    let defs = vec![
        definition(section("10-B"), Weekday::Mon, "07:30", "09:00", "HIST 1"),
        definition(Scope::Student("S-001".into()), Weekday::Mon, "07:30", "09:00", "TUTORING"),
    ];

    let scopes = scopes_for("10-A", "S-001");
    let s = resolve(&defs, &scopes, &at("2025-10-06T08:00:00Z"), &utc()).expect("personal");
    assert_eq!(s.subject(), "TUTORING");

    let other = scopes_for("10-A", "S-002");
    assert!(resolve(&defs, &other, &at("2025-10-06T08:00:00Z"), &utc()).is_none());
}

#[test]
fn overlapping_definitions_resolve_to_the_first_one() {
    let defs = vec![
        definition(section("10-A"), Weekday::Mon, "07:30", "09:00", "MATH 101"),
        definition(section("10-A"), Weekday::Mon, "08:00", "10:00", "PHYS 201"),
    ];
    let s = resolve(&defs, &[section("10-A")], &at("2025-10-06T08:30:00Z"), &utc()).unwrap();
    assert_eq!(s.subject(), "MATH 101");
}

#[test]
fn weekday_and_date_follow_the_school_timezone() {
    let plus8 = chrono::FixedOffset::east_opt(8 * 3600).unwrap();
    let defs = vec![definition(section("10-A"), Weekday::Mon, "07:30", "09:00", "MATH 101")];

    // Sunday 23:45 UTC is Monday 07:45 at +08:00.
    let s = resolve(&defs, &[section("10-A")], &at("2025-10-05T23:45:00Z"), &plus8).expect("monday");
    assert_eq!(s.lesson_date, NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
    assert_eq!(s.starts_at, at("2025-10-05T23:30:00Z"));
}

#[test]
fn datetime_boundaries_are_reduced_to_time_of_day() {
    let plus8 = chrono::FixedOffset::east_opt(8 * 3600).unwrap();

    assert_eq!(parse_time_of_day("07:30", &plus8).unwrap(), hm("07:30"));
    assert_eq!(parse_time_of_day("2020-01-01 07:30:00", &plus8).unwrap(), hm("07:30"));
    assert_eq!(parse_time_of_day("2020-01-01T07:30:00+08:00", &plus8).unwrap(), hm("07:30"));
    // Offset-carrying values are shifted into the school timezone first.
    assert_eq!(parse_time_of_day("2020-01-01T00:00:00Z", &plus8).unwrap(), hm("08:00"));
    assert!(parse_time_of_day("half past seven", &plus8).is_err());
}

#[test]
fn resolve_for_reads_the_timetable_store() {
    let pool = memory_pool();
    add_section_session(&pool, "N-1", Weekday::Sun, "23:00", "01:00", "NIGHT LAB");
    add_section_session(&pool, "N-1", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let scopes = scopes_for("N-1", "S-009");

    // Monday 00:30 UTC falls into Sunday's overnight session.
    let s = resolve_for(&pool.conn, &scopes, &at("2025-10-06T00:30:00Z"), &utc())
        .unwrap()
        .expect("overnight");
    assert_eq!(s.subject(), "NIGHT LAB");
    assert_eq!(s.lesson_date, NaiveDate::from_ymd_opt(2025, 10, 5).unwrap());

    let s = resolve_for(&pool.conn, &scopes, &at("2025-10-06T08:00:00Z"), &utc())
        .unwrap()
        .expect("morning");
    assert_eq!(s.subject(), "MATH 101");

    assert!(
        resolve_for(&pool.conn, &scopes, &at("2025-10-06T12:00:00Z"), &utc())
            .unwrap()
            .is_none()
    );
}
