use chrono::{NaiveDate, Utc};
use rollcall::core::report::{
    ReportFilter, fold, report_details, section_totals, subject_code, summarize, tally,
};
use rollcall::db::queries::attendance;
use rollcall::models::attendance::{AttendanceRecord, Status};

mod common;
use common::memory_pool;

fn record(student: &str, name: &str, subject: &str, day: u32, late: bool, status: Status) -> AttendanceRecord {
    AttendanceRecord {
        id: 0,
        student_id: student.to_string(),
        student_name: name.to_string(),
        section: "10-A".to_string(),
        subject: subject.to_string(),
        lesson_date: NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
        status,
        late,
        left_early: false,
        time_in: Some(Utc::now()),
        time_out: None,
        breaks: Vec::new(),
        total_break_seconds: 0,
        converted_to_absence: false,
        remarks: None,
        from_device: "rfid".to_string(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

#[test]
fn five_lates_and_one_absence_fold_with_threshold_three() {
    let mut records: Vec<_> = (1..=5)
        .map(|d| record("S-001", "Ada Lovelace", "MATH 101", d, true, Status::Late))
        .collect();
    records.push(record("S-001", "Ada Lovelace", "MATH 101", 6, false, Status::Absent));

    let tallies = tally(&records, 3);
    assert_eq!(tallies.len(), 1);
    let t = &tallies[0];
    assert_eq!(t.lates_per_subject, 5);
    assert_eq!(t.absences_per_subject, 1);
    assert_eq!(t.extra_absences_from_lates, 1);
    assert_eq!(t.residual_lates, 2);

    let totals = fold(&tallies);
    assert_eq!(totals[0].total_lates, 2);
    assert_eq!(totals[0].total_absences, 2);
}

#[test]
fn subject_labels_sharing_a_code_are_grouped() {
    assert_eq!(subject_code("MATH 101 Lecture"), "MATH");
    assert_eq!(subject_code("  PE  "), "PE");

    let records = vec![
        record("S-001", "Ada Lovelace", "MATH 101 Lecture", 1, true, Status::Late),
        record("S-001", "Ada Lovelace", "MATH 101 Lab", 2, true, Status::Late),
        record("S-001", "Ada Lovelace", "MATH 101", 3, true, Status::Late),
        record("S-001", "Ada Lovelace", "PHYS 2", 3, true, Status::Late),
    ];
    let tallies = tally(&records, 3);
    assert_eq!(tallies.len(), 2);
    assert_eq!(tallies[0].subject_code, "MATH");
    assert_eq!(tallies[0].extra_absences_from_lates, 1);

    let totals = fold(&tallies);
    assert_eq!(totals[0].total_absences, 1);
    // Lates of different subjects are not pooled.
    assert_eq!(totals[0].total_lates, 1);
}

#[test]
fn students_are_sorted_by_name_with_stable_ties() {
    let records = vec![
        record("S-003", "Zed Zulu", "MATH 1", 1, true, Status::Late),
        record("S-002", "Bob Brown", "MATH 1", 1, false, Status::Present),
        record("S-009", "Bob Brown", "MATH 1", 1, true, Status::Late),
        record("S-001", "Ada Lovelace", "MATH 1", 1, false, Status::Absent),
    ];
    let ids: Vec<String> = fold(&tally(&records, 3))
        .into_iter()
        .map(|s| s.student_id)
        .collect();
    assert_eq!(ids, vec!["S-001", "S-002", "S-009", "S-003"]);
}

#[test]
fn summarize_and_section_totals_read_the_store() {
    let pool = memory_pool();
    let mut rows: Vec<_> = (1..=4)
        .map(|d| record("S-001", "Ada Lovelace", "MATH 101", d, true, Status::Late))
        .collect();
    rows.push(record("S-002", "Bob Brown", "MATH 101", 1, false, Status::Absent));
    let mut other = record("S-003", "Cy Other", "MATH 101", 1, true, Status::Late);
    other.section = "10-B".into();
    rows.push(other);

    for r in &rows {
        attendance::save(&pool.conn, r).unwrap();
    }

    let filter = ReportFilter {
        section: Some("10-A".into()),
        subject: Some("math".into()),
        dates: None,
    };
    let rep = summarize(&pool.conn, &filter, 3, true).unwrap();
    assert_eq!(
        rep.report_details,
        "Attendance Summary for Subject for Section: 10-A math"
    );
    assert_eq!(rep.student_summaries.len(), 2);
    assert_eq!(rep.student_summaries[0].student_id, "S-001");
    assert_eq!(rep.student_summaries[0].total_lates, 1);
    assert_eq!(rep.student_summaries[0].total_absences, 1);
    assert_eq!(rep.per_subject.as_ref().map(Vec::len), Some(2));

    let raw = section_totals(&pool.conn, "10-A").unwrap();
    assert_eq!(raw.report_details, "Totals per student for Section: 10-A");
    assert_eq!(raw.student_summaries[0].total_lates, 4);
    assert_eq!(raw.student_summaries[1].total_absences, 1);
    assert!(raw.per_subject.is_none());
}

#[test]
fn details_describe_the_filter() {
    assert_eq!(report_details(&ReportFilter::default()), "Overall Attendance Summary");

    let d = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
    let filter = ReportFilter {
        dates: Some((d, d)),
        ..ReportFilter::default()
    };
    assert_eq!(report_details(&filter), "Overall Attendance Summary (2025-10-06)");
}
