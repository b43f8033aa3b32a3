//! Aggregation reporter (read-only).
//!
//! Records are grouped per (student, subject code), lates are folded into
//! absences with the same threshold the converter applies, and the
//! per-subject rows are summed per student.

use crate::db::queries::attendance::{self, RecordFilter};
use crate::errors::AppResult;
use crate::models::attendance::{AttendanceRecord, Status};
use crate::models::summary::{AttendanceReport, StudentSummary, SubjectTally};
use chrono::NaiveDate;
use rusqlite::Connection;

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub section: Option<String>,
    pub subject: Option<String>,
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

/// Leading token of a subject label: "MATH 101 Lecture" → "MATH".
pub fn subject_code(subject: &str) -> &str {
    subject.split_whitespace().next().unwrap_or("")
}

fn same_student(a: &SubjectTally, r: &AttendanceRecord) -> bool {
    a.student_id == r.student_id && a.student_name == r.student_name && a.section == r.section
}

/// Per-(student, subject code) counts, in first-seen order.
pub fn tally(records: &[AttendanceRecord], threshold: u32) -> Vec<SubjectTally> {
    let k = i64::from(threshold.max(1));
    let mut rows: Vec<SubjectTally> = Vec::new();

    for r in records {
        let code = subject_code(&r.subject);
        let idx = match rows
            .iter()
            .position(|t| same_student(t, r) && t.subject_code == code)
        {
            Some(i) => i,
            None => {
                rows.push(SubjectTally {
                    student_id: r.student_id.clone(),
                    student_name: r.student_name.clone(),
                    section: r.section.clone(),
                    subject_code: code.to_string(),
                    lates_per_subject: 0,
                    absences_per_subject: 0,
                    extra_absences_from_lates: 0,
                    residual_lates: 0,
                });
                rows.len() - 1
            }
        };

        let row = &mut rows[idx];
        if r.late {
            row.lates_per_subject += 1;
        }
        if r.status == Status::Absent {
            row.absences_per_subject += 1;
        }
    }

    for row in &mut rows {
        row.extra_absences_from_lates = row.lates_per_subject / k;
        row.residual_lates = row.lates_per_subject % k;
    }
    rows
}

/// Fold per-subject rows into per-student totals, sorted by name (stable).
pub fn fold(tallies: &[SubjectTally]) -> Vec<StudentSummary> {
    let mut out: Vec<StudentSummary> = Vec::new();

    for t in tallies {
        let pos = out.iter().position(|s| {
            s.student_id == t.student_id
                && s.student_name == t.student_name
                && s.section == t.section
        });
        let s = match pos {
            Some(i) => &mut out[i],
            None => {
                out.push(StudentSummary {
                    student_id: t.student_id.clone(),
                    student_name: t.student_name.clone(),
                    section: t.section.clone(),
                    total_lates: 0,
                    total_absences: 0,
                });
                let last = out.len() - 1;
                &mut out[last]
            }
        };
        s.total_lates += t.residual_lates;
        s.total_absences += t.absences_per_subject + t.extra_absences_from_lates;
    }

    out.sort_by(|a, b| a.student_name.cmp(&b.student_name));
    out
}

pub fn report_details(filter: &ReportFilter) -> String {
    let mut details = match &filter.section {
        Some(s) => format!("Attendance Summary for Section: {s}"),
        None => "Overall Attendance Summary".to_string(),
    };
    if let Some(subject) = &filter.subject {
        details = format!(
            "{} {}",
            details.replace("Summary", "Summary for Subject"),
            subject
        );
    }
    if let Some((from, to)) = filter.dates {
        if from == to {
            details.push_str(&format!(" ({from})"));
        } else {
            details.push_str(&format!(" ({from} to {to})"));
        }
    }
    details.trim().to_string()
}

pub fn summarize(
    conn: &Connection,
    filter: &ReportFilter,
    threshold: u32,
    per_subject: bool,
) -> AppResult<AttendanceReport> {
    let records = attendance::list(
        conn,
        &RecordFilter {
            student_id: None,
            section: filter.section.clone(),
            subject: filter.subject.clone(),
            dates: filter.dates,
        },
    )?;

    let tallies = tally(&records, threshold);
    let student_summaries = fold(&tallies);

    Ok(AttendanceReport {
        report_details: report_details(filter),
        student_summaries,
        per_subject: per_subject.then_some(tallies),
    })
}

/// Raw per-student totals of one section: lates from flags, absences from
/// status, no folding.
pub fn section_totals(conn: &Connection, section: &str) -> AppResult<AttendanceReport> {
    let records = attendance::list(
        conn,
        &RecordFilter {
            section: Some(section.to_string()),
            ..RecordFilter::default()
        },
    )?;

    let mut out: Vec<StudentSummary> = Vec::new();
    for r in &records {
        let pos = out.iter().position(|s| {
            s.student_id == r.student_id && s.student_name == r.student_name
        });
        let s = match pos {
            Some(i) => &mut out[i],
            None => {
                out.push(StudentSummary {
                    student_id: r.student_id.clone(),
                    student_name: r.student_name.clone(),
                    section: r.section.clone(),
                    total_lates: 0,
                    total_absences: 0,
                });
                let last = out.len() - 1;
                &mut out[last]
            }
        };
        if r.late {
            s.total_lates += 1;
        }
        if r.status == Status::Absent {
            s.total_absences += 1;
        }
    }
    out.sort_by(|a, b| a.student_name.cmp(&b.student_name));

    Ok(AttendanceReport {
        report_details: format!("Totals per student for Section: {section}"),
        student_summaries: out,
        per_subject: None,
    })
}
