// src/export/model.rs

use crate::core::breaks::format_short_duration;
use crate::models::attendance::AttendanceRecord;
use crate::models::summary::StudentSummary;
use crate::utils::time::format_local;
use chrono::FixedOffset;
use serde::Serialize;

/// Flat attendance row; times are rendered in the school timezone and the
/// break ledger is collapsed into a count and a total.
#[derive(Serialize, Clone, Debug)]
pub struct RecordExport {
    pub id: i64,
    pub lesson_date: String,
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub subject: String,
    pub status: String,
    pub late: bool,
    pub left_early: bool,
    pub time_in: String,
    pub time_out: String,
    pub breaks: usize,
    pub total_break: String,
    pub total_break_seconds: i64,
    pub converted_to_absence: bool,
    pub remarks: String,
    pub from_device: String,
}

impl RecordExport {
    pub fn from_record(r: &AttendanceRecord, tz: &FixedOffset) -> Self {
        let local = |t: &Option<chrono::DateTime<chrono::Utc>>| {
            t.as_ref().map(|t| format_local(t, tz)).unwrap_or_default()
        };
        Self {
            id: r.id,
            lesson_date: r.lesson_date_str(),
            student_id: r.student_id.clone(),
            student_name: r.student_name.clone(),
            section: r.section.clone(),
            subject: r.subject.clone(),
            status: r.status.as_str().to_string(),
            late: r.late,
            left_early: r.left_early,
            time_in: local(&r.time_in),
            time_out: local(&r.time_out),
            breaks: r.breaks.len(),
            total_break: format_short_duration(r.total_break_seconds),
            total_break_seconds: r.total_break_seconds,
            converted_to_absence: r.converted_to_absence,
            remarks: r.remarks.clone().unwrap_or_default(),
            from_device: r.from_device.clone(),
        }
    }
}

/// One line of the per-student report.
#[derive(Serialize, Clone, Debug)]
pub struct ReportRowExport {
    pub report: String,
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub total_lates: i64,
    pub total_absences: i64,
}

impl ReportRowExport {
    pub fn from_summary(report: &str, s: &StudentSummary) -> Self {
        Self {
            report: report.to_string(),
            student_id: s.student_id.clone(),
            student_name: s.student_name.clone(),
            section: s.section.clone(),
            total_lates: s.total_lates,
            total_absences: s.total_absences,
        }
    }
}
