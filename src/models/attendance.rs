use super::break_interval::BreakInterval;
use super::presence::PresenceState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Present,
    Late,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Late => "Late",
            Status::Absent => "Absent",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.as_str()
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(Status::Present),
            "Late" => Some(Status::Late),
            "Absent" => Some(Status::Absent),
            _ => None,
        }
    }
}

/// Per-subject, per-day attendance of one student.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: i64, // 0 until persisted
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub subject: String,
    pub lesson_date: NaiveDate,
    pub status: Status,
    pub late: bool,
    pub left_early: bool,
    pub time_in: Option<DateTime<Utc>>,
    pub time_out: Option<DateTime<Utc>>,
    pub breaks: Vec<BreakInterval>,
    pub total_break_seconds: i64,
    pub converted_to_absence: bool,
    pub remarks: Option<String>,
    pub from_device: String,
    pub created_at: String,
    pub updated_at: String,
}

impl AttendanceRecord {
    pub fn presence(&self) -> PresenceState {
        PresenceState::of(Some(self))
    }

    pub fn lesson_date_str(&self) -> String {
        self.lesson_date.format("%Y-%m-%d").to_string()
    }
}
