use serde::Serialize;

/// Raw audit entry, one per tap attempt (accepted or rejected).
#[derive(Debug, Clone, Serialize)]
pub struct TapLogEntry {
    pub id: i64,
    pub at: String,
    pub badge_tag: String,
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub action: Option<String>,
    pub outcome: String,
    pub message: String,
}

/// Per-student, per-day in/out span (subject agnostic).
#[derive(Debug, Clone, Serialize)]
pub struct PresenceLogEntry {
    pub id: i64,
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub lesson_date: String,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub from_device: String,
}
