use crate::errors::{AppError, AppResult};
use serde::Serialize;

/// Directory entry of a student (people are referenced, not owned, by attendance).
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: i64,
    pub student_no: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub section: String,
    pub badge_tag: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Identity stamped on attendance records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub student_id: String,
    pub student_name: String,
    pub section: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Canonical identifier used to key attendance records.
    ///
    /// The external student number wins. Without it the internal id is only
    /// acceptable when `require_student_no` is off: mixing both forms for the
    /// same person would split their records in two.
    pub fn canonical_id(&self, require_student_no: bool) -> AppResult<String> {
        match self.student_no.as_deref().map(str::trim) {
            Some(no) if !no.is_empty() => Ok(no.to_string()),
            _ if require_student_no => Err(AppError::Integrity(format!(
                "student #{} ({}) has no student number",
                self.id,
                self.full_name()
            ))),
            _ => Ok(format!("#{}", self.id)),
        }
    }

    pub fn attendee(&self, require_student_no: bool) -> AppResult<Attendee> {
        Ok(Attendee {
            student_id: self.canonical_id(require_student_no)?,
            student_name: self.full_name(),
            section: self.section.clone(),
        })
    }
}
