use serde::Serialize;

/// Intermediate aggregation row: one student, one subject code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectTally {
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub subject_code: String,
    pub lates_per_subject: i64,
    pub absences_per_subject: i64,
    pub extra_absences_from_lates: i64,
    pub residual_lates: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub total_lates: i64,
    pub total_absences: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub report_details: String,
    pub student_summaries: Vec<StudentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_subject: Option<Vec<SubjectTally>>,
}
