use crate::utils::time::parse_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a record's break ledger.
///
/// Boundaries keep the stored text so that a malformed value read back from
/// the database never poisons the whole record; the derived fields are simply
/// absent in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInterval {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl BreakInterval {
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start)
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.end)
    }
}
