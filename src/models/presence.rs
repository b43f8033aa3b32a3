use super::attendance::AttendanceRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a student stands for one (subject, day) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// No record yet for the key.
    NotYetArrived,
    /// Inside the class (`time_out` is null).
    Arrived,
    /// Stepped out at `since`; the next tap resumes and books a break.
    OnBreak { since: DateTime<Utc> },
}

impl PresenceState {
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => PresenceState::NotYetArrived,
            Some(r) => match r.time_out {
                None => PresenceState::Arrived,
                Some(since) => PresenceState::OnBreak { since },
            },
        }
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, PresenceState::Arrived)
    }
}

/// Transition applied by a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TapAction {
    Arrive,
    Depart,
    Resume,
}

impl TapAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TapAction::Arrive => "arrive",
            TapAction::Depart => "depart",
            TapAction::Resume => "resume",
        }
    }

    /// Label used in the per-day presence mirror.
    pub fn is_tap_in(&self) -> bool {
        !matches!(self, TapAction::Depart)
    }
}
