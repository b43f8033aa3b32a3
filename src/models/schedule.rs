use crate::utils::date::weekday_code;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc, Weekday};
use serde::Serialize;

/// Who a session definition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Scope {
    Section(String),
    /// Canonical student identifier.
    Student(String),
}

impl Scope {
    pub fn kind(&self) -> &'static str {
        match self {
            Scope::Section(_) => "section",
            Scope::Student(_) => "student",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Scope::Section(v) | Scope::Student(v) => v,
        }
    }

    pub fn from_db(kind: &str, value: String) -> Option<Self> {
        match kind {
            "section" => Some(Scope::Section(value)),
            "student" => Some(Scope::Student(value)),
            _ => None,
        }
    }
}

/// Weekly timetable entry. Boundaries are time-of-day in the canonical
/// timezone; `end < start` marks an overnight session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDefinition {
    pub id: i64,
    pub scope: Scope,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub subject: String,
    pub room: Option<String>,
}

impl SessionDefinition {
    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    pub fn day_code(&self) -> &'static str {
        weekday_code(self.weekday)
    }

    /// Concrete occurrence of this session starting on `date`.
    pub fn anchored_on(&self, date: NaiveDate, tz: &FixedOffset) -> Option<ActiveSession> {
        let end_date = if self.is_overnight() {
            date.checked_add_signed(TimeDelta::days(1))?
        } else {
            date
        };

        let starts_at = tz
            .from_local_datetime(&date.and_time(self.start))
            .single()?
            .with_timezone(&Utc);
        let ends_at = tz
            .from_local_datetime(&end_date.and_time(self.end))
            .single()?
            .with_timezone(&Utc);

        Some(ActiveSession {
            definition: self.clone(),
            lesson_date: date,
            starts_at,
            ends_at,
        })
    }
}

/// A session definition pinned to absolute instants.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    pub definition: SessionDefinition,
    /// Date the session started on; keys the attendance record.
    pub lesson_date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn subject(&self) -> &str {
        &self.definition.subject
    }

    /// Half-open: active from `starts_at` up to, not including, `ends_at`.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.starts_at <= *at && *at < self.ends_at
    }
}
