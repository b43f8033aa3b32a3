use crate::errors::{AppError, AppResult};
use crate::models::schedule::ActiveSession;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

/// Longest accepted grace window (one day).
const MAX_GRACE_MINUTES: i64 = 24 * 60;

/// Per-deployment attendance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Window after session start during which arrival is still on time.
    pub grace: TimeDelta,
    /// Number of unconverted lates that make one absence (K).
    pub late_threshold: u32,
    /// Canonical school timezone.
    pub timezone: FixedOffset,
}

impl Policy {
    pub fn new(grace_minutes: i64, late_threshold: u32, timezone: FixedOffset) -> AppResult<Self> {
        if !(0..=MAX_GRACE_MINUTES).contains(&grace_minutes) {
            return Err(AppError::Config(format!(
                "grace_period_minutes must be between 0 and {MAX_GRACE_MINUTES} (got {grace_minutes})"
            )));
        }
        let grace = TimeDelta::try_minutes(grace_minutes).ok_or_else(|| {
            AppError::Config(format!("grace_period_minutes out of range: {grace_minutes}"))
        })?;
        if late_threshold == 0 {
            return Err(AppError::Config("late_threshold must be at least 1".into()));
        }
        Ok(Self {
            grace,
            late_threshold,
            timezone,
        })
    }

    /// Last instant that still counts as on time for `session`.
    pub fn late_after(&self, session: &ActiveSession) -> DateTime<Utc> {
        session
            .starts_at
            .checked_add_signed(self.grace)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_late(&self, session: &ActiveSession, time_in: &DateTime<Utc>) -> bool {
        *time_in > self.late_after(session)
    }
}
