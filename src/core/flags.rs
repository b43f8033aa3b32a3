//! Flag & status engine.
//!
//! Derived flags are a pure function of the record's times and its session,
//! so the engine can be re-run at any point (after a tap, after a backfill,
//! or over the whole store) and converges after one pass.

use crate::config::Config;
use crate::core::convert;
use crate::core::policy::Policy;
use crate::core::resolver::scopes_for;
use crate::db::audit::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{attendance, schedules};
use crate::db::queries::attendance::RecordFilter;
use crate::errors::AppResult;
use crate::models::attendance::{AttendanceRecord, Status};
use crate::models::schedule::ActiveSession;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Flags the engine would assign to `record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub status: Status,
    pub late: bool,
    pub left_early: bool,
}

impl Flags {
    pub fn of(record: &AttendanceRecord) -> Self {
        Self {
            status: record.status,
            late: record.late,
            left_early: record.left_early,
        }
    }
}

pub fn evaluate(record: &AttendanceRecord, session: &ActiveSession, policy: &Policy) -> Flags {
    // Records consumed by the converter never count as late again.
    let late = !record.converted_to_absence
        && record
            .time_in
            .as_ref()
            .is_some_and(|t| policy.is_late(session, t));

    // Converted batches keep the status the converter left them with.
    let status = match record.status {
        Status::Absent => Status::Absent,
        s if record.converted_to_absence => s,
        _ if late => Status::Late,
        _ => Status::Present,
    };

    let left_early = record
        .time_out
        .as_ref()
        .is_some_and(|t| *t < session.ends_at);

    Flags {
        status,
        late,
        left_early,
    }
}

/// Apply the engine to `record` in place. Returns whether anything changed.
pub fn recompute(record: &mut AttendanceRecord, session: &ActiveSession, policy: &Policy) -> bool {
    let next = evaluate(record, session, policy);
    if next == Flags::of(record) {
        return false;
    }
    record.status = next.status;
    record.late = next.late;
    record.left_early = next.left_early;
    true
}

/// Result of a bulk recompute over stored records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub scanned: usize,
    pub updated: usize,
    /// Records whose session definition no longer exists.
    pub orphaned: usize,
    /// (student, subject) pairs for which the converter produced a batch.
    pub converted: usize,
}

/// Re-run the engine over stored records, then the converter for every
/// (student, subject) touched.
pub fn recompute_stored(
    pool: &mut DbPool,
    cfg: &Config,
    dates: Option<(NaiveDate, NaiveDate)>,
) -> AppResult<RecomputeSummary> {
    let policy = cfg.policy()?;
    let filter = RecordFilter {
        dates,
        ..RecordFilter::default()
    };

    let records = attendance::list(&pool.conn, &filter)?;
    let mut summary = RecomputeSummary {
        scanned: records.len(),
        ..RecomputeSummary::default()
    };
    let mut touched: BTreeSet<(String, String)> = BTreeSet::new();

    for mut record in records {
        touched.insert((record.student_id.clone(), record.subject.clone()));

        let scopes = scopes_for(&record.section, &record.student_id);
        let def = schedules::find_for_subject(
            &pool.conn,
            &scopes,
            record.lesson_date.weekday(),
            &record.subject,
        )?;

        let Some(session) = def.and_then(|d| d.anchored_on(record.lesson_date, &policy.timezone))
        else {
            log::warn!(
                "no session definition for {} / {} on {}; flags left as stored",
                record.student_id,
                record.subject,
                record.lesson_date
            );
            summary.orphaned += 1;
            continue;
        };

        if recompute(&mut record, &session, &policy) {
            attendance::update_flags(
                &pool.conn,
                record.id,
                record.status,
                record.late,
                record.left_early,
            )?;
            summary.updated += 1;
        }
    }

    for (student_id, subject) in &touched {
        if convert::convert(&mut pool.conn, student_id, subject, policy.late_threshold)? {
            summary.converted += 1;
        }
    }

    if let Err(e) = ttlog(
        &pool.conn,
        "recompute",
        "attendance",
        &format!(
            "scanned={} updated={} orphaned={} converted={}",
            summary.scanned, summary.updated, summary.orphaned, summary.converted
        ),
    ) {
        log::warn!("failed to write internal log: {e}");
    }

    Ok(summary)
}
