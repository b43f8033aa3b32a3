//! Tap ingress and the presence state machine.
//!
//! A tap for a (student, subject, day) key cycles the record through
//! `NotYetArrived → Arrived ⇄ OnBreak`; every return from a break books one
//! break interval. The read-decide-write step runs in a single immediate
//! transaction, the converter in its own one afterwards, and the audit
//! trails are written last with their failures only logged.

use crate::config::Config;
use crate::core::breaks::record_break;
use crate::core::policy::Policy;
use crate::core::resolver::{resolve_for, scopes_for};
use crate::core::{convert, flags};
use crate::db::audit::{TapAttempt, mirror_presence, record_tap, ttlog};
use crate::db::pool::DbPool;
use crate::db::queries::{attendance, students};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{AttendanceRecord, Status};
use crate::models::presence::{PresenceState, TapAction};
use crate::models::schedule::ActiveSession;
use crate::models::student::Attendee;
use crate::utils::time::to_db_instant;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

/// What a tap decided for its record, before persistence.
#[derive(Debug, Clone)]
pub struct TapDecision {
    pub action: TapAction,
    pub record: AttendanceRecord,
}

/// Response of an accepted tap.
#[derive(Debug, Clone, Serialize)]
pub struct TapOutcome {
    pub action: TapAction,
    pub record: AttendanceRecord,
    /// Whether the converter turned a batch of lates into an absence.
    pub converted: bool,
}

fn out_of_order(now: &DateTime<Utc>, last: &DateTime<Utc>) -> AppError {
    AppError::OutOfOrderTap {
        at: to_db_instant(now),
        last: to_db_instant(last),
    }
}

fn ensure_not_before_arrival(record: &AttendanceRecord, now: &DateTime<Utc>) -> AppResult<()> {
    match record.time_in {
        Some(t_in) if *now < t_in => Err(out_of_order(now, &t_in)),
        _ => Ok(()),
    }
}

/// First tap for a key: a fresh record with `time_in = now`.
fn arrival(
    who: &Attendee,
    session: &ActiveSession,
    now: DateTime<Utc>,
    policy: &Policy,
    device: &str,
) -> TapDecision {
    let stamp = to_db_instant(&now);
    let mut record = AttendanceRecord {
        id: 0,
        student_id: who.student_id.clone(),
        student_name: who.student_name.clone(),
        section: who.section.clone(),
        subject: session.subject().to_string(),
        lesson_date: session.lesson_date,
        status: Status::Present,
        late: false,
        left_early: false,
        time_in: Some(now),
        time_out: None,
        breaks: Vec::new(),
        total_break_seconds: 0,
        converted_to_absence: false,
        remarks: None,
        from_device: device.to_string(),
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    flags::recompute(&mut record, session, policy);
    TapDecision {
        action: TapAction::Arrive,
        record,
    }
}

/// Pure state transition for one tap.
pub fn interpret(
    who: &Attendee,
    session: &ActiveSession,
    existing: Option<AttendanceRecord>,
    now: DateTime<Utc>,
    policy: &Policy,
    device: &str,
) -> AppResult<TapDecision> {
    let state = PresenceState::of(existing.as_ref());

    let (action, mut record) = match (state, existing) {
        (PresenceState::NotYetArrived, _) | (_, None) => {
            return Ok(arrival(who, session, now, policy, device));
        }
        (PresenceState::Arrived, Some(mut record)) => {
            ensure_not_before_arrival(&record, &now)?;
            record.time_out = Some(now);
            (TapAction::Depart, record)
        }
        (PresenceState::OnBreak { since }, Some(mut record)) => {
            ensure_not_before_arrival(&record, &now)?;
            if now < since {
                return Err(out_of_order(&now, &since));
            }
            record_break(&mut record, &since, &now);
            record.time_out = None;
            (TapAction::Resume, record)
        }
    };

    record.student_name = who.student_name.clone();
    record.section = who.section.clone();

    flags::recompute(&mut record, session, policy);
    Ok(TapDecision { action, record })
}

pub struct TapLogic;

impl TapLogic {
    /// Handle one badge tap at `now`.
    pub fn apply(
        pool: &mut DbPool,
        cfg: &Config,
        badge: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TapOutcome> {
        let policy = cfg.policy()?;
        let badge = badge.trim();

        //
        // 1. Directory lookup
        //
        let Some(student) = students::find_by_badge(&pool.conn, badge)? else {
            let err = AppError::UnknownBadge(badge.to_string());
            reject(&pool.conn, badge, &now, None, None, &err);
            return Err(err);
        };

        let who = match student.attendee(cfg.require_student_no) {
            Ok(w) => w,
            Err(err) => {
                reject(&pool.conn, badge, &now, None, None, &err);
                return Err(err);
            }
        };

        //
        // 2. Session resolution
        //
        let scopes = scopes_for(&who.section, &who.student_id);
        let Some(session) = resolve_for(&pool.conn, &scopes, &now, &policy.timezone)? else {
            let err = AppError::NoActiveSession {
                section: who.section.clone(),
                at: to_db_instant(&now),
            };
            reject(&pool.conn, badge, &now, Some(&who.student_id), None, &err);
            return Err(err);
        };

        //
        // 3. Read-decide-write for the record key
        //
        let decision = {
            let tx = pool
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = attendance::find_by_key(
                &tx,
                &who.student_id,
                session.subject(),
                &session.lesson_date,
            )?;

            let mut decision =
                match interpret(&who, &session, existing, now, &policy, &cfg.device) {
                    Ok(d) => d,
                    Err(err) => {
                        drop(tx);
                        reject(
                            &pool.conn,
                            badge,
                            &now,
                            Some(&who.student_id),
                            Some(session.subject()),
                            &err,
                        );
                        return Err(err);
                    }
                };

            decision.record.id = attendance::save(&tx, &decision.record)?;
            tx.commit()?;
            decision
        };

        //
        // 4. Converter (never fails the tap)
        //
        let converted = match convert::convert(
            &mut pool.conn,
            &who.student_id,
            session.subject(),
            policy.late_threshold,
        ) {
            Ok(c) => c,
            Err(e) => {
                log::warn!(
                    "late conversion failed for {} / {}: {}",
                    who.student_id,
                    session.subject(),
                    e
                );
                false
            }
        };

        let record = if converted {
            attendance::find_by_id(&pool.conn, decision.record.id)?
                .unwrap_or(decision.record)
        } else {
            decision.record
        };

        //
        // 5. Secondary trails
        //
        let summary = format!(
            "{} {} {} ({})",
            who.student_name,
            decision.action.as_str(),
            session.subject(),
            record.status.as_str()
        );
        let attempt = TapAttempt {
            at: &now,
            badge_tag: badge,
            student_id: Some(&who.student_id),
            subject: Some(session.subject()),
            action: Some(decision.action),
            accepted: true,
            message: &summary,
        };
        if let Err(e) = record_tap(&pool.conn, &attempt) {
            log::warn!("failed to write tap log: {e}");
        }
        if let Err(e) = mirror_presence(
            &pool.conn,
            &who,
            &session.lesson_date,
            decision.action,
            &now,
            &cfg.device,
        ) {
            log::warn!("failed to mirror presence: {e}");
        }
        if let Err(e) = ttlog(&pool.conn, "tap", &who.student_id, &summary) {
            log::warn!("failed to write internal log: {e}");
        }

        Ok(TapOutcome {
            action: decision.action,
            record,
            converted,
        })
    }
}

/// Record a rejected tap. Failures are only logged.
fn reject(
    conn: &Connection,
    badge: &str,
    now: &DateTime<Utc>,
    student_id: Option<&str>,
    subject: Option<&str>,
    err: &AppError,
) {
    let message = err.to_string();
    let attempt = TapAttempt {
        at: now,
        badge_tag: badge,
        student_id,
        subject,
        action: None,
        accepted: false,
        message: &message,
    };
    if let Err(e) = record_tap(conn, &attempt) {
        log::warn!("failed to write tap log: {e}");
    }
}
