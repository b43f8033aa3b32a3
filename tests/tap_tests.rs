use chrono::{NaiveDate, Weekday};
use rollcall::core::tap::{TapLogic, TapOutcome, interpret};
use rollcall::db::audit::{load_presence, load_taps};
use rollcall::db::pool::DbPool;
use rollcall::db::queries::attendance::{self, RecordFilter};
use rollcall::errors::AppError;
use rollcall::models::attendance::Status;
use rollcall::models::presence::{PresenceState, TapAction};
use rollcall::models::schedule::Scope;
use std::sync::{Arc, Barrier};
use std::thread;

mod common;
use common::{
    add_section_session, add_student, at, definition, memory_pool, policy, setup_test_db, utc,
    utc_config,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()
}

#[test]
fn taps_cycle_between_inside_and_on_break() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let instants = [
        "2025-10-06T07:35:00Z",
        "2025-10-06T07:50:00Z",
        "2025-10-06T07:55:00Z",
        "2025-10-06T08:10:00Z",
        "2025-10-06T08:10:30Z",
    ];

    let mut last = None;
    for (i, t) in instants.iter().enumerate() {
        let out = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at(t)).expect("tap accepted");
        let n = i + 1;

        if n % 2 == 1 {
            assert!(out.record.presence().is_inside(), "tap {n} should be inside");
            assert!(out.record.time_out.is_none());
        } else {
            assert_eq!(out.action, TapAction::Depart);
            assert!(matches!(out.record.presence(), PresenceState::OnBreak { .. }));
        }
        // One break per return from outside.
        assert_eq!(out.record.breaks.len(), (n - 1) / 2);
        last = Some(out);
    }

    let last = last.unwrap();
    assert_eq!(last.action, TapAction::Resume);
    assert_eq!(last.record.status, Status::Present);
    assert!(!last.record.left_early);
    assert_eq!(last.record.breaks[0].duration_seconds, Some(300));
    assert_eq!(last.record.breaks[1].duration.as_deref(), Some("30s"));
    assert_eq!(last.record.total_break_seconds, 330);

    // Still a single record for the key.
    let all = attendance::list(&pool.conn, &RecordFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].lesson_date, monday());
}

#[test]
fn departure_before_session_end_sets_left_early() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:31:00Z")).unwrap();
    let out = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T08:15:00Z")).unwrap();
    assert_eq!(out.action, TapAction::Depart);
    assert!(out.record.left_early);

    // Coming back clears it again.
    let out = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T08:20:00Z")).unwrap();
    assert_eq!(out.action, TapAction::Resume);
    assert!(!out.record.left_early);
}

#[test]
fn unknown_badge_is_rejected_and_logged() {
    let mut pool = memory_pool();
    let cfg = utc_config();

    let err = TapLogic::apply(&mut pool, &cfg, "NOPE", at("2025-10-06T07:35:00Z")).unwrap_err();
    assert!(matches!(err, AppError::UnknownBadge(ref b) if b == "NOPE"));
    assert!(err.is_rejection());

    let taps = load_taps(&pool.conn, 10).unwrap();
    assert_eq!(taps.len(), 1);
    assert_eq!(taps[0].outcome, "rejected");
}

#[test]
fn tap_outside_any_session_creates_nothing() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let err = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T12:00:00Z")).unwrap_err();
    assert!(matches!(err, AppError::NoActiveSession { .. }));

    assert!(attendance::list(&pool.conn, &RecordFilter::default()).unwrap().is_empty());
    assert!(load_presence(&pool.conn, None, None).unwrap().is_empty());
}

#[test]
fn missing_student_number_is_an_integrity_failure() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, None, "No Number", "10-A", "BADGE-X");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let err = TapLogic::apply(&mut pool, &cfg, "BADGE-X", at("2025-10-06T07:35:00Z")).unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)));
    assert!(!err.is_rejection());
    assert!(attendance::list(&pool.conn, &RecordFilter::default()).unwrap().is_empty());
}

#[test]
fn internal_id_fallback_when_student_number_is_optional() {
    let mut pool = memory_pool();
    let cfg = rollcall::config::Config {
        require_student_no: false,
        ..utc_config()
    };
    let s = add_student(&pool, None, "No Number", "10-A", "BADGE-X");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let out = TapLogic::apply(&mut pool, &cfg, "BADGE-X", at("2025-10-06T07:35:00Z")).unwrap();
    assert_eq!(out.record.student_id, format!("#{}", s.id));
}

#[test]
fn tap_earlier_than_recorded_times_is_rejected() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T08:00:00Z")).unwrap();
    let err = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:45:00Z")).unwrap_err();
    assert!(matches!(err, AppError::OutOfOrderTap { .. }));

    let rec = attendance::find_by_key(&pool.conn, "S-001", "MATH 101", &monday())
        .unwrap()
        .unwrap();
    assert!(rec.time_out.is_none());
}

#[test]
fn accepted_taps_are_mirrored_into_presence_and_tap_logs() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    for t in ["2025-10-06T07:35:00Z", "2025-10-06T07:50:00Z", "2025-10-06T07:55:00Z"] {
        TapLogic::apply(&mut pool, &cfg, "BADGE-1", at(t)).unwrap();
    }

    let spans = load_presence(&pool.conn, Some("S-001"), Some(&monday())).unwrap();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].time_in.as_deref(), Some("2025-10-06T07:35:00Z"));
    assert_eq!(spans[0].time_out.as_deref(), Some("2025-10-06T07:50:00Z"));
    assert!(spans[1].time_out.is_none());

    let taps = load_taps(&pool.conn, 10).unwrap();
    assert_eq!(taps.len(), 3);
    assert!(taps.iter().all(|t| t.outcome == "accepted"));
    assert_eq!(taps[0].action.as_deref(), Some("resume"));
}

#[test]
fn interpret_is_pure_and_builds_the_first_record() {
    let def = definition(Scope::Section("10-A".into()), Weekday::Mon, "07:30", "09:00", "MATH 101");
    let session = def.anchored_on(monday(), &utc()).unwrap();
    let who = rollcall::models::student::Attendee {
        student_id: "S-001".into(),
        student_name: "Ada Lovelace".into(),
        section: "10-A".into(),
    };

    let d = interpret(&who, &session, None, at("2025-10-06T07:45:00Z"), &policy(), "rfid").unwrap();
    assert_eq!(d.action, TapAction::Arrive);
    assert_eq!(d.record.id, 0);
    assert_eq!(d.record.status, Status::Late);
    assert!(d.record.late);
    assert_eq!(d.record.total_break_seconds, 0);
    assert_eq!(d.record.from_device, "rfid");
}

#[test]
fn overnight_taps_share_the_record_of_the_start_date() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "23:00", "01:00", "ASTRO 1");

    let first = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T23:30:00Z")).unwrap();
    assert_eq!(first.action, TapAction::Arrive);
    assert!(first.record.late);

    // Tuesday 00:30 still belongs to Monday's session.
    let second = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-07T00:30:00Z")).unwrap();
    assert_eq!(second.action, TapAction::Depart);
    assert_eq!(second.record.id, first.record.id);
    assert_eq!(second.record.lesson_date, monday());
    assert!(second.record.left_early);

    let all = attendance::list(&pool.conn, &RecordFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].lesson_date, monday());
}

#[test]
fn failing_audit_trails_do_not_undo_the_tap() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    pool.conn
        .execute_batch(
            "CREATE TRIGGER tap_log_down BEFORE INSERT ON tap_log
                BEGIN SELECT RAISE(ABORT, 'tap log offline'); END;
             CREATE TRIGGER presence_down BEFORE INSERT ON presence_log
                BEGIN SELECT RAISE(ABORT, 'presence log offline'); END;
             CREATE TRIGGER audit_down BEFORE INSERT ON log
                BEGIN SELECT RAISE(ABORT, 'audit offline'); END;",
        )
        .unwrap();

    let out = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:35:00Z")).unwrap();
    assert_eq!(out.action, TapAction::Arrive);

    let stored = attendance::find_by_key(&pool.conn, "S-001", "MATH 101", &monday())
        .unwrap()
        .expect("record committed");
    assert_eq!(stored.id, out.record.id);
    assert!(load_taps(&pool.conn, 10).unwrap().is_empty());
    assert!(load_presence(&pool.conn, None, None).unwrap().is_empty());
}

#[test]
fn concurrent_taps_on_one_key_are_serialized() {
    let db_path = setup_test_db("tap_concurrent");
    {
        let pool = DbPool::new(&db_path).unwrap();
        add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
        add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");
    }

    let pools: Vec<DbPool> = (0..2).map(|_| DbPool::new(&db_path).unwrap()).collect();
    let gate = Arc::new(Barrier::new(pools.len()));

    let handles: Vec<_> = pools
        .into_iter()
        .map(|mut pool| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let cfg = utc_config();
                gate.wait();
                TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:35:00Z"))
            })
        })
        .collect();

    let outcomes: Vec<TapOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("tap thread").expect("tap accepted"))
        .collect();

    let arrivals = outcomes
        .iter()
        .filter(|o| o.action == TapAction::Arrive)
        .count();
    assert_eq!(arrivals, 1);
    assert!(outcomes.iter().any(|o| o.action == TapAction::Depart));

    let pool = DbPool::new(&db_path).unwrap();
    let all = attendance::list(&pool.conn, &RecordFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].breaks.is_empty());
    assert!(all[0].time_out.is_some());
    std::fs::remove_file(&db_path).ok();
}

#[test]
fn unreadable_break_ledger_is_not_overwritten() {
    let mut pool = memory_pool();
    let cfg = utc_config();
    add_student(&pool, Some("S-001"), "Ada Lovelace", "10-A", "BADGE-1");
    add_section_session(&pool, "10-A", Weekday::Mon, "07:30", "09:00", "MATH 101");

    let out = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:35:00Z")).unwrap();
    TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:50:00Z")).unwrap();

    pool.conn
        .execute(
            "UPDATE attendance SET breaks = '{truncated' WHERE id = ?1",
            [out.record.id],
        )
        .unwrap();

    let err = TapLogic::apply(&mut pool, &cfg, "BADGE-1", at("2025-10-06T07:55:00Z")).unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)));

    let raw: String = pool
        .conn
        .query_row("SELECT breaks FROM attendance WHERE id = ?1", [out.record.id], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(raw, "{truncated");
}
