use rollcall::config::{Config, migrate};
use rollcall::errors::AppError;
use rollcall::utils::date::parse_range;
use rollcall::utils::time::parse_utc_offset;
use std::env;
use std::fs;
use std::path::PathBuf;

fn temp_conf(name: &str, content: &str) -> PathBuf {
    let mut path = env::temp_dir();
    path.push(format!("{name}_rollcall.conf"));
    fs::write(&path, content).expect("write conf");
    path
}

#[test]
fn missing_file_yields_defaults() {
    let path = env::temp_dir().join("definitely_missing_rollcall.conf");
    fs::remove_file(&path).ok();

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.timezone, "+08:00");
    assert_eq!(cfg.grace_period_minutes, 10);
    assert_eq!(cfg.late_threshold, 3);
    assert!(cfg.require_student_no);
}

#[test]
fn partial_file_keeps_values_and_fills_defaults() {
    let path = temp_conf("partial", "database: /tmp/x.sqlite\nlate_threshold: 4\n");

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.database, "/tmp/x.sqlite");
    assert_eq!(cfg.late_threshold, 4);
    assert_eq!(cfg.device, "rfid");

    let missing = migrate::missing_keys(&path).unwrap();
    assert!(missing.contains(&"timezone".to_string()));
    assert!(!missing.contains(&"database".to_string()));

    let added = migrate::fill_missing_keys(&path).unwrap();
    assert_eq!(added, missing);
    assert!(migrate::missing_keys(&path).unwrap().is_empty());

    // Existing values survive the migration.
    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.late_threshold, 4);
    fs::remove_file(&path).ok();
}

#[test]
fn invalid_yaml_is_a_config_error() {
    let path = temp_conf("broken", "late_threshold: [oops\n");
    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    fs::remove_file(&path).ok();
}

#[test]
fn policy_validates_its_inputs() {
    let cfg = Config {
        late_threshold: 0,
        ..Config::default()
    };
    assert!(matches!(cfg.policy(), Err(AppError::Config(_))));

    let cfg = Config {
        timezone: "Mars/Olympus".into(),
        ..Config::default()
    };
    assert!(matches!(cfg.policy(), Err(AppError::InvalidTimezone(_))));

    // Out-of-range grace windows are config errors, not panics.
    for grace in [i64::MAX / 2, i64::MAX, 24 * 60 + 1, -1] {
        let cfg = Config {
            grace_period_minutes: grace,
            ..Config::default()
        };
        assert!(matches!(cfg.policy(), Err(AppError::Config(_))), "grace {grace}");
    }
    let cfg = Config {
        grace_period_minutes: 24 * 60,
        ..Config::default()
    };
    assert!(cfg.policy().is_ok());

    let p = Config::default().policy().unwrap();
    assert_eq!(p.timezone.local_minus_utc(), 8 * 3600);
    assert_eq!(p.grace.num_minutes(), 10);
}

#[test]
fn utc_offsets_in_common_spellings() {
    assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 28_800);
    assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19_800);
    assert_eq!(parse_utc_offset("+8").unwrap().local_minus_utc(), 28_800);
    assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
    assert!(parse_utc_offset("8").is_err());
    assert!(parse_utc_offset("+25:00").is_err());
}

#[test]
fn ranges_expand_to_inclusive_bounds() {
    let (a, b) = parse_range("2025-02").unwrap();
    assert_eq!(a.to_string(), "2025-02-01");
    assert_eq!(b.to_string(), "2025-02-28");

    let (a, b) = parse_range("2024:2025").unwrap();
    assert_eq!(a.to_string(), "2024-01-01");
    assert_eq!(b.to_string(), "2025-12-31");

    assert!(parse_range("2025-10:2025").is_err());
    assert!(parse_range("2025-10-07:2025-10-01").is_err());
}
