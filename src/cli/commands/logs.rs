use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::audit::{load_presence, load_taps};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::info;
use crate::utils::colors::{GREEN, RED, RESET, colorize_optional};
use crate::utils::date::parse_date;
use crate::utils::formatting::truncate;
use crate::utils::table::Table;
use crate::utils::time::{format_local_hm, parse_instant};

/// `logs`: per-day presence mirror.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Logs { student, date } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        let tz = cfg.policy()?.timezone;

        let date = date
            .as_deref()
            .map(|d| parse_date(d).ok_or_else(|| AppError::InvalidDate(d.to_string())))
            .transpose()?;

        let entries = load_presence(&pool.conn, student.as_deref(), date.as_ref())?;
        if entries.is_empty() {
            info("No presence entries found.");
            return Ok(());
        }

        let hm = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(parse_instant)
                .map(|t| format_local_hm(&t, &tz))
                .unwrap_or_else(|| "--:--".to_string())
        };

        let mut table = Table::new(["Date", "Student", "Name", "Section", "In", "Out", "Device"]);
        for e in &entries {
            table.add_row(vec![
                e.lesson_date.clone(),
                e.student_id.clone(),
                e.student_name.clone(),
                e.section.clone(),
                colorize_optional(&hm(&e.time_in)),
                colorize_optional(&hm(&e.time_out)),
                e.from_device.clone(),
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}

/// `taps`: raw tap attempts.
pub fn handle_taps(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Taps { limit } = cmd {
        let pool = DbPool::new(&cfg.database)?;

        let taps = load_taps(&pool.conn, *limit)?;
        if taps.is_empty() {
            info("No taps recorded.");
            return Ok(());
        }

        let mut table = Table::new(["#", "At", "Badge", "Student", "Subject", "Action", "Outcome", "Message"]);
        for t in &taps {
            let outcome = if t.outcome == "accepted" {
                format!("{GREEN}{}{RESET}", t.outcome)
            } else {
                format!("{RED}{}{RESET}", t.outcome)
            };
            table.add_row(vec![
                t.id.to_string(),
                t.at.clone(),
                t.badge_tag.clone(),
                t.student_id.clone().unwrap_or_default(),
                t.subject.clone().unwrap_or_default(),
                t.action.clone().unwrap_or_default(),
                outcome,
                truncate(&t.message, 60),
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}
