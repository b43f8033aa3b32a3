use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::breaks::format_short_duration;
use crate::core::tap::{TapLogic, TapOutcome};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{detail, info, success};
use crate::utils::colors::colorize_status;
use crate::utils::time::{format_local, format_local_hm, parse_instant};
use chrono::{DateTime, FixedOffset, Utc};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Tap { badge, at, json } = cmd {
        let now = match at {
            Some(raw) => parse_instant(raw).ok_or_else(|| AppError::InvalidTime(raw.clone()))?,
            None => Utc::now(),
        };

        let mut pool = DbPool::new(&cfg.database)?;
        let outcome = TapLogic::apply(&mut pool, cfg, badge, now)?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_outcome(&outcome, &cfg.policy()?.timezone);
        }
    }
    Ok(())
}

fn print_outcome(o: &TapOutcome, tz: &FixedOffset) {
    let r = &o.record;
    success(format!(
        "{} {}: {} ({})",
        r.student_name,
        o.action.as_str(),
        r.subject,
        colorize_status(r.status)
    ));

    detail("date", r.lesson_date_str());
    if let Some(t) = &r.time_in {
        detail("in", format_local(t, tz));
    }
    if let Some(t) = &r.time_out {
        detail("out", format_local(t, tz));
    }
    if r.left_early {
        detail("left", "early");
    }
    for b in &r.breaks {
        detail(
            "break",
            format!(
                "{} → {} ({})",
                local_hm(b.start_at(), &b.start, tz),
                local_hm(b.end_at(), &b.end, tz),
                b.duration.as_deref().unwrap_or("?")
            ),
        );
    }
    if !r.breaks.is_empty() {
        detail("breaks", format_short_duration(r.total_break_seconds));
    }

    if o.converted {
        info(format!(
            "Late threshold reached: lates in {} converted into an absence.",
            r.subject
        ));
    }
}

/// Local `HH:MM` of a break boundary, or the stored text when it does not parse.
fn local_hm(at: Option<DateTime<Utc>>, raw: &str, tz: &FixedOffset) -> String {
    at.map(|t| format_local_hm(&t, tz))
        .unwrap_or_else(|| raw.to_string())
}
