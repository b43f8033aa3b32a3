use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::breaks::format_short_duration;
use crate::core::flags::recompute_stored;
use crate::db::pool::DbPool;
use crate::db::queries::attendance::{self, RecordFilter};
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREY, RESET, colorize_optional, colorize_status};
use crate::utils::date::resolve_date_filter;
use crate::utils::formatting::truncate;
use crate::utils::time::format_local_hm;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Records {
        student,
        section,
        subject,
        date,
        range,
        json,
        recompute,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;
        let dates = resolve_date_filter(date, range)?;

        if *recompute {
            let s = recompute_stored(&mut pool, cfg, dates)?;
            success(format!(
                "Recomputed {} records: {} updated, {} without session, {} conversions.",
                s.scanned, s.updated, s.orphaned, s.converted
            ));
            return Ok(());
        }

        let records = attendance::list(
            &pool.conn,
            &RecordFilter {
                student_id: student.clone(),
                section: section.clone(),
                subject: subject.clone(),
                dates,
            },
        )?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            info("No attendance records found.");
            return Ok(());
        }

        let tz = cfg.policy()?.timezone;
        let mut table = Table::new([
            "Date", "Student", "Name", "Section", "Subject", "Status", "In", "Out", "Breaks",
            "Flags",
        ]);

        for r in &records {
            let hm = |t: &Option<chrono::DateTime<chrono::Utc>>| {
                t.as_ref()
                    .map(|t| format_local_hm(t, &tz))
                    .unwrap_or_else(|| "--:--".to_string())
            };

            let mut flags = Vec::new();
            if r.late {
                flags.push("late");
            }
            if r.left_early {
                flags.push("left-early");
            }
            if r.converted_to_absence {
                flags.push("converted");
            }

            let breaks = if r.breaks.is_empty() {
                format!("{GREY}-{RESET}")
            } else {
                format!(
                    "{}×{}",
                    r.breaks.len(),
                    format_short_duration(r.total_break_seconds)
                )
            };

            table.add_row(vec![
                r.lesson_date_str(),
                r.student_id.clone(),
                truncate(&r.student_name, 24),
                r.section.clone(),
                truncate(&r.subject, 24),
                colorize_status(r.status),
                colorize_optional(&hm(&r.time_in)),
                colorize_optional(&hm(&r.time_out)),
                breaks,
                flags.join(","),
            ]);
        }

        print!("{}", table.render());

        for r in records.iter().filter(|r| r.remarks.is_some()) {
            println!(
                "{GREY}{} {} {}: {}{RESET}",
                r.lesson_date_str(),
                r.student_id,
                r.subject,
                r.remarks.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(())
}
