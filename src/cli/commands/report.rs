use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::report::{self, ReportFilter};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::summary::AttendanceReport;
use crate::ui::messages::{header, info};
use crate::utils::colors::{RED, YELLOW, colorize_count};
use crate::utils::date::resolve_date_filter;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Report {
        section,
        subject,
        date,
        range,
        per_subject,
        section_totals,
        json,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;

        let rep = if *section_totals {
            let section = section
                .as_deref()
                .ok_or_else(|| AppError::Other("--section-totals needs --section".into()))?;
            report::section_totals(&pool.conn, section)?
        } else {
            let filter = ReportFilter {
                section: section.clone(),
                subject: subject.clone(),
                dates: resolve_date_filter(date, range)?,
            };
            report::summarize(
                &pool.conn,
                &filter,
                cfg.policy()?.late_threshold,
                *per_subject,
            )?
        };

        if *json {
            println!("{}", serde_json::to_string_pretty(&rep)?);
        } else {
            print_report(&rep);
        }
    }

    Ok(())
}

fn print_report(rep: &AttendanceReport) {
    header(&rep.report_details);

    if rep.student_summaries.is_empty() {
        info("No attendance records match the filter.");
        return;
    }

    let mut table = Table::new(["Student", "Name", "Section", "Lates", "Absences"]);
    for s in &rep.student_summaries {
        table.add_row(vec![
            s.student_id.clone(),
            s.student_name.clone(),
            s.section.clone(),
            colorize_count(s.total_lates, YELLOW),
            colorize_count(s.total_absences, RED),
        ]);
    }
    print!("{}", table.render());

    if let Some(rows) = &rep.per_subject {
        println!();
        let mut table = Table::new([
            "Student", "Subject", "Lates", "Absences", "+Abs(lates)", "Residual",
        ]);
        for t in rows {
            table.add_row(vec![
                t.student_id.clone(),
                t.subject_code.clone(),
                t.lates_per_subject.to_string(),
                t.absences_per_subject.to_string(),
                t.extra_absences_from_lates.to_string(),
                t.residual_lates.to_string(),
            ]);
        }
        print!("{}", table.render());
    }
}
