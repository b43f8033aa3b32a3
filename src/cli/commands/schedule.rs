use crate::cli::parser::{Commands, ScheduleCmd};
use crate::config::Config;
use crate::core::resolver::resolve_for;
use crate::db::audit::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{schedules, students};
use crate::errors::{AppError, AppResult};
use crate::models::schedule::{Scope, SessionDefinition};
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREY, RESET};
use crate::utils::date::parse_weekday;
use crate::utils::time::{format_local, parse_instant, parse_time_of_day, to_db_time};
use crate::utils::table::Table;
use chrono::{FixedOffset, Utc};
use rusqlite::Connection;
use serde::Deserialize;

/// One line of a timetable CSV.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    section: Option<String>,
    day: String,
    start_time: String,
    end_time: String,
    subject: String,
    #[serde(default)]
    room: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build a definition from raw text, normalising datetime boundaries to a
/// time-of-day in `tz`.
fn build_definition(
    scope: Scope,
    day: &str,
    start: &str,
    end: &str,
    subject: &str,
    room: Option<String>,
    tz: &FixedOffset,
) -> AppResult<SessionDefinition> {
    Ok(SessionDefinition {
        id: 0,
        scope,
        weekday: parse_weekday(day)?,
        start: parse_time_of_day(start, tz)?,
        end: parse_time_of_day(end, tz)?,
        subject: subject.trim().to_string(),
        room,
    })
}

fn audit(conn: &Connection, def: &SessionDefinition, id: i64) {
    if let Err(e) = ttlog(
        conn,
        "schedule",
        def.scope.value(),
        &format!(
            "#{} {} {} {}-{}",
            id,
            def.subject,
            def.day_code(),
            to_db_time(&def.start),
            to_db_time(&def.end)
        ),
    ) {
        log::warn!("failed to write internal log: {e}");
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Schedule { action } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        let tz = cfg.policy()?.timezone;

        match action {
            ScheduleCmd::Add {
                section,
                student,
                day,
                start,
                end,
                subject,
                room,
            } => {
                let scope = match (section, student) {
                    (Some(s), _) => Scope::Section(s.trim().to_string()),
                    (None, Some(no)) => {
                        if students::find_by_no(&pool.conn, no)?.is_none() {
                            warning(format!("No student with number '{no}' yet."));
                        }
                        Scope::Student(no.trim().to_string())
                    }
                    (None, None) => {
                        return Err(AppError::InvalidScope("--section or --student".into()));
                    }
                };

                let def = build_definition(scope, day, start, end, subject, non_empty(room), &tz)?;
                let id = schedules::insert(&pool.conn, &def)?;
                audit(&pool.conn, &def, id);

                let overnight = if def.is_overnight() {
                    " (ends next day)"
                } else {
                    ""
                };
                success(format!(
                    "Session #{} {} on {} {}–{}{} added for {} {}.",
                    id,
                    def.subject,
                    def.day_code(),
                    def.start.format("%H:%M"),
                    def.end.format("%H:%M"),
                    overnight,
                    def.scope.kind(),
                    def.scope.value()
                ));
            }

            ScheduleCmd::Import { file, section } => {
                let mut rdr = csv::ReaderBuilder::new()
                    .trim(csv::Trim::All)
                    .from_path(file)?;

                let mut imported = 0usize;
                for (line, row) in rdr.deserialize::<ImportRow>().enumerate() {
                    let row = row?;
                    let Some(sec) = non_empty(&row.section).or_else(|| non_empty(section)) else {
                        return Err(AppError::InvalidScope(format!(
                            "row {}: empty section and no --section given",
                            line + 2
                        )));
                    };

                    let def = build_definition(
                        Scope::Section(sec),
                        &row.day,
                        &row.start_time,
                        &row.end_time,
                        &row.subject,
                        non_empty(&row.room),
                        &tz,
                    )
                    .map_err(|e| AppError::Other(format!("row {}: {}", line + 2, e)))?;

                    let id = schedules::insert(&pool.conn, &def)?;
                    audit(&pool.conn, &def, id);
                    imported += 1;
                }

                success(format!("{imported} session definitions imported from {file}."));
            }

            ScheduleCmd::List { section, day } => {
                let day = day.as_deref().map(parse_weekday).transpose()?;
                let defs = schedules::list(&pool.conn, section.as_deref(), day)?;

                if defs.is_empty() {
                    info("No session definitions found.");
                    return Ok(());
                }

                let mut table =
                    Table::new(["#", "Scope", "Day", "Start", "End", "Subject", "Room"]);
                for d in &defs {
                    let end = if d.is_overnight() {
                        format!("{} {GREY}+1d{RESET}", d.end.format("%H:%M"))
                    } else {
                        d.end.format("%H:%M").to_string()
                    };
                    table.add_row(vec![
                        d.id.to_string(),
                        format!("{}:{}", d.scope.kind(), d.scope.value()),
                        d.day_code().to_string(),
                        d.start.format("%H:%M").to_string(),
                        end,
                        d.subject.clone(),
                        d.room.clone().unwrap_or_default(),
                    ]);
                }
                print!("{}", table.render());
            }

            ScheduleCmd::Now {
                section,
                student,
                at,
            } => {
                let at = match at {
                    Some(raw) => {
                        parse_instant(raw).ok_or_else(|| AppError::InvalidTime(raw.clone()))?
                    }
                    None => Utc::now(),
                };

                let mut scopes = vec![Scope::Section(section.clone())];
                if let Some(no) = student {
                    scopes.push(Scope::Student(no.clone()));
                }

                match resolve_for(&pool.conn, &scopes, &at, &tz)? {
                    Some(s) => success(format!(
                        "{} in session: {} → {} (lesson date {})",
                        s.subject(),
                        format_local(&s.starts_at, &tz),
                        format_local(&s.ends_at, &tz),
                        s.lesson_date
                    )),
                    None => info(format!(
                        "No class in session for section {} at {}.",
                        section,
                        format_local(&at, &tz)
                    )),
                }
            }
        }
    }

    Ok(())
}
