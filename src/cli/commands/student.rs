use crate::cli::parser::{Commands, StudentCmd};
use crate::config::Config;
use crate::db::audit::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::students::{self, NewStudent};
use crate::db::queries::attendance;
use crate::errors::{AppError, AppResult};
use crate::models::student::Student;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREY, RESET};
use crate::utils::formatting::yes_no;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Student { action } = cmd {
        let pool = DbPool::new(&cfg.database)?;

        match action {
            StudentCmd::Add {
                student_no,
                first_name,
                last_name,
                section,
                badge,
            } => {
                let no = student_no.as_deref().map(str::trim).filter(|s| !s.is_empty());
                if no.is_none() && cfg.require_student_no {
                    return Err(AppError::Integrity(
                        "a student number (--no) is required by configuration".into(),
                    ));
                }

                let s = students::insert(
                    &pool.conn,
                    &NewStudent {
                        student_no: no,
                        first_name,
                        last_name,
                        section,
                        badge_tag: badge,
                    },
                )?;

                audit(&pool, &s, "added");
                success(format!(
                    "Student {} ({}) added to section {}.",
                    s.full_name(),
                    s.student_no.as_deref().unwrap_or("no number"),
                    s.section
                ));
            }

            StudentCmd::List { section } => {
                let list = students::list(&pool.conn, section.as_deref())?;
                if list.is_empty() {
                    info("No students found.");
                    return Ok(());
                }

                let mut table = Table::new(["No", "Name", "Section", "Badge", "Active"]);
                for s in &list {
                    table.add_row(vec![
                        s.student_no
                            .clone()
                            .unwrap_or_else(|| format!("{GREY}#{}{RESET}", s.id)),
                        s.full_name(),
                        s.section.clone(),
                        s.badge_tag.clone(),
                        yes_no(s.is_active).to_string(),
                    ]);
                }
                print!("{}", table.render());
            }

            StudentCmd::Edit {
                key,
                student_no,
                first_name,
                last_name,
                section,
                badge,
                active,
                inactive,
            } => {
                let found = match students::find_by_no(&pool.conn, key)? {
                    Some(s) => Some(s),
                    None => students::find_by_badge(&pool.conn, key)?,
                };
                let mut s =
                    found.ok_or_else(|| AppError::NotFound(format!("student '{key}'")))?;

                let old_id = s.canonical_id(cfg.require_student_no).ok();

                if let Some(v) = student_no {
                    s.student_no = Some(v.trim().to_string()).filter(|v| !v.is_empty());
                }
                if let Some(v) = first_name {
                    s.first_name = v.trim().to_string();
                }
                if let Some(v) = last_name {
                    s.last_name = v.trim().to_string();
                }
                if let Some(v) = section {
                    s.section = v.trim().to_string();
                }
                if let Some(v) = badge {
                    s.badge_tag = v.trim().to_string();
                }
                if *active {
                    s.is_active = true;
                }
                if *inactive {
                    s.is_active = false;
                }

                students::update(&pool.conn, &s)?;

                // Records carry the student's identity; keep them in step.
                match (old_id, s.canonical_id(cfg.require_student_no)) {
                    (Some(old), Ok(new)) => {
                        let n = attendance::rename_student(
                            &pool.conn,
                            &old,
                            &new,
                            &s.full_name(),
                            &s.section,
                        )?;
                        if n > 0 {
                            info(format!("{n} attendance records updated."));
                        }
                    }
                    (Some(_), Err(e)) => warning(format!("Records not updated: {e}")),
                    (None, _) => {}
                }

                audit(&pool, &s, "edited");
                success(format!("Student {} updated.", s.full_name()));
            }
        }
    }

    Ok(())
}

fn audit(pool: &DbPool, s: &Student, what: &str) {
    let target = s
        .student_no
        .clone()
        .unwrap_or_else(|| format!("#{}", s.id));
    if let Err(e) = ttlog(
        &pool.conn,
        "student",
        &target,
        &format!("{} {} ({}, badge {})", what, s.full_name(), s.section, s.badge_tag),
    ) {
        log::warn!("failed to write internal log: {e}");
    }
}
