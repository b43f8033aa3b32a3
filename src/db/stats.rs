use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RED, RESET, YELLOW};
use crate::utils::date::parse_date;
use rusqlite::OptionalExtension;
use std::fs;

fn count(pool: &DbPool, sql: &str) -> AppResult<i64> {
    Ok(pool.conn.query_row(sql, [], |row| row.get(0))?)
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) DIRECTORY AND TIMETABLE
    //
    let students = count(pool, "SELECT COUNT(*) FROM students WHERE is_active = 1")?;
    let schedules = count(pool, "SELECT COUNT(*) FROM schedules")?;
    println!("{}• Active students:{} {}{}{}", CYAN, RESET, GREEN, students, RESET);
    println!("{}• Session definitions:{} {}{}{}", CYAN, RESET, GREEN, schedules, RESET);

    //
    // 3) ATTENDANCE
    //
    let records = count(pool, "SELECT COUNT(*) FROM attendance")?;
    let lates = count(
        pool,
        "SELECT COUNT(*) FROM attendance WHERE late = 1 AND converted_to_absence = 0",
    )?;
    let absences = count(pool, "SELECT COUNT(*) FROM attendance WHERE status = 'Absent'")?;
    let rejected = count(pool, "SELECT COUNT(*) FROM tap_log WHERE outcome = 'rejected'")?;

    println!("{}• Attendance records:{} {}{}{}", CYAN, RESET, GREEN, records, RESET);
    println!("{}• Pending lates:{} {}{}{}", CYAN, RESET, YELLOW, lates, RESET);
    println!("{}• Absences:{} {}{}{}", CYAN, RESET, RED, absences, RESET);
    println!("{}• Rejected taps:{} {}", CYAN, RESET, rejected);

    //
    // 4) DATE RANGE
    //
    let first_date: Option<String> = pool
        .conn
        .query_row(
            "SELECT lesson_date FROM attendance ORDER BY lesson_date ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last_date: Option<String> = pool
        .conn
        .query_row(
            "SELECT lesson_date FROM attendance ORDER BY lesson_date DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let fmt_first = first_date
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_date
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Lesson dates:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 5) AVERAGE RECORDS/DAY
    //
    if let (Some(d1), Some(d2)) = (
        first_date.as_deref().and_then(parse_date),
        last_date.as_deref().and_then(parse_date),
    ) {
        let days = (d2 - d1).num_days() + 1;
        let avg = records as f64 / days as f64;
        println!("{}• Average records/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}
