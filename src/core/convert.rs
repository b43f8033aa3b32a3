//! Late-to-absence converter.
//!
//! Every complete batch of `K` unconverted lates (oldest first) becomes one
//! absence: the newest record of the batch turns `Absent`, and the whole batch
//! is marked converted with `late` cleared. Conversion is one-way.

use crate::db::audit::ttlog;
use crate::db::queries::attendance;
use crate::errors::AppResult;
use rusqlite::{Connection, TransactionBehavior};

pub fn conversion_remark(threshold: u32) -> String {
    format!("Auto-converted: {threshold} lates counted as 1 absence")
}

/// Convert every complete batch for (`student_id`, `subject`).
/// Returns whether at least one batch was converted.
pub fn convert(
    conn: &mut Connection,
    student_id: &str,
    subject: &str,
    threshold: u32,
) -> AppResult<bool> {
    let k = threshold.max(1) as usize;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let lates = attendance::unconverted_lates(&tx, student_id, subject)?;

    if lates.len() < k {
        return Ok(false);
    }

    let remark = conversion_remark(threshold);
    let mut notes = Vec::new();

    for batch in lates.chunks_exact(k) {
        let Some((newest, older)) = batch.split_last() else {
            continue;
        };

        for r in older {
            attendance::mark_converted(&tx, r.id, false, None)?;
        }
        attendance::mark_converted(&tx, newest.id, true, Some(&remark))?;

        log::info!(
            "converted {} lates of {} in '{}' into an absence on {}",
            k,
            student_id,
            subject,
            newest.lesson_date
        );
        notes.push(format!(
            "{}: {} lates up to {} counted as 1 absence",
            subject,
            k,
            newest.lesson_date_str()
        ));
    }

    tx.commit()?;

    // The audit trail is written after the commit and never undoes it.
    for note in &notes {
        if let Err(e) = ttlog(conn, "convert", student_id, note) {
            log::warn!("failed to write internal log: {e}");
        }
    }
    Ok(!notes.is_empty())
}
