// src/export/logic.rs

use crate::config::Config;
use crate::core::report::{self, ReportFilter};
use crate::db::pool::DbPool;
use crate::db::queries::attendance::{self, RecordFilter};
use crate::errors::{AppError, AppResult};
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::{RecordExport, ReportRowExport};
use crate::export::{ExportFormat, ExportTarget};
use crate::ui::messages::warning;
use crate::utils::date::resolve_date_filter;
use serde::Serialize;
use std::path::Path;

/// Selection shared by both export targets.
#[derive(Debug, Clone, Default)]
pub struct ExportScope {
    pub range: Option<String>,
    pub section: Option<String>,
    pub subject: Option<String>,
}

pub struct ExportLogic;

impl ExportLogic {
    /// Export records or report rows.
    ///
    /// - `file`: absolute path of the output file
    /// - `scope.range`: `None`, `"all"` or `YYYY`, `YYYY-MM`, `YYYY-MM-DD`,
    ///   `A:B` with both bounds in the same form
    ///
    /// Returns the number of rows written.
    pub fn export(
        pool: &DbPool,
        cfg: &Config,
        format: ExportFormat,
        target: ExportTarget,
        file: &str,
        scope: &ExportScope,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        let dates = resolve_date_filter(&None, &scope.range)?;
        let policy = cfg.policy()?;

        match target {
            ExportTarget::Records => {
                let records = attendance::list(
                    &pool.conn,
                    &RecordFilter {
                        student_id: None,
                        section: scope.section.clone(),
                        subject: scope.subject.clone(),
                        dates,
                    },
                )?;
                let rows: Vec<RecordExport> = records
                    .iter()
                    .map(|r| RecordExport::from_record(r, &policy.timezone))
                    .collect();
                write_rows(&rows, format, path, force)
            }
            ExportTarget::Report => {
                let filter = ReportFilter {
                    section: scope.section.clone(),
                    subject: scope.subject.clone(),
                    dates,
                };
                let rep = report::summarize(&pool.conn, &filter, policy.late_threshold, false)?;
                let rows: Vec<ReportRowExport> = rep
                    .student_summaries
                    .iter()
                    .map(|s| ReportRowExport::from_summary(&rep.report_details, s))
                    .collect();
                write_rows(&rows, format, path, force)
            }
        }
    }
}

fn write_rows<T: Serialize>(
    rows: &[T],
    format: ExportFormat,
    path: &Path,
    force: bool,
) -> AppResult<usize> {
    if rows.is_empty() {
        warning("No rows found for the selected range.");
        return Ok(0);
    }

    ensure_writable(path, force)?;

    match format {
        ExportFormat::Csv => export_csv(rows, path)?,
        ExportFormat::Json => export_json(rows, path)?,
    }
    Ok(rows.len())
}
