//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError so that rejections,
//! data faults and infrastructure failures are handled the same way.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / serialization
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid timezone offset: {0}")]
    InvalidTimezone(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Invalid attendance status: {0}")]
    InvalidStatus(String),

    #[error("Invalid schedule scope: {0}")]
    InvalidScope(String),

    // ---------------------------
    // Tap rejections
    // ---------------------------
    #[error("Unknown badge: {0}")]
    UnknownBadge(String),

    #[error("No class in session for section {section} at {at}")]
    NoActiveSession { section: String, at: String },

    #[error("Tap at {at} is earlier than the last recorded tap ({last})")]
    OutOfOrderTap { at: String, last: String },

    // ---------------------------
    // Data faults
    // ---------------------------
    #[error("Data integrity failure: {0}")]
    Integrity(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// True for errors that reject a tap without touching any record.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::UnknownBadge(_)
                | AppError::NoActiveSession { .. }
                | AppError::OutOfOrderTap { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
