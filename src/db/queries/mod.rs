pub mod attendance;
pub mod schedules;
pub mod students;

use crate::errors::AppError;
use rusqlite::types::Type;

/// Wrap a parse failure of a stored TEXT column into a rusqlite row error.
pub(crate) fn text_conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Translate a UNIQUE violation into a domain duplicate error.
pub(crate) fn map_unique_violation(e: rusqlite::Error, what: impl FnOnce() -> String) -> AppError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Duplicate(what())
        }
        _ => AppError::Db(e),
    }
}
