use crate::db::migrate::run_pending_migrations;
use crate::errors::AppResult;
use rusqlite::Connection;
use std::time::Duration;

/// Upper bound on waiting for another writer; lookups never block forever.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Prepare a freshly opened connection: lock timeout, foreign keys, then
/// every pending migration.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    run_pending_migrations(conn)?;
    Ok(())
}
