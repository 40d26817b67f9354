//! PRAGMA configuration applied to the connection on open.
//!
//! WAL journaling with NORMAL sync, exclusive locking (no second process
//! may touch the file), case-sensitive LIKE, foreign keys ON. The
//! deletion cascade is implemented with foreign keys, so the last pragma
//! is a correctness requirement, not tuning.

use rusqlite::Connection;

use stratum_core::StratumResult;

use crate::db_err;

pub fn apply_pragmas(conn: &Connection) -> StratumResult<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        PRAGMA journal_mode = WAL;
        PRAGMA locking_mode = EXCLUSIVE;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA case_sensitive_like = ON;
        ",
    )
    .map_err(db_err)?;
    Ok(())
}

/// Verify that foreign-key enforcement is active on a connection.
pub fn verify_foreign_keys(conn: &Connection) -> StratumResult<bool> {
    let enabled: i64 = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .map_err(db_err)?;
    Ok(enabled == 1)
}
