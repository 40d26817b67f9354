//! The append-only change log.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::{ChangeEvent, ChangeKind, ResourceLevel};
use stratum_core::StratumResult;

use crate::db_err;

/// Append one event; returns its sequence number.
pub fn log_change(
    conn: &Connection,
    kind: ChangeKind,
    level: ResourceLevel,
    public_id: &str,
    date: &str,
) -> StratumResult<i64> {
    let mut statement = conn
        .prepare_cached("INSERT INTO Changes VALUES(NULL, ?1, ?2, ?3, ?4)")
        .map_err(db_err)?;
    statement
        .execute(params![kind.to_db(), public_id, level.to_db(), date])
        .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

fn change_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, String, i64, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn collect_changes(
    rows: Vec<(i64, i64, String, i64, String)>,
    max_results: usize,
) -> StratumResult<(Vec<ChangeEvent>, bool)> {
    // One extra row was fetched to compute the done flag.
    let done = rows.len() <= max_results;

    let mut changes = Vec::with_capacity(rows.len().min(max_results));
    for (seq, kind, public_id, level, date) in rows.into_iter().take(max_results) {
        changes.push(ChangeEvent {
            seq,
            kind: ChangeKind::from_db(kind)?,
            level: ResourceLevel::from_db(level)?,
            public_id,
            date,
        });
    }
    Ok((changes, done))
}

/// Page of events with `seq > since`, oldest first, at most
/// `max_results` of them. The `done` flag is false when more remain.
pub fn get_changes(
    conn: &Connection,
    since: i64,
    max_results: usize,
) -> StratumResult<(Vec<ChangeEvent>, bool)> {
    let mut statement = conn
        .prepare_cached(
            "SELECT seq, changeType, publicId, resourceType, date \
             FROM Changes WHERE seq>?1 ORDER BY seq LIMIT ?2",
        )
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![since, (max_results + 1) as i64], change_from_row)
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;

    collect_changes(rows, max_results)
}

pub fn get_last_change(conn: &Connection) -> StratumResult<Option<ChangeEvent>> {
    let mut statement = conn
        .prepare_cached(
            "SELECT seq, changeType, publicId, resourceType, date \
             FROM Changes ORDER BY seq DESC LIMIT 1",
        )
        .map_err(db_err)?;
    let row = statement
        .query_row([], change_from_row)
        .optional()
        .map_err(db_err)?;

    match row {
        None => Ok(None),
        Some((seq, kind, public_id, level, date)) => Ok(Some(ChangeEvent {
            seq,
            kind: ChangeKind::from_db(kind)?,
            level: ResourceLevel::from_db(level)?,
            public_id,
            date,
        })),
    }
}

/// Highest sequence number ever allocated, surviving log truncation;
/// 0 when no change was ever recorded.
pub fn get_last_change_index(conn: &Connection) -> StratumResult<i64> {
    let mut statement = conn
        .prepare_cached("SELECT seq FROM sqlite_sequence WHERE name='Changes'")
        .map_err(db_err)?;
    let seq: Option<i64> = statement
        .query_row([], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    Ok(seq.unwrap_or(0))
}

/// Maintenance truncation; sequence numbers keep growing afterwards.
pub fn clear_changes(conn: &Connection) -> StratumResult<()> {
    conn.execute_batch("DELETE FROM Changes").map_err(db_err)
}
