//! Per-resource metadata, keyed by `(resource, type)`.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::MetadataKind;
use stratum_core::StratumResult;

use crate::db_err;

/// Insert or replace one metadata slot.
pub fn set_metadata(
    conn: &Connection,
    id: i64,
    kind: MetadataKind,
    value: &str,
) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("INSERT OR REPLACE INTO Metadata VALUES(?1, ?2, ?3)")
        .map_err(db_err)?;
    statement.execute(params![id, kind.0, value]).map_err(db_err)?;
    Ok(())
}

pub fn delete_metadata(conn: &Connection, id: i64, kind: MetadataKind) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("DELETE FROM Metadata WHERE id=?1 AND type=?2")
        .map_err(db_err)?;
    statement.execute(params![id, kind.0]).map_err(db_err)?;
    Ok(())
}

pub fn lookup_metadata(
    conn: &Connection,
    id: i64,
    kind: MetadataKind,
) -> StratumResult<Option<String>> {
    let mut statement = conn
        .prepare_cached("SELECT value FROM Metadata WHERE id=?1 AND type=?2")
        .map_err(db_err)?;
    statement
        .query_row(params![id, kind.0], |row| row.get(0))
        .optional()
        .map_err(db_err)
}

pub fn get_all_metadata(
    conn: &Connection,
    id: i64,
) -> StratumResult<BTreeMap<MetadataKind, String>> {
    let mut statement = conn
        .prepare_cached("SELECT type, value FROM Metadata WHERE id=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| {
            Ok((MetadataKind(row.get::<_, i64>(0)?), row.get::<_, String>(1)?))
        })
        .map_err(db_err)?;
    rows.collect::<Result<BTreeMap<_, _>, _>>().map_err(db_err)
}

pub fn list_available_metadata(conn: &Connection, id: i64) -> StratumResult<Vec<MetadataKind>> {
    let mut statement = conn
        .prepare_cached("SELECT type FROM Metadata WHERE id=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| Ok(MetadataKind(row.get::<_, i64>(0)?)))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}
