//! Global properties and the size aggregates.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::GlobalPropertyId;
use stratum_core::{StratumError, StratumResult};

use crate::db_err;

pub fn set_global_property(
    conn: &Connection,
    property: GlobalPropertyId,
    value: &str,
) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("INSERT OR REPLACE INTO GlobalProperties VALUES(?1, ?2)")
        .map_err(db_err)?;
    statement.execute(params![property.0, value]).map_err(db_err)?;
    Ok(())
}

pub fn lookup_global_property(
    conn: &Connection,
    property: GlobalPropertyId,
) -> StratumResult<Option<String>> {
    let mut statement = conn
        .prepare_cached("SELECT value FROM GlobalProperties WHERE property=?1")
        .map_err(db_err)?;
    statement
        .query_row(params![property.0], |row| row.get(0))
        .optional()
        .map_err(db_err)
}

/// Read-increment-write of an integer property; returns the new value.
/// The first call on a fresh store yields 1.
pub fn increment_global_sequence(
    conn: &Connection,
    property: GlobalPropertyId,
) -> StratumResult<u64> {
    let next = match lookup_global_property(conn, property)? {
        None => 1,
        Some(text) => {
            let current: u64 = text.parse().map_err(|_| StratumError::Corruption {
                details: format!("global property {} should be an integer, found: {text}", property.0),
            })?;
            current + 1
        }
    };

    set_global_property(conn, property, &next.to_string())?;
    Ok(next)
}

fn read_global_integer(conn: &Connection, key: i64) -> StratumResult<u64> {
    let mut statement = conn
        .prepare_cached("SELECT value FROM GlobalIntegers WHERE key=?1")
        .map_err(db_err)?;
    let value: i64 = statement
        .query_row(params![key], |row| row.get(0))
        .map_err(db_err)?;
    Ok(value as u64)
}

/// O(1) read of the trigger-maintained compressed-size aggregate.
pub fn get_total_compressed_size(conn: &Connection) -> StratumResult<u64> {
    read_global_integer(conn, 0)
}

/// O(1) read of the trigger-maintained uncompressed-size aggregate.
pub fn get_total_uncompressed_size(conn: &Connection) -> StratumResult<u64> {
    read_global_integer(conn, 1)
}
