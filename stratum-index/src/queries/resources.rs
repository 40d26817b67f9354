//! CRUD over the resource hierarchy.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::ResourceLevel;
use stratum_core::{StratumError, StratumResult};

use crate::db_err;

/// Insert a new resource with no parent. The public id is unique across
/// all levels; a collision surfaces as `Duplicate`.
pub fn create_resource(
    conn: &Connection,
    public_id: &str,
    level: ResourceLevel,
) -> StratumResult<i64> {
    let mut statement = conn
        .prepare_cached("INSERT INTO Resources VALUES(NULL, ?1, ?2, NULL)")
        .map_err(db_err)?;
    statement
        .execute(params![level.to_db(), public_id])
        .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

pub fn lookup_resource(
    conn: &Connection,
    public_id: &str,
) -> StratumResult<Option<(i64, ResourceLevel)>> {
    let mut statement = conn
        .prepare_cached("SELECT internalId, resourceType FROM Resources WHERE publicId=?1")
        .map_err(db_err)?;

    let row = statement
        .query_row(params![public_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })
        .optional()
        .map_err(db_err)?;

    match row {
        None => Ok(None),
        Some((id, level)) => Ok(Some((id, ResourceLevel::from_db(level)?))),
    }
}

pub fn is_existing_resource(conn: &Connection, id: i64) -> StratumResult<bool> {
    let mut statement = conn
        .prepare_cached("SELECT 1 FROM Resources WHERE internalId=?1")
        .map_err(db_err)?;
    statement.exists(params![id]).map_err(db_err)
}

/// Link a child to its parent. The caller guarantees the levels are
/// consecutive and that the child was never linked before.
pub fn attach_child(conn: &Connection, parent: i64, child: i64) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("UPDATE Resources SET parentId = ?1 WHERE internalId = ?2")
        .map_err(db_err)?;
    statement.execute(params![parent, child]).map_err(db_err)?;
    Ok(())
}

pub fn get_public_id(conn: &Connection, id: i64) -> StratumResult<String> {
    let mut statement = conn
        .prepare_cached("SELECT publicId FROM Resources WHERE internalId=?1")
        .map_err(db_err)?;
    statement
        .query_row(params![id], |row| row.get(0))
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| StratumError::not_found(format!("resource {id}")))
}

pub fn get_resource_level(conn: &Connection, id: i64) -> StratumResult<ResourceLevel> {
    let mut statement = conn
        .prepare_cached("SELECT resourceType FROM Resources WHERE internalId=?1")
        .map_err(db_err)?;
    let level: Option<i64> = statement
        .query_row(params![id], |row| row.get(0))
        .optional()
        .map_err(db_err)?;

    match level {
        None => Err(StratumError::not_found(format!("resource {id}"))),
        Some(value) => ResourceLevel::from_db(value),
    }
}

/// The parent's internal id, or `None` for a root. Looking up an unknown
/// resource is an error, unlike a root without a parent.
pub fn lookup_parent(conn: &Connection, id: i64) -> StratumResult<Option<i64>> {
    let mut statement = conn
        .prepare_cached("SELECT parentId FROM Resources WHERE internalId=?1")
        .map_err(db_err)?;
    let parent: Option<Option<i64>> = statement
        .query_row(params![id], |row| row.get(0))
        .optional()
        .map_err(db_err)?;

    match parent {
        None => Err(StratumError::not_found(format!("resource {id}"))),
        Some(parent) => Ok(parent),
    }
}

pub fn get_parent_public_id(conn: &Connection, id: i64) -> StratumResult<Option<String>> {
    let mut statement = conn
        .prepare_cached(
            "SELECT a.publicId FROM Resources AS a, Resources AS b \
             WHERE a.internalId = b.parentId AND b.internalId = ?1",
        )
        .map_err(db_err)?;
    statement
        .query_row(params![id], |row| row.get(0))
        .optional()
        .map_err(db_err)
}

pub fn get_children_internal_id(conn: &Connection, id: i64) -> StratumResult<Vec<i64>> {
    let mut statement = conn
        .prepare_cached("SELECT internalId FROM Resources WHERE parentId=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

pub fn get_children_public_id(conn: &Connection, id: i64) -> StratumResult<Vec<String>> {
    let mut statement = conn
        .prepare_cached("SELECT publicId FROM Resources WHERE parentId=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

pub fn get_resource_count(conn: &Connection, level: ResourceLevel) -> StratumResult<u64> {
    let mut statement = conn
        .prepare_cached("SELECT COUNT(*) FROM Resources WHERE resourceType=?1")
        .map_err(db_err)?;
    let count: i64 = statement
        .query_row(params![level.to_db()], |row| row.get(0))
        .map_err(db_err)?;
    Ok(count as u64)
}

pub fn get_all_public_ids(conn: &Connection, level: ResourceLevel) -> StratumResult<Vec<String>> {
    let mut statement = conn
        .prepare_cached("SELECT publicId FROM Resources WHERE resourceType=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![level.to_db()], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

/// Paginated enumeration, ordered by internal id so that pages are stable
/// under concurrent inserts.
pub fn get_all_public_ids_paged(
    conn: &Connection,
    level: ResourceLevel,
    since: u64,
    limit: u64,
) -> StratumResult<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut statement = conn
        .prepare_cached(
            "SELECT publicId FROM Resources WHERE resourceType=?1 \
             ORDER BY internalId LIMIT ?2 OFFSET ?3",
        )
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![level.to_db(), limit as i64, since as i64], |row| {
            row.get(0)
        })
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

/// Internal ids of every resource at a level; used by the reprojection.
pub fn get_all_internal_ids(
    conn: &Connection,
    level: ResourceLevel,
) -> StratumResult<Vec<i64>> {
    let mut statement = conn
        .prepare_cached("SELECT internalId FROM Resources WHERE resourceType=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![level.to_db()], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

/// The single `DELETE` behind the whole deletion cascade; triggers do the
/// rest. Returns the number of rows removed by the statement itself
/// (0 when the resource does not exist, in which case no trigger fired).
pub fn delete_resource(conn: &Connection, id: i64) -> StratumResult<usize> {
    let mut statement = conn
        .prepare_cached("DELETE FROM Resources WHERE internalId=?1")
        .map_err(db_err)?;
    statement.execute(params![id]).map_err(db_err)
}
