//! Tag projections: `MainDicomTags` for display, `DicomIdentifiers` for
//! structured lookup. Identifier values are stored normalized.

use rusqlite::{params, Connection};

use stratum_core::dicom::{normalize_identifier, DicomMap, DicomTag};
use stratum_core::StratumResult;

use crate::db_err;

pub fn set_main_dicom_tag(
    conn: &Connection,
    id: i64,
    tag: DicomTag,
    value: &str,
) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("INSERT OR REPLACE INTO MainDicomTags VALUES(?1, ?2, ?3, ?4)")
        .map_err(db_err)?;
    statement
        .execute(params![id, tag.group, tag.element, value])
        .map_err(db_err)?;
    Ok(())
}

/// The value is normalized here, so every row of `DicomIdentifiers` obeys
/// the lookup normalization invariant by construction.
pub fn set_identifier_tag(
    conn: &Connection,
    id: i64,
    tag: DicomTag,
    value: &str,
) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("INSERT OR REPLACE INTO DicomIdentifiers VALUES(?1, ?2, ?3, ?4)")
        .map_err(db_err)?;
    statement
        .execute(params![id, tag.group, tag.element, normalize_identifier(value)])
        .map_err(db_err)?;
    Ok(())
}

/// Remove the projections of a resource from both tables; the first step
/// of a reprojection.
pub fn clear_main_dicom_tags(conn: &Connection, id: i64) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("DELETE FROM DicomIdentifiers WHERE id=?1")
        .map_err(db_err)?;
    statement.execute(params![id]).map_err(db_err)?;

    let mut statement = conn
        .prepare_cached("DELETE FROM MainDicomTags WHERE id=?1")
        .map_err(db_err)?;
    statement.execute(params![id]).map_err(db_err)?;
    Ok(())
}

pub fn get_main_dicom_tags(conn: &Connection, id: i64) -> StratumResult<DicomMap> {
    let mut statement = conn
        .prepare_cached("SELECT tagGroup, tagElement, value FROM MainDicomTags WHERE id=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| {
            Ok((
                row.get::<_, u16>(0)?,
                row.get::<_, u16>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(db_err)?;

    let mut map = DicomMap::new();
    for row in rows {
        let (group, element, value) = row.map_err(db_err)?;
        map.set_value(DicomTag::new(group, element), value);
    }
    Ok(map)
}
