//! The exported-resource log.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::{ExportedResource, ResourceLevel};
use stratum_core::StratumResult;

use crate::db_err;

/// Append one export record; returns its sequence number. The record is
/// denormalized on purpose: it must outlive the resource it describes.
pub fn log_exported_resource(
    conn: &Connection,
    resource: &ExportedResource,
) -> StratumResult<i64> {
    let mut statement = conn
        .prepare_cached("INSERT INTO ExportedResources VALUES(NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)")
        .map_err(db_err)?;
    statement
        .execute(params![
            resource.level.to_db(),
            resource.public_id,
            resource.remote_modality,
            resource.patient_id,
            resource.study_instance_uid,
            resource.series_instance_uid,
            resource.sop_instance_uid,
            resource.date,
        ])
        .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

type ExportedRow = (i64, i64, String, String, String, String, String, String, String);

fn exported_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExportedRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        row.get(8)?,
    ))
}

fn build(row: ExportedRow) -> StratumResult<ExportedResource> {
    let (seq, level, public_id, modality, patient, study, series, sop, date) = row;
    Ok(ExportedResource {
        seq,
        level: ResourceLevel::from_db(level)?,
        public_id,
        remote_modality: modality,
        patient_id: patient,
        study_instance_uid: study,
        series_instance_uid: series,
        sop_instance_uid: sop,
        date,
    })
}

/// Page of records with `seq > since`, oldest first.
pub fn get_exported_resources(
    conn: &Connection,
    since: i64,
    max_results: usize,
) -> StratumResult<(Vec<ExportedResource>, bool)> {
    let mut statement = conn
        .prepare_cached(
            "SELECT seq, resourceType, publicId, remoteModality, patientId, \
             studyInstanceUid, seriesInstanceUid, sopInstanceUid, date \
             FROM ExportedResources WHERE seq>?1 ORDER BY seq LIMIT ?2",
        )
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![since, (max_results + 1) as i64], exported_from_row)
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;

    let done = rows.len() <= max_results;
    let mut resources = Vec::with_capacity(rows.len().min(max_results));
    for row in rows.into_iter().take(max_results) {
        resources.push(build(row)?);
    }
    Ok((resources, done))
}

pub fn get_last_exported_resource(conn: &Connection) -> StratumResult<Option<ExportedResource>> {
    let mut statement = conn
        .prepare_cached(
            "SELECT seq, resourceType, publicId, remoteModality, patientId, \
             studyInstanceUid, seriesInstanceUid, sopInstanceUid, date \
             FROM ExportedResources ORDER BY seq DESC LIMIT 1",
        )
        .map_err(db_err)?;
    let row = statement
        .query_row([], exported_from_row)
        .optional()
        .map_err(db_err)?;

    row.map(build).transpose()
}

pub fn clear_exported_resources(conn: &Connection) -> StratumResult<()> {
    conn.execute_batch("DELETE FROM ExportedResources")
        .map_err(db_err)
}
