//! v5 → v6: no schema change. The main-tag sets grew, so every resource
//! is reprojected from its cached DICOM-JSON attachment, which also
//! re-normalizes the identifier index. This is the one migration that
//! needs the storage-area collaborator.

use rusqlite::Connection;

use stratum_core::dicom::DicomMap;
use stratum_core::models::{AttachmentType, ResourceLevel};
use stratum_core::traits::IStorageArea;
use stratum_core::{MainTagsRegistry, StratumError, StratumResult};

use crate::content;
use crate::queries::{attachments, dicom_tags, resources};

fn reproject_resource(
    conn: &Connection,
    id: i64,
    level: ResourceLevel,
    storage: &dyn IStorageArea,
    registry: &MainTagsRegistry,
) -> StratumResult<bool> {
    let Some(cached) = attachments::lookup_attachment(conn, id, AttachmentType::DicomJson)? else {
        // A store that never ingested the JSON attachment is not corrupt;
        // the resource keeps its old projection.
        tracing::warn!(id, ?level, "no cached DICOM JSON, skipping reprojection");
        return Ok(false);
    };

    let bytes = storage.read(&cached.uuid, AttachmentType::DicomJson)?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| StratumError::Corruption {
            details: format!("cached DICOM JSON of resource {id} is unreadable: {e}"),
        })?;
    let map = DicomMap::from_dicom_json(&json);

    dicom_tags::clear_main_dicom_tags(conn, id)?;
    content::store_resource_content(conn, id, level, &map, registry)?;
    Ok(true)
}

pub fn migrate(
    conn: &Connection,
    storage: &dyn IStorageArea,
    registry: &MainTagsRegistry,
) -> StratumResult<()> {
    let mut reprojected = 0u64;
    let mut skipped = 0u64;

    for level in ResourceLevel::ALL {
        for id in resources::get_all_internal_ids(conn, level)? {
            if reproject_resource(conn, id, level, storage, registry)? {
                reprojected += 1;
            } else {
                skipped += 1;
            }
        }
    }

    tracing::info!(reprojected, skipped, "main DICOM tags reconstructed");

    conn.execute_batch("UPDATE GlobalProperties SET value='6' WHERE property=1")
        .map_err(crate::db_err)?;
    Ok(())
}
