//! Projection of a parsed tag map onto the indexed columns of a resource.
//!
//! The main-tag projection follows the registry's per-level sets; the
//! identifier projection follows the frozen identifier sets and stores
//! normalized values.

use rusqlite::Connection;

use stratum_core::config::main_tags::identifier_tags;
use stratum_core::dicom::DicomMap;
use stratum_core::models::ResourceLevel;
use stratum_core::{MainTagsRegistry, StratumResult};

use crate::queries::dicom_tags;

/// Write the projections of `map` for a resource. Existing rows for the
/// projected tags are replaced; call
/// [`dicom_tags::clear_main_dicom_tags`] first for a full reprojection.
pub fn store_resource_content(
    conn: &Connection,
    id: i64,
    level: ResourceLevel,
    map: &DicomMap,
    registry: &MainTagsRegistry,
) -> StratumResult<()> {
    let main_tags = registry.get_by_level(level);

    for (&tag, value) in map {
        if main_tags.contains(&tag) {
            dicom_tags::set_main_dicom_tag(conn, id, tag, value)?;
        }
    }

    for &tag in identifier_tags(level) {
        if let Some(value) = map.get_value(tag) {
            dicom_tags::set_identifier_tag(conn, id, tag, value)?;
        }
    }

    Ok(())
}
