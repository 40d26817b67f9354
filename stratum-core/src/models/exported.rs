//! Entries of the exported-resource log.

use serde::{Deserialize, Serialize};

use crate::models::resource::ResourceLevel;

/// A record of a resource sent to a remote modality. Historical: it is
/// denormalized and survives the deletion of the resource it describes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedResource {
    pub seq: i64,
    pub level: ResourceLevel,
    pub public_id: String,
    pub remote_modality: String,
    /// RFC 3339 timestamp of the export.
    pub date: String,
    pub patient_id: String,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
}
