//! Blob storage collaborator.

use crate::errors::StratumResult;
use crate::models::AttachmentType;

/// The file-blob store. The index only references blobs by UUID and
/// content type; the single read path is the v5→v6 reprojection, which
/// needs the cached DICOM-JSON attachments back.
pub trait IStorageArea {
    fn read(&self, uuid: &str, content_type: AttachmentType) -> StratumResult<Vec<u8>>;

    fn remove(&self, uuid: &str, content_type: AttachmentType) -> StratumResult<()>;
}
