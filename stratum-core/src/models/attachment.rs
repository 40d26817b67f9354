//! Binary artifacts referenced by resources.
//!
//! The index never reads blob bytes: an attachment is a UUID handle into
//! the storage area plus sizing and checksum metadata.

use serde::{Deserialize, Serialize};

use crate::errors::{StratumError, StratumResult};

/// What an attachment contains. Values below 1024 are reserved for the
/// index itself; user-defined types live at 1024 and above.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum AttachmentType {
    Dicom,
    DicomJson,
    User(i64),
}

impl AttachmentType {
    pub fn to_db(self) -> i64 {
        match self {
            AttachmentType::Dicom => 1,
            AttachmentType::DicomJson => 2,
            AttachmentType::User(value) => value,
        }
    }

    pub fn from_db(value: i64) -> StratumResult<AttachmentType> {
        match value {
            1 => Ok(AttachmentType::Dicom),
            2 => Ok(AttachmentType::DicomJson),
            v if v >= 1024 => Ok(AttachmentType::User(v)),
            other => Err(StratumError::Corruption {
                details: format!("unknown attachment type in database: {other}"),
            }),
        }
    }
}

/// How the stored blob is compressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CompressionScheme {
    None = 1,
    Zlib = 2,
}

impl CompressionScheme {
    pub fn to_db(self) -> i64 {
        self as i64
    }

    pub fn from_db(value: i64) -> StratumResult<CompressionScheme> {
        match value {
            1 => Ok(CompressionScheme::None),
            2 => Ok(CompressionScheme::Zlib),
            other => Err(StratumError::Corruption {
                details: format!("unknown compression scheme in database: {other}"),
            }),
        }
    }
}

/// A blob owned by exactly one resource, keyed by content type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub uuid: String,
    pub content_type: AttachmentType,
    pub uncompressed_size: u64,
    pub uncompressed_md5: String,
    pub compression: CompressionScheme,
    pub compressed_size: u64,
    pub compressed_md5: String,
}

impl Attachment {
    /// An uncompressed attachment: both sizes and checksums coincide.
    pub fn uncompressed(
        uuid: impl Into<String>,
        content_type: AttachmentType,
        size: u64,
        md5: impl Into<String>,
    ) -> Self {
        let uuid = uuid.into();
        let md5 = md5.into();
        Attachment {
            uuid,
            content_type,
            uncompressed_size: size,
            uncompressed_md5: md5.clone(),
            compression: CompressionScheme::None,
            compressed_size: size,
            compressed_md5: md5,
        }
    }
}
