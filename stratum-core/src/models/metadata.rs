//! Metadata type identifiers.

use serde::{Deserialize, Serialize};

/// Identifies one metadata slot of a resource. These are wire-stable
/// integers, not a closed enum: front-ends may define their own kinds
/// from `FIRST_USER` upward.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct MetadataKind(pub i64);

impl MetadataKind {
    pub const REMOTE_AET: MetadataKind = MetadataKind(1);
    pub const INDEX_IN_SERIES: MetadataKind = MetadataKind(2);
    pub const MODIFIED_FROM: MetadataKind = MetadataKind(3);
    pub const ANONYMIZED_FROM: MetadataKind = MetadataKind(4);
    pub const LAST_UPDATE: MetadataKind = MetadataKind(5);
    pub const MAIN_TAGS_SIGNATURE: MetadataKind = MetadataKind(6);

    pub const FIRST_USER: MetadataKind = MetadataKind(1024);
}
