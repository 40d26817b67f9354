//! Global property identifiers.

use serde::{Deserialize, Serialize};

/// Key of a row in the global-properties singleton table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct GlobalPropertyId(pub i64);

impl GlobalPropertyId {
    /// Integer schema version; read before any transaction on open.
    pub const SCHEMA_VERSION: GlobalPropertyId = GlobalPropertyId(1);
    /// Monotonic counter backing anonymization identifiers.
    pub const ANONYMIZATION_SEQUENCE: GlobalPropertyId = GlobalPropertyId(3);
    /// "1" once the attachment-size aggregation triggers are installed.
    /// Tracked separately from the schema version.
    pub const SIZE_TRIGGERS_INSTALLED: GlobalPropertyId = GlobalPropertyId(6);

    /// Per-level main-tag signatures, used to detect that stored
    /// projections predate the current registry configuration.
    pub const MAIN_TAGS_SIGNATURE_PATIENT: GlobalPropertyId = GlobalPropertyId(10);
    pub const MAIN_TAGS_SIGNATURE_STUDY: GlobalPropertyId = GlobalPropertyId(11);
    pub const MAIN_TAGS_SIGNATURE_SERIES: GlobalPropertyId = GlobalPropertyId(12);
    pub const MAIN_TAGS_SIGNATURE_INSTANCE: GlobalPropertyId = GlobalPropertyId(13);

    pub const FIRST_USER: GlobalPropertyId = GlobalPropertyId(1024);
}
