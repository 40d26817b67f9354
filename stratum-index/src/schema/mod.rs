//! Database schema: bootstrap script and the out-of-band size-trigger
//! installation.

use stratum_core::models::GlobalPropertyId;
use stratum_core::StratumResult;

use crate::connection::IndexConnection;
use crate::queries::globals;

/// Version written by a fresh bootstrap; also the upgrade target.
pub const SCHEMA_VERSION: u32 = 6;

/// Oldest schema version this build can upgrade from.
pub const MINIMUM_SCHEMA_VERSION: u32 = 3;

/// Full schema of version 6: tables, indices, deletion triggers, and the
/// recycling trigger. The attachment-size aggregation lives in a separate
/// script (see [`install_size_triggers`]) because it was introduced as an
/// intra-version refinement and is tracked by its own flag property.
const BOOTSTRAP: &str = "
CREATE TABLE GlobalProperties(
       property INTEGER PRIMARY KEY,
       value TEXT);

CREATE TABLE Resources(
       internalId INTEGER PRIMARY KEY AUTOINCREMENT,
       resourceType INTEGER NOT NULL,
       publicId TEXT NOT NULL,
       parentId INTEGER REFERENCES Resources(internalId) ON DELETE CASCADE);

CREATE TABLE MainDicomTags(
       id INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE,
       tagGroup INTEGER NOT NULL,
       tagElement INTEGER NOT NULL,
       value TEXT,
       PRIMARY KEY(id, tagGroup, tagElement));

CREATE TABLE DicomIdentifiers(
       id INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE,
       tagGroup INTEGER NOT NULL,
       tagElement INTEGER NOT NULL,
       value TEXT,
       PRIMARY KEY(id, tagGroup, tagElement));

CREATE TABLE Metadata(
       id INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE,
       type INTEGER NOT NULL,
       value TEXT,
       PRIMARY KEY(id, type));

CREATE TABLE AttachedFiles(
       id INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE,
       fileType INTEGER NOT NULL,
       uuid TEXT NOT NULL,
       compressedSize INTEGER NOT NULL,
       uncompressedSize INTEGER NOT NULL,
       compressionType INTEGER NOT NULL,
       uncompressedMD5 TEXT,
       compressedMD5 TEXT,
       PRIMARY KEY(id, fileType));

CREATE TABLE Changes(
       seq INTEGER PRIMARY KEY AUTOINCREMENT,
       changeType INTEGER NOT NULL,
       publicId TEXT NOT NULL,
       resourceType INTEGER NOT NULL,
       date TEXT NOT NULL);

CREATE TABLE ExportedResources(
       seq INTEGER PRIMARY KEY AUTOINCREMENT,
       resourceType INTEGER NOT NULL,
       publicId TEXT NOT NULL,
       remoteModality TEXT NOT NULL,
       patientId TEXT,
       studyInstanceUid TEXT,
       seriesInstanceUid TEXT,
       sopInstanceUid TEXT,
       date TEXT NOT NULL);

CREATE TABLE PatientRecyclingOrder(
       seq INTEGER PRIMARY KEY AUTOINCREMENT,
       patientId INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE);

CREATE UNIQUE INDEX PublicIndex ON Resources(publicId);
CREATE INDEX ChildrenIndex ON Resources(parentId);
CREATE INDEX ResourceTypeIndex ON Resources(resourceType);
CREATE INDEX MainDicomTagsIndex ON MainDicomTags(id);
CREATE INDEX DicomIdentifiersIndexId ON DicomIdentifiers(id);
CREATE INDEX DicomIdentifiersIndexTag ON DicomIdentifiers(tagGroup, tagElement);
CREATE INDEX DicomIdentifiersIndexValues ON DicomIdentifiers(tagGroup, tagElement, value);
CREATE INDEX MetadataIndex ON Metadata(id);
CREATE INDEX AttachedFilesIndex ON AttachedFiles(id);
CREATE INDEX PatientRecyclingIndex ON PatientRecyclingOrder(patientId);

CREATE TRIGGER AttachedFileDeleted
AFTER DELETE ON AttachedFiles
BEGIN
  SELECT SignalFileDeleted(old.uuid, old.fileType, old.uncompressedSize,
                           old.compressionType, old.compressedSize,
                           old.uncompressedMD5, old.compressedMD5);
END;

CREATE TRIGGER ResourceDeleted
AFTER DELETE ON Resources
BEGIN
  SELECT SignalResourceDeleted(old.publicId, old.resourceType);
  SELECT SignalRemainingAncestor(parent.publicId, parent.resourceType)
     FROM Resources AS parent
     WHERE parent.internalId = old.parentId
       AND NOT EXISTS (SELECT 1 FROM Resources WHERE parentId = old.parentId);
END;

CREATE TRIGGER PatientAdded
AFTER INSERT ON Resources
FOR EACH ROW WHEN new.resourceType = 1
BEGIN
  INSERT INTO PatientRecyclingOrder VALUES(NULL, new.internalId);
END;
";

/// Aggregate maintenance for attachment sizes: `GlobalIntegers` key 0
/// tracks the total compressed size, key 1 the total uncompressed size.
const SIZE_TRIGGERS: &str = "
CREATE TABLE GlobalIntegers(
       key INTEGER PRIMARY KEY,
       value INTEGER);

INSERT INTO GlobalIntegers
SELECT 0, IFNULL(SUM(compressedSize), 0) FROM AttachedFiles;

INSERT INTO GlobalIntegers
SELECT 1, IFNULL(SUM(uncompressedSize), 0) FROM AttachedFiles;

CREATE TRIGGER AttachedFileIncrementSize
AFTER INSERT ON AttachedFiles
BEGIN
  UPDATE GlobalIntegers SET value = value + new.compressedSize WHERE key = 0;
  UPDATE GlobalIntegers SET value = value + new.uncompressedSize WHERE key = 1;
END;

CREATE TRIGGER AttachedFileDecrementSize
AFTER DELETE ON AttachedFiles
BEGIN
  UPDATE GlobalIntegers SET value = value - old.compressedSize WHERE key = 0;
  UPDATE GlobalIntegers SET value = value - old.uncompressedSize WHERE key = 1;
END;
";

/// Create the full schema and stamp it with the current version. The
/// caller provides the surrounding transaction.
pub fn bootstrap(conn: &IndexConnection) -> StratumResult<()> {
    tracing::info!(version = SCHEMA_VERSION, "creating the database schema");
    conn.execute(BOOTSTRAP)?;
    globals::set_global_property(
        conn.raw(),
        GlobalPropertyId::SCHEMA_VERSION,
        &SCHEMA_VERSION.to_string(),
    )
}

/// Install the size-aggregation triggers if the tracking property says
/// they are absent. Runs inside the caller's transaction; does not bump
/// the schema version.
pub fn ensure_size_triggers(conn: &IndexConnection) -> StratumResult<()> {
    let installed =
        globals::lookup_global_property(conn.raw(), GlobalPropertyId::SIZE_TRIGGERS_INSTALLED)?;

    if installed.as_deref() == Some("1") {
        return Ok(());
    }

    tracing::info!("installing the attachment-size aggregation triggers");
    conn.execute(SIZE_TRIGGERS)?;
    globals::set_global_property(conn.raw(), GlobalPropertyId::SIZE_TRIGGERS_INSTALLED, "1")
}
