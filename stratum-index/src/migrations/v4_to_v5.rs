//! v4 → v5: split the lookup identifiers out of the display tags.
//!
//! Before v5 the identifier tags lived in `MainDicomTags` and lookups
//! scanned it. v5 moves them into the dedicated, indexed
//! `DicomIdentifiers` table. Values are moved as stored; the v5 → v6
//! reprojection re-normalizes them.

use rusqlite::Connection;

use stratum_core::StratumResult;

use crate::db_err;

// The frozen identifier tags, as (group, element) decimal pairs:
// PatientID (0010,0020), PatientName (0010,0010), PatientBirthDate
// (0010,0030), StudyInstanceUID (0020,000d), AccessionNumber (0008,0050),
// StudyDescription (0008,1030), StudyDate (0008,0020), SeriesInstanceUID
// (0020,000e), SOPInstanceUID (0008,0018).
const IDENTIFIER_TAG_FILTER: &str = "
       (tagGroup = 16 AND tagElement = 32)
    OR (tagGroup = 16 AND tagElement = 16)
    OR (tagGroup = 16 AND tagElement = 48)
    OR (tagGroup = 32 AND tagElement = 13)
    OR (tagGroup = 8  AND tagElement = 80)
    OR (tagGroup = 8  AND tagElement = 4144)
    OR (tagGroup = 8  AND tagElement = 32)
    OR (tagGroup = 32 AND tagElement = 14)
    OR (tagGroup = 8  AND tagElement = 24)";

pub fn migrate(conn: &Connection) -> StratumResult<()> {
    let script = format!(
        "
        CREATE TABLE DicomIdentifiers(
               id INTEGER NOT NULL REFERENCES Resources(internalId) ON DELETE CASCADE,
               tagGroup INTEGER NOT NULL,
               tagElement INTEGER NOT NULL,
               value TEXT,
               PRIMARY KEY(id, tagGroup, tagElement));

        CREATE INDEX DicomIdentifiersIndexId ON DicomIdentifiers(id);
        CREATE INDEX DicomIdentifiersIndexTag ON DicomIdentifiers(tagGroup, tagElement);
        CREATE INDEX DicomIdentifiersIndexValues ON DicomIdentifiers(tagGroup, tagElement, value);

        INSERT INTO DicomIdentifiers
        SELECT id, tagGroup, tagElement, value FROM MainDicomTags
        WHERE {IDENTIFIER_TAG_FILTER};

        DELETE FROM MainDicomTags WHERE {IDENTIFIER_TAG_FILTER};

        UPDATE GlobalProperties SET value='5' WHERE property=1;
        "
    );

    conn.execute_batch(&script).map_err(db_err)?;
    Ok(())
}
