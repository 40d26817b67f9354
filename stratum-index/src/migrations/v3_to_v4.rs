//! v3 → v4: introduce the exported-resource log.

use rusqlite::Connection;

use stratum_core::StratumResult;

use crate::db_err;

pub fn migrate(conn: &Connection) -> StratumResult<()> {
    conn.execute_batch(
        "
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

        UPDATE GlobalProperties SET value='4' WHERE property=1;
        ",
    )
    .map_err(db_err)?;
    Ok(())
}
