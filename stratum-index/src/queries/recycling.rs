//! The patient recycling queue.
//!
//! Invariant: exactly one row per non-protected patient, ordered by the
//! auto-increment sequence. Rows are created by the `PatientAdded`
//! trigger and removed either by protection or by the deletion cascade.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::StratumResult;

use crate::db_err;

/// The patient at the front of the FIFO, optionally skipping one.
pub fn select_patient_to_recycle(
    conn: &Connection,
    avoid: Option<i64>,
) -> StratumResult<Option<i64>> {
    match avoid {
        None => {
            let mut statement = conn
                .prepare_cached(
                    "SELECT patientId FROM PatientRecyclingOrder ORDER BY seq ASC LIMIT 1",
                )
                .map_err(db_err)?;
            statement
                .query_row([], |row| row.get(0))
                .optional()
                .map_err(db_err)
        }
        Some(avoid) => {
            let mut statement = conn
                .prepare_cached(
                    "SELECT patientId FROM PatientRecyclingOrder \
                     WHERE patientId != ?1 ORDER BY seq ASC LIMIT 1",
                )
                .map_err(db_err)?;
            statement
                .query_row(params![avoid], |row| row.get(0))
                .optional()
                .map_err(db_err)
        }
    }
}

/// A patient is protected iff it has no recycling slot.
pub fn is_protected_patient(conn: &Connection, id: i64) -> StratumResult<bool> {
    let mut statement = conn
        .prepare_cached("SELECT 1 FROM PatientRecyclingOrder WHERE patientId = ?1")
        .map_err(db_err)?;
    Ok(!statement.exists(params![id]).map_err(db_err)?)
}

/// Protecting removes the slot; unprotecting appends a fresh slot at the
/// tail. Unprotecting an unprotected patient is a no-op so the patient
/// keeps its position in the queue.
pub fn set_protected_patient(conn: &Connection, id: i64, protected: bool) -> StratumResult<()> {
    if protected {
        let mut statement = conn
            .prepare_cached("DELETE FROM PatientRecyclingOrder WHERE patientId=?1")
            .map_err(db_err)?;
        statement.execute(params![id]).map_err(db_err)?;
    } else if is_protected_patient(conn, id)? {
        let mut statement = conn
            .prepare_cached("INSERT INTO PatientRecyclingOrder VALUES(NULL, ?1)")
            .map_err(db_err)?;
        statement.execute(params![id]).map_err(db_err)?;
    }
    Ok(())
}

/// Promote an accessed patient to the back of the FIFO. No-op for a
/// protected patient (there is no slot to move).
pub fn tag_most_recent_patient(conn: &Connection, id: i64) -> StratumResult<()> {
    let removed = {
        let mut statement = conn
            .prepare_cached("DELETE FROM PatientRecyclingOrder WHERE patientId=?1")
            .map_err(db_err)?;
        statement.execute(params![id]).map_err(db_err)?
    };

    if removed == 0 {
        // Protected: nothing to re-queue.
        return Ok(());
    }

    let mut statement = conn
        .prepare_cached("INSERT INTO PatientRecyclingOrder VALUES(NULL, ?1)")
        .map_err(db_err)?;
    statement.execute(params![id]).map_err(db_err)?;
    Ok(())
}
