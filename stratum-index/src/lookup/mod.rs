//! The structured lookup engine.
//!
//! A lookup materializes its matches into a `Lookup` temporary table,
//! then either reads the matches back directly or joins down to the
//! instance level to return one representative instance per match.

pub mod formatter;

use rusqlite::{params_from_iter, Connection};

use stratum_core::models::{DatabaseConstraint, ResourceLevel};
use stratum_core::StratumResult;

use crate::db_err;
use formatter::{build_lookup_sql, LookupFormatter};

/// One match of a lookup. `instance` is populated when the caller asked
/// for a representative instance per matching resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupMatch {
    pub public_id: String,
    pub instance: Option<String>,
}

fn answer_with_instances(
    conn: &Connection,
    level: ResourceLevel,
) -> StratumResult<Vec<LookupMatch>> {
    let sql = match level {
        ResourceLevel::Patient => {
            "SELECT patients.publicId, instances.publicId FROM Lookup AS patients \
             INNER JOIN Resources studies ON patients.internalId = studies.parentId \
             INNER JOIN Resources series ON studies.internalId = series.parentId \
             INNER JOIN Resources instances ON series.internalId = instances.parentId \
             GROUP BY patients.publicId"
        }
        ResourceLevel::Study => {
            "SELECT studies.publicId, instances.publicId FROM Lookup AS studies \
             INNER JOIN Resources series ON studies.internalId = series.parentId \
             INNER JOIN Resources instances ON series.internalId = instances.parentId \
             GROUP BY studies.publicId"
        }
        ResourceLevel::Series => {
            "SELECT series.publicId, instances.publicId FROM Lookup AS series \
             INNER JOIN Resources instances ON series.internalId = instances.parentId \
             GROUP BY series.publicId"
        }
        ResourceLevel::Instance => "SELECT publicId, publicId FROM Lookup",
    };

    let mut statement = conn.prepare(sql).map_err(db_err)?;
    let rows = statement
        .query_map([], |row| {
            Ok(LookupMatch {
                public_id: row.get(0)?,
                instance: Some(row.get(1)?),
            })
        })
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

fn answer_without_instances(conn: &Connection) -> StratumResult<Vec<LookupMatch>> {
    let mut statement = conn.prepare("SELECT publicId FROM Lookup").map_err(db_err)?;
    let rows = statement
        .query_map([], |row| {
            Ok(LookupMatch {
                public_id: row.get(0)?,
                instance: None,
            })
        })
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

/// Run a lookup: a conjunction of per-level constraints, resolved to the
/// resources of `query_level`, optionally capped at `limit` matches
/// (0 means unlimited).
pub fn apply_lookup_resources(
    conn: &Connection,
    constraints: &[DatabaseConstraint],
    query_level: ResourceLevel,
    limit: usize,
    fetch_instances: bool,
) -> StratumResult<Vec<LookupMatch>> {
    let mut formatter = LookupFormatter::new();
    let sql = build_lookup_sql(&mut formatter, constraints, query_level, limit)?;

    conn.execute_batch("DROP TABLE IF EXISTS Lookup")
        .map_err(db_err)?;

    let create = format!("CREATE TEMPORARY TABLE Lookup AS {sql}");
    conn.execute(&create, params_from_iter(formatter.into_parameters()))
        .map_err(db_err)?;

    if fetch_instances {
        answer_with_instances(conn, query_level)
    } else {
        answer_without_instances(conn)
    }
}
