//! Ordered schema upgrades.
//!
//! The supported window is versions 3 through 6; 6 is the target. Each
//! step runs in its own transaction and ends by writing the new version,
//! so a failed upgrade leaves the database at the last completed step.

pub mod v3_to_v4;
pub mod v4_to_v5;
pub mod v5_to_v6;

use crate::schema::{MINIMUM_SCHEMA_VERSION, SCHEMA_VERSION};
use stratum_core::{StratumError, StratumResult};

/// Fail unless `version` lies inside the supported window.
pub fn check_schema_version(version: u32) -> StratumResult<()> {
    if (MINIMUM_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&version) {
        Ok(())
    } else {
        Err(StratumError::IncompatibleSchema {
            found: version,
            minimum: MINIMUM_SCHEMA_VERSION,
            maximum: SCHEMA_VERSION,
        })
    }
}
