//! Entries of the append-only change log.

use serde::{Deserialize, Serialize};

use crate::errors::{StratumError, StratumResult};
use crate::models::resource::ResourceLevel;

/// Kind of a resource state transition. Discriminants are the database
/// encoding and must stay stable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ChangeKind {
    CompletedSeries = 1,
    Deleted = 2,
    NewChildInstance = 3,
    NewInstance = 4,
    NewPatient = 5,
    NewSeries = 6,
    NewStudy = 7,
    StablePatient = 8,
    StableSeries = 9,
    StableStudy = 10,
    UpdatedAttachment = 11,
    UpdatedMetadata = 12,
}

impl ChangeKind {
    pub fn to_db(self) -> i64 {
        self as i64
    }

    pub fn from_db(value: i64) -> StratumResult<ChangeKind> {
        use ChangeKind::*;
        match value {
            1 => Ok(CompletedSeries),
            2 => Ok(Deleted),
            3 => Ok(NewChildInstance),
            4 => Ok(NewInstance),
            5 => Ok(NewPatient),
            6 => Ok(NewSeries),
            7 => Ok(NewStudy),
            8 => Ok(StablePatient),
            9 => Ok(StableSeries),
            10 => Ok(StableStudy),
            11 => Ok(UpdatedAttachment),
            12 => Ok(UpdatedMetadata),
            other => Err(StratumError::Corruption {
                details: format!("unknown change kind in database: {other}"),
            }),
        }
    }
}

/// One row of the change log. The public id may no longer resolve to a
/// live resource once the resource has been deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub seq: i64,
    pub kind: ChangeKind,
    pub level: ResourceLevel,
    pub public_id: String,
    /// RFC 3339 timestamp of the transition.
    pub date: String,
}
