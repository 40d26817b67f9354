//! The four-level resource hierarchy.

use serde::{Deserialize, Serialize};

use crate::errors::{StratumError, StratumResult};

/// Level of a resource in the patient/study/series/instance forest.
///
/// The discriminants are the database encoding and are ordered so that a
/// larger value is deeper in the hierarchy (closer to instances). This
/// ordering is load-bearing for the remaining-ancestor tie-break.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
pub enum ResourceLevel {
    Patient = 1,
    Study = 2,
    Series = 3,
    Instance = 4,
}

impl ResourceLevel {
    pub const ALL: [ResourceLevel; 4] = [
        ResourceLevel::Patient,
        ResourceLevel::Study,
        ResourceLevel::Series,
        ResourceLevel::Instance,
    ];

    pub fn to_db(self) -> i64 {
        self as i64
    }

    pub fn from_db(value: i64) -> StratumResult<ResourceLevel> {
        match value {
            1 => Ok(ResourceLevel::Patient),
            2 => Ok(ResourceLevel::Study),
            3 => Ok(ResourceLevel::Series),
            4 => Ok(ResourceLevel::Instance),
            other => Err(StratumError::Corruption {
                details: format!("unknown resource level in database: {other}"),
            }),
        }
    }

    /// The level immediately above, if any.
    pub fn parent(self) -> Option<ResourceLevel> {
        match self {
            ResourceLevel::Patient => None,
            ResourceLevel::Study => Some(ResourceLevel::Patient),
            ResourceLevel::Series => Some(ResourceLevel::Study),
            ResourceLevel::Instance => Some(ResourceLevel::Series),
        }
    }

    /// The level immediately below, if any.
    pub fn child(self) -> Option<ResourceLevel> {
        match self {
            ResourceLevel::Patient => Some(ResourceLevel::Study),
            ResourceLevel::Study => Some(ResourceLevel::Series),
            ResourceLevel::Series => Some(ResourceLevel::Instance),
            ResourceLevel::Instance => None,
        }
    }

    /// Alias used when building lookup SQL.
    pub fn sql_alias(self) -> &'static str {
        match self {
            ResourceLevel::Patient => "patients",
            ResourceLevel::Study => "studies",
            ResourceLevel::Series => "series",
            ResourceLevel::Instance => "instances",
        }
    }
}
