//! Constraints fed to the structured lookup engine.

use serde::{Deserialize, Serialize};

use crate::dicom::tag::DicomTag;
use crate::models::resource::ResourceLevel;

/// Comparison applied to one identifier tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConstraintOp {
    /// `value = values[0]`
    Equal,
    /// `values[0] <= value <= values[1]`
    Range,
    /// DICOM wildcard match on `values[0]` (`*` and `?`).
    Wildcard,
    /// `value IN values`
    List,
}

/// One conjunct of a structured lookup, scoped to a hierarchy level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConstraint {
    pub level: ResourceLevel,
    pub tag: DicomTag,
    pub op: ConstraintOp,
    pub values: Vec<String>,
    /// When false, both sides of the comparison are lowercased.
    pub case_sensitive: bool,
    /// When false, resources lacking the tag also match.
    pub mandatory: bool,
}

impl DatabaseConstraint {
    pub fn equal(level: ResourceLevel, tag: DicomTag, value: impl Into<String>) -> Self {
        DatabaseConstraint {
            level,
            tag,
            op: ConstraintOp::Equal,
            values: vec![value.into()],
            case_sensitive: true,
            mandatory: true,
        }
    }

    pub fn wildcard(level: ResourceLevel, tag: DicomTag, pattern: impl Into<String>) -> Self {
        DatabaseConstraint {
            level,
            tag,
            op: ConstraintOp::Wildcard,
            values: vec![pattern.into()],
            case_sensitive: true,
            mandatory: true,
        }
    }

    pub fn range(
        level: ResourceLevel,
        tag: DicomTag,
        lower: impl Into<String>,
        upper: impl Into<String>,
    ) -> Self {
        DatabaseConstraint {
            level,
            tag,
            op: ConstraintOp::Range,
            values: vec![lower.into(), upper.into()],
            case_sensitive: true,
            mandatory: true,
        }
    }

    pub fn list(level: ResourceLevel, tag: DicomTag, values: Vec<String>) -> Self {
        DatabaseConstraint {
            level,
            tag,
            op: ConstraintOp::List,
            values,
            case_sensitive: true,
            mandatory: true,
        }
    }
}
