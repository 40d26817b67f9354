//! DICOM tag identifiers and the constants the index projects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A DICOM tag, identified by its (group, element) pair.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct DicomTag {
    pub group: u16,
    pub element: u16,
}

impl DicomTag {
    pub const fn new(group: u16, element: u16) -> Self {
        DicomTag { group, element }
    }

    /// Canonical `GGGG,EEEE` rendering, lowercase hex, zero-padded.
    /// This format is what per-level signatures are built from, so it
    /// must never change.
    pub fn format(&self) -> String {
        format!("{:04x},{:04x}", self.group, self.element)
    }

    /// Parse the canonical `GGGG,EEEE` rendering back into a tag.
    pub fn parse(s: &str) -> Option<DicomTag> {
        let (group, element) = s.split_once(',')?;
        Some(DicomTag {
            group: u16::from_str_radix(group.trim(), 16).ok()?,
            element: u16::from_str_radix(element.trim(), 16).ok()?,
        })
    }
}

impl fmt::Display for DicomTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x},{:04x}", self.group, self.element)
    }
}

// Patient
pub const TAG_PATIENT_NAME: DicomTag = DicomTag::new(0x0010, 0x0010);
pub const TAG_PATIENT_ID: DicomTag = DicomTag::new(0x0010, 0x0020);
pub const TAG_PATIENT_BIRTH_DATE: DicomTag = DicomTag::new(0x0010, 0x0030);
pub const TAG_PATIENT_SEX: DicomTag = DicomTag::new(0x0010, 0x0040);
pub const TAG_OTHER_PATIENT_IDS: DicomTag = DicomTag::new(0x0010, 0x1000);

// Study
pub const TAG_STUDY_DATE: DicomTag = DicomTag::new(0x0008, 0x0020);
pub const TAG_STUDY_TIME: DicomTag = DicomTag::new(0x0008, 0x0030);
pub const TAG_STUDY_ID: DicomTag = DicomTag::new(0x0020, 0x0010);
pub const TAG_STUDY_DESCRIPTION: DicomTag = DicomTag::new(0x0008, 0x1030);
pub const TAG_ACCESSION_NUMBER: DicomTag = DicomTag::new(0x0008, 0x0050);
pub const TAG_STUDY_INSTANCE_UID: DicomTag = DicomTag::new(0x0020, 0x000d);
pub const TAG_REQUESTED_PROCEDURE_DESCRIPTION: DicomTag = DicomTag::new(0x0032, 0x1060);
pub const TAG_INSTITUTION_NAME: DicomTag = DicomTag::new(0x0008, 0x0080);
pub const TAG_REQUESTING_PHYSICIAN: DicomTag = DicomTag::new(0x0032, 0x1032);
pub const TAG_REFERRING_PHYSICIAN_NAME: DicomTag = DicomTag::new(0x0008, 0x0090);

// Series
pub const TAG_SERIES_DATE: DicomTag = DicomTag::new(0x0008, 0x0021);
pub const TAG_SERIES_TIME: DicomTag = DicomTag::new(0x0008, 0x0031);
pub const TAG_MODALITY: DicomTag = DicomTag::new(0x0008, 0x0060);
pub const TAG_MANUFACTURER: DicomTag = DicomTag::new(0x0008, 0x0070);
pub const TAG_STATION_NAME: DicomTag = DicomTag::new(0x0008, 0x1010);
pub const TAG_SERIES_DESCRIPTION: DicomTag = DicomTag::new(0x0008, 0x103e);
pub const TAG_BODY_PART_EXAMINED: DicomTag = DicomTag::new(0x0018, 0x0015);
pub const TAG_SEQUENCE_NAME: DicomTag = DicomTag::new(0x0018, 0x0024);
pub const TAG_PROTOCOL_NAME: DicomTag = DicomTag::new(0x0018, 0x1030);
pub const TAG_SERIES_NUMBER: DicomTag = DicomTag::new(0x0020, 0x0011);
pub const TAG_CARDIAC_NUMBER_OF_IMAGES: DicomTag = DicomTag::new(0x0018, 0x1090);
pub const TAG_IMAGES_IN_ACQUISITION: DicomTag = DicomTag::new(0x0020, 0x1002);
pub const TAG_NUMBER_OF_TEMPORAL_POSITIONS: DicomTag = DicomTag::new(0x0020, 0x0105);
pub const TAG_NUMBER_OF_SLICES: DicomTag = DicomTag::new(0x0054, 0x0081);
pub const TAG_NUMBER_OF_TIME_SLICES: DicomTag = DicomTag::new(0x0054, 0x0101);
pub const TAG_SERIES_INSTANCE_UID: DicomTag = DicomTag::new(0x0020, 0x000e);
pub const TAG_IMAGE_ORIENTATION_PATIENT: DicomTag = DicomTag::new(0x0020, 0x0037);
pub const TAG_SERIES_TYPE: DicomTag = DicomTag::new(0x0054, 0x1000);
pub const TAG_OPERATOR_NAME: DicomTag = DicomTag::new(0x0008, 0x1070);
pub const TAG_PERFORMED_PROCEDURE_STEP_DESCRIPTION: DicomTag = DicomTag::new(0x0040, 0x0254);
pub const TAG_ACQUISITION_DEVICE_PROCESSING_DESCRIPTION: DicomTag = DicomTag::new(0x0018, 0x1400);
pub const TAG_CONTRAST_BOLUS_AGENT: DicomTag = DicomTag::new(0x0018, 0x0010);

// Instance
pub const TAG_INSTANCE_CREATION_DATE: DicomTag = DicomTag::new(0x0008, 0x0012);
pub const TAG_INSTANCE_CREATION_TIME: DicomTag = DicomTag::new(0x0008, 0x0013);
pub const TAG_ACQUISITION_NUMBER: DicomTag = DicomTag::new(0x0020, 0x0012);
pub const TAG_IMAGE_INDEX: DicomTag = DicomTag::new(0x0054, 0x1330);
pub const TAG_INSTANCE_NUMBER: DicomTag = DicomTag::new(0x0020, 0x0013);
pub const TAG_NUMBER_OF_FRAMES: DicomTag = DicomTag::new(0x0028, 0x0008);
pub const TAG_TEMPORAL_POSITION_IDENTIFIER: DicomTag = DicomTag::new(0x0020, 0x0100);
pub const TAG_SOP_INSTANCE_UID: DicomTag = DicomTag::new(0x0008, 0x0018);
pub const TAG_IMAGE_POSITION_PATIENT: DicomTag = DicomTag::new(0x0020, 0x0032);
pub const TAG_IMAGE_COMMENTS: DicomTag = DicomTag::new(0x0020, 0x4000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_zero_padded_lowercase() {
        assert_eq!(TAG_STUDY_INSTANCE_UID.format(), "0020,000d");
        assert_eq!(TAG_PATIENT_NAME.format(), "0010,0010");
    }

    #[test]
    fn parse_round_trips() {
        let tag = DicomTag::new(0x0054, 0x1330);
        assert_eq!(DicomTag::parse(&tag.format()), Some(tag));
        assert_eq!(DicomTag::parse("garbage"), None);
    }

    #[test]
    fn ordering_is_group_then_element() {
        assert!(TAG_SOP_INSTANCE_UID < TAG_PATIENT_NAME);
        assert!(TAG_STUDY_INSTANCE_UID < TAG_SERIES_INSTANCE_UID);
    }
}
