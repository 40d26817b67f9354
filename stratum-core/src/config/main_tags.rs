//! Registry of the DICOM tags projected onto indexed columns.
//!
//! Created once at startup and passed explicitly to the components that
//! project or reproject tags. Mutated only at configuration time; read
//! from every ingestion and lookup path, hence the reader-writer lock.

use std::collections::BTreeSet;
use std::sync::RwLock;

use crate::dicom::tag::{self, DicomTag};
use crate::errors::{StratumError, StratumResult};
use crate::models::resource::ResourceLevel;

/// WARNING: these default lists are frozen. Databases indexed by older
/// builds store projections under their signatures; changing an entry
/// silently invalidates those projections.
const DEFAULT_PATIENT_MAIN_TAGS: &[DicomTag] = &[
    tag::TAG_PATIENT_NAME,
    tag::TAG_PATIENT_BIRTH_DATE,
    tag::TAG_PATIENT_SEX,
    tag::TAG_OTHER_PATIENT_IDS,
    tag::TAG_PATIENT_ID,
];

const DEFAULT_STUDY_MAIN_TAGS: &[DicomTag] = &[
    tag::TAG_STUDY_DATE,
    tag::TAG_STUDY_TIME,
    tag::TAG_STUDY_ID,
    tag::TAG_STUDY_DESCRIPTION,
    tag::TAG_ACCESSION_NUMBER,
    tag::TAG_STUDY_INSTANCE_UID,
    tag::TAG_REQUESTED_PROCEDURE_DESCRIPTION,
    tag::TAG_INSTITUTION_NAME,
    tag::TAG_REQUESTING_PHYSICIAN,
    tag::TAG_REFERRING_PHYSICIAN_NAME,
];

const DEFAULT_SERIES_MAIN_TAGS: &[DicomTag] = &[
    tag::TAG_SERIES_DATE,
    tag::TAG_SERIES_TIME,
    tag::TAG_MODALITY,
    tag::TAG_MANUFACTURER,
    tag::TAG_STATION_NAME,
    tag::TAG_SERIES_DESCRIPTION,
    tag::TAG_BODY_PART_EXAMINED,
    tag::TAG_SEQUENCE_NAME,
    tag::TAG_PROTOCOL_NAME,
    tag::TAG_SERIES_NUMBER,
    tag::TAG_CARDIAC_NUMBER_OF_IMAGES,
    tag::TAG_IMAGES_IN_ACQUISITION,
    tag::TAG_NUMBER_OF_TEMPORAL_POSITIONS,
    tag::TAG_NUMBER_OF_SLICES,
    tag::TAG_NUMBER_OF_TIME_SLICES,
    tag::TAG_SERIES_INSTANCE_UID,
    tag::TAG_IMAGE_ORIENTATION_PATIENT,
    tag::TAG_SERIES_TYPE,
    tag::TAG_OPERATOR_NAME,
    tag::TAG_PERFORMED_PROCEDURE_STEP_DESCRIPTION,
    tag::TAG_ACQUISITION_DEVICE_PROCESSING_DESCRIPTION,
    tag::TAG_CONTRAST_BOLUS_AGENT,
];

const DEFAULT_INSTANCE_MAIN_TAGS: &[DicomTag] = &[
    tag::TAG_INSTANCE_CREATION_DATE,
    tag::TAG_INSTANCE_CREATION_TIME,
    tag::TAG_ACQUISITION_NUMBER,
    tag::TAG_IMAGE_INDEX,
    tag::TAG_INSTANCE_NUMBER,
    tag::TAG_NUMBER_OF_FRAMES,
    tag::TAG_TEMPORAL_POSITION_IDENTIFIER,
    tag::TAG_SOP_INSTANCE_UID,
    tag::TAG_IMAGE_POSITION_PATIENT,
    tag::TAG_IMAGE_COMMENTS,
    tag::TAG_IMAGE_ORIENTATION_PATIENT,
];

/// Identifier tags are frozen independently of the main-tag sets: they
/// define the shape of the lookup index itself.
pub fn identifier_tags(level: ResourceLevel) -> &'static [DicomTag] {
    match level {
        ResourceLevel::Patient => &[
            tag::TAG_PATIENT_ID,
            tag::TAG_PATIENT_NAME,
            tag::TAG_PATIENT_BIRTH_DATE,
        ],
        ResourceLevel::Study => &[
            tag::TAG_STUDY_INSTANCE_UID,
            tag::TAG_ACCESSION_NUMBER,
            tag::TAG_STUDY_DESCRIPTION,
            tag::TAG_STUDY_DATE,
        ],
        ResourceLevel::Series => &[tag::TAG_SERIES_INSTANCE_UID],
        ResourceLevel::Instance => &[tag::TAG_SOP_INSTANCE_UID],
    }
}

#[derive(Default)]
struct Inner {
    patients: BTreeSet<DicomTag>,
    studies: BTreeSet<DicomTag>,
    series: BTreeSet<DicomTag>,
    instances: BTreeSet<DicomTag>,
    all: BTreeSet<DicomTag>,
}

impl Inner {
    fn level(&self, level: ResourceLevel) -> &BTreeSet<DicomTag> {
        match level {
            ResourceLevel::Patient => &self.patients,
            ResourceLevel::Study => &self.studies,
            ResourceLevel::Series => &self.series,
            ResourceLevel::Instance => &self.instances,
        }
    }

    fn level_mut(&mut self, level: ResourceLevel) -> &mut BTreeSet<DicomTag> {
        match level {
            ResourceLevel::Patient => &mut self.patients,
            ResourceLevel::Study => &mut self.studies,
            ResourceLevel::Series => &mut self.series,
            ResourceLevel::Instance => &mut self.instances,
        }
    }

    fn add(&mut self, tag: DicomTag, level: ResourceLevel) -> StratumResult<()> {
        if !self.level_mut(level).insert(tag) {
            return Err(StratumError::MainDicomTagsMultiplyDefined {
                tag: tag.format(),
            });
        }
        self.all.insert(tag);
        Ok(())
    }
}

/// The per-level sets of main DICOM tags, plus their union.
pub struct MainTagsRegistry {
    inner: RwLock<Inner>,
}

impl MainTagsRegistry {
    /// An empty registry; most callers want [`MainTagsRegistry::with_defaults`].
    pub fn new() -> Self {
        MainTagsRegistry {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// A registry preloaded with the built-in per-level tag sets.
    pub fn with_defaults() -> Self {
        let registry = MainTagsRegistry::new();
        registry.load_defaults();
        registry
    }

    /// Install the built-in per-level tag sets.
    pub fn load_defaults(&self) {
        let mut inner = self.inner.write().expect("main tags lock poisoned");
        *inner = Inner::default();

        let defaults = [
            (ResourceLevel::Patient, DEFAULT_PATIENT_MAIN_TAGS),
            (ResourceLevel::Study, DEFAULT_STUDY_MAIN_TAGS),
            (ResourceLevel::Series, DEFAULT_SERIES_MAIN_TAGS),
            (ResourceLevel::Instance, DEFAULT_INSTANCE_MAIN_TAGS),
        ];

        for (level, tags) in defaults {
            for &tag in tags {
                inner
                    .add(tag, level)
                    .expect("built-in tag lists contain a duplicate");
            }
        }
    }

    /// Extend the set for a level. Adding the same tag twice at the same
    /// level fails.
    pub fn add(&self, tag: DicomTag, level: ResourceLevel) -> StratumResult<()> {
        let mut inner = self.inner.write().expect("main tags lock poisoned");
        inner.add(tag, level)
    }

    pub fn get_by_level(&self, level: ResourceLevel) -> BTreeSet<DicomTag> {
        let inner = self.inner.read().expect("main tags lock poisoned");
        inner.level(level).clone()
    }

    pub fn get_all(&self) -> BTreeSet<DicomTag> {
        let inner = self.inner.read().expect("main tags lock poisoned");
        inner.all.clone()
    }

    pub fn is_main_tag(&self, tag: DicomTag, level: ResourceLevel) -> bool {
        let inner = self.inner.read().expect("main tags lock poisoned");
        inner.level(level).contains(&tag)
    }

    /// Stable signature of a level's tag set: the `GGGG,EEEE` identifiers,
    /// sorted lexicographically, joined by `;`.
    pub fn signature_of(&self, level: ResourceLevel) -> String {
        let inner = self.inner.read().expect("main tags lock poisoned");

        let mut ids: Vec<String> = inner.level(level).iter().map(DicomTag::format).collect();
        ids.sort();
        ids.join(";")
    }
}

impl Default for MainTagsRegistry {
    fn default() -> Self {
        MainTagsRegistry::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_level() {
        let registry = MainTagsRegistry::with_defaults();
        for level in ResourceLevel::ALL {
            assert!(!registry.get_by_level(level).is_empty());
        }
        assert!(registry.is_main_tag(tag::TAG_PATIENT_ID, ResourceLevel::Patient));
        assert!(!registry.is_main_tag(tag::TAG_PATIENT_ID, ResourceLevel::Study));
    }

    #[test]
    fn double_add_fails() {
        let registry = MainTagsRegistry::with_defaults();
        let custom = DicomTag::new(0x0008, 0x1040);

        registry.add(custom, ResourceLevel::Study).unwrap();
        let err = registry.add(custom, ResourceLevel::Study).unwrap_err();
        assert!(matches!(
            err,
            StratumError::MainDicomTagsMultiplyDefined { .. }
        ));

        // The same tag at another level is fine.
        registry.add(custom, ResourceLevel::Series).unwrap();
    }

    #[test]
    fn signature_is_sorted_and_stable() {
        let registry = MainTagsRegistry::with_defaults();
        let signature = registry.signature_of(ResourceLevel::Patient);
        assert_eq!(
            signature,
            "0010,0010;0010,0020;0010,0030;0010,0040;0010,1000"
        );

        let mut parts: Vec<&str> = signature.split(';').collect();
        let sorted = {
            let mut s = parts.clone();
            s.sort();
            s
        };
        assert_eq!(parts, sorted);
        parts.dedup();
        assert_eq!(parts.len(), 5);
    }
}
