//! Shared fixtures: a listener that records every side effect, and
//! attachment builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use stratum_core::models::{
    Attachment, AttachmentType, ChangeEvent, CompressionScheme, ResourceLevel,
};
use stratum_core::traits::IDatabaseListener;
use stratum_core::{MainTagsRegistry, StratumError, StratumResult};
use stratum_index::IndexEngine;

/// Everything the engine delivered after commits.
#[derive(Default)]
pub struct Events {
    pub deleted_files: Vec<Attachment>,
    pub changes: Vec<ChangeEvent>,
    pub remaining_ancestors: Vec<(ResourceLevel, String)>,
    /// When true, every file-deletion callback fails, simulating a
    /// broken storage area.
    pub fail_file_deletion: bool,
}

impl Events {
    pub fn deleted_uuids(&self) -> Vec<String> {
        self.deleted_files.iter().map(|a| a.uuid.clone()).collect()
    }

    pub fn reset(&mut self) {
        self.deleted_files.clear();
        self.changes.clear();
        self.remaining_ancestors.clear();
    }
}

pub struct RecordingListener {
    events: Arc<Mutex<Events>>,
}

impl IDatabaseListener for RecordingListener {
    fn signal_file_deleted(&mut self, attachment: &Attachment) -> StratumResult<()> {
        let mut events = self.events.lock().unwrap();
        if events.fail_file_deletion {
            return Err(StratumError::StorageAreaFailure {
                details: format!("cannot remove {}", attachment.uuid),
            });
        }
        events.deleted_files.push(attachment.clone());
        Ok(())
    }

    fn signal_change(&mut self, change: &ChangeEvent) {
        self.events.lock().unwrap().changes.push(change.clone());
    }

    fn signal_remaining_ancestor(&mut self, level: ResourceLevel, public_id: &str) {
        self.events
            .lock()
            .unwrap()
            .remaining_ancestors
            .push((level, public_id.to_owned()));
    }
}

/// In-memory engine with the default tag registry and a recording
/// listener.
pub fn open_engine() -> (IndexEngine, Arc<Mutex<Events>>) {
    let events = Arc::new(Mutex::new(Events::default()));
    let listener = Box::new(RecordingListener {
        events: Arc::clone(&events),
    });
    let engine =
        IndexEngine::open_in_memory(listener, Arc::new(MainTagsRegistry::with_defaults()))
            .unwrap();
    (engine, events)
}

pub fn dicom_attachment(uuid: &str, size: u64) -> Attachment {
    Attachment::uncompressed(uuid, AttachmentType::Dicom, size, "md5")
}

pub fn compressed_attachment(uuid: &str, uncompressed: u64, compressed: u64) -> Attachment {
    Attachment {
        uuid: uuid.to_owned(),
        content_type: AttachmentType::Dicom,
        uncompressed_size: uncompressed,
        uncompressed_md5: "md5-plain".to_owned(),
        compression: CompressionScheme::Zlib,
        compressed_size: compressed,
        compressed_md5: "md5-zlib".to_owned(),
    }
}

/// Build the chain patient → study → series → instance with the given
/// public ids; returns the internal ids in the same order.
pub fn build_chain(engine: &IndexEngine, ids: [&str; 4]) -> [i64; 4] {
    let patient = engine
        .create_resource(ids[0], ResourceLevel::Patient)
        .unwrap();
    let study = engine.create_resource(ids[1], ResourceLevel::Study).unwrap();
    let series = engine.create_resource(ids[2], ResourceLevel::Series).unwrap();
    let instance = engine
        .create_resource(ids[3], ResourceLevel::Instance)
        .unwrap();

    engine.attach_child(patient, study).unwrap();
    engine.attach_child(study, series).unwrap();
    engine.attach_child(series, instance).unwrap();

    [patient, study, series, instance]
}
