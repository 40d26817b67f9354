//! Integration test: the deletion cascade and its notifications.

mod common;

use stratum_core::models::{ChangeKind, ResourceLevel};
use stratum_core::StratumError;

use common::{dicom_attachment, open_engine};

#[test]
fn cascade_deletes_subtree_attachments_and_notifies() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let [patient, _, _, instance] = common::build_chain(&engine, ["P", "S", "E", "I"]);
    engine
        .add_attachment(instance, &common::compressed_attachment("blob-1", 200, 100))
        .unwrap();
    tx.commit().unwrap();

    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(patient).unwrap();
    tx.commit().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.deleted_uuids(), vec!["blob-1"]);

    let mut deleted: Vec<String> = events
        .changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Deleted)
        .map(|c| c.public_id.clone())
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec!["E", "I", "P", "S"]);

    // Root deleted: nothing collapsed onto an ancestor.
    assert!(events.remaining_ancestors.is_empty());

    assert_eq!(engine.get_total_compressed_size().unwrap(), 0);
    assert_eq!(engine.get_resource_count(ResourceLevel::Patient).unwrap(), 0);
    assert_eq!(engine.lookup_resource("I").unwrap(), None);
}

#[test]
fn collapse_reports_deepest_surviving_ancestor() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let [_, _, series, i1] = common::build_chain(&engine, ["P", "S", "E", "I1"]);
    let i2 = engine.create_resource("I2", ResourceLevel::Instance).unwrap();
    engine.attach_child(series, i2).unwrap();
    tx.commit().unwrap();

    // The series keeps a child: no collapse.
    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(i1).unwrap();
    tx.commit().unwrap();
    assert!(events.lock().unwrap().remaining_ancestors.is_empty());

    // Last child removed: the series is the deepest surviving ancestor.
    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(i2).unwrap();
    tx.commit().unwrap();
    assert_eq!(
        events.lock().unwrap().remaining_ancestors,
        vec![(ResourceLevel::Series, "E".to_owned())]
    );
}

#[test]
fn deleting_whole_study_reports_patient_only_when_childless() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let [patient, study_a, _, _] = common::build_chain(&engine, ["P", "SA", "EA", "IA"]);
    let study_b = engine.create_resource("SB", ResourceLevel::Study).unwrap();
    engine.attach_child(patient, study_b).unwrap();
    tx.commit().unwrap();

    // The patient still has SB: no notification.
    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(study_a).unwrap();
    tx.commit().unwrap();
    assert!(events.lock().unwrap().remaining_ancestors.is_empty());

    // Now the patient collapses.
    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(study_b).unwrap();
    tx.commit().unwrap();
    assert_eq!(
        events.lock().unwrap().remaining_ancestors,
        vec![(ResourceLevel::Patient, "P".to_owned())]
    );
}

#[test]
fn deleting_unknown_resource_is_a_noop() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(424242).unwrap();
    tx.commit().unwrap();

    let events = events.lock().unwrap();
    assert!(events.deleted_files.is_empty());
    assert!(events.changes.is_empty());
    assert!(events.remaining_ancestors.is_empty());
}

#[test]
fn deletion_requires_a_transaction() {
    let (engine, _) = open_engine();
    let err = engine.delete_resource(1).unwrap_err();
    assert!(matches!(err, StratumError::BadSequenceOfCalls { .. }));
}

#[test]
fn rollback_discards_the_cascade_and_its_effects() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let [patient, _, _, instance] = common::build_chain(&engine, ["P", "S", "E", "I"]);
    engine
        .add_attachment(instance, &dicom_attachment("blob", 50))
        .unwrap();
    tx.commit().unwrap();

    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(patient).unwrap();
    tx.rollback().unwrap();

    let recorded = events.lock().unwrap();
    assert!(recorded.deleted_files.is_empty());
    assert!(recorded.changes.is_empty());
    assert!(recorded.remaining_ancestors.is_empty());
    drop(recorded);

    assert!(engine.is_existing_resource(patient).unwrap());
    assert_eq!(engine.get_total_compressed_size().unwrap(), 50);
    let (changes, _) = engine.get_changes(0, 100).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn storage_area_failure_is_reported_at_commit() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let [patient, _, _, instance] = common::build_chain(&engine, ["P", "S", "E", "I"]);
    engine
        .add_attachment(instance, &dicom_attachment("blob", 10))
        .unwrap();
    tx.commit().unwrap();

    events.lock().unwrap().fail_file_deletion = true;

    let tx = engine.start_transaction().unwrap();
    engine.delete_resource(patient).unwrap();
    let err = tx.commit().unwrap_err();
    assert!(matches!(err, StratumError::StorageAreaFailure { .. }));

    // The commit itself went through; only the callback failed.
    assert!(!engine.is_existing_resource(patient).unwrap());
}
