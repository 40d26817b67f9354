//! Integration test: the patient recycling queue.

mod common;

use stratum_core::models::ResourceLevel;
use stratum_core::StratumError;

use common::{dicom_attachment, open_engine};
use stratum_index::IndexEngine;

fn create_patients(engine: &IndexEngine, count: usize) -> Vec<i64> {
    (0..count)
        .map(|i| {
            let name = format!("patient-{i}");
            let id = engine.create_resource(&name, ResourceLevel::Patient).unwrap();
            engine
                .add_attachment(id, &dicom_attachment(&name, 10 + i as u64))
                .unwrap();
            id
        })
        .collect()
}

#[test]
fn fifo_order_with_protection_and_avoidance() {
    let (engine, _) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let patients = create_patients(&engine, 10);

    for &p in &patients {
        assert!(!engine.is_protected_patient(p).unwrap());
    }

    engine.set_protected_patient(patients[2], true).unwrap();
    engine.set_protected_patient(patients[3], true).unwrap();
    assert!(engine.is_protected_patient(patients[2]).unwrap());

    // Queue: p0, p1, p4..p9.
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[0])
    );
    engine.delete_resource(patients[0]).unwrap();

    assert_eq!(
        engine.select_patient_to_recycle(Some(patients[1])).unwrap(),
        Some(patients[4])
    );
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[1])
    );

    // Unprotecting appends at the tail: p3 must come out last.
    engine.set_protected_patient(patients[3], false).unwrap();

    let mut victims = Vec::new();
    while let Some(victim) = engine.select_patient_to_recycle(None).unwrap() {
        victims.push(victim);
        engine.delete_resource(victim).unwrap();
    }

    let expected: Vec<i64> = [1, 4, 5, 6, 7, 8, 9, 3]
        .iter()
        .map(|&i| patients[i])
        .collect();
    assert_eq!(victims, expected);

    // Only the still-protected p2 remains.
    assert_eq!(engine.get_resource_count(ResourceLevel::Patient).unwrap(), 1);
    assert!(engine.is_protected_patient(patients[2]).unwrap());

    tx.commit().unwrap();
}

#[test]
fn protection_is_idempotent_and_reversible() {
    let (engine, _) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let patients = create_patients(&engine, 5);

    engine.set_protected_patient(patients[2], true).unwrap();
    engine.set_protected_patient(patients[2], true).unwrap();
    assert!(engine.is_protected_patient(patients[2]).unwrap());

    engine.set_protected_patient(patients[2], false).unwrap();
    assert!(!engine.is_protected_patient(patients[2]).unwrap());

    // Unprotecting an unprotected patient keeps its queue position.
    engine.set_protected_patient(patients[0], false).unwrap();
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[0])
    );

    tx.commit().unwrap();
}

#[test]
fn deleting_a_patient_removes_its_slot() {
    let (engine, _) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let patients = create_patients(&engine, 3);

    engine.delete_resource(patients[0]).unwrap();
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[1])
    );

    // A deleted patient reads as protected: it has no slot at all.
    assert!(engine.is_protected_patient(patients[0]).unwrap());

    tx.commit().unwrap();
}

#[test]
fn touching_a_patient_moves_it_to_the_tail() {
    let (engine, _) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let patients = create_patients(&engine, 3);

    engine.tag_most_recent_patient(patients[0]).unwrap();
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[1])
    );

    // A protected patient is untouched by re-queueing.
    engine.set_protected_patient(patients[1], true).unwrap();
    engine.tag_most_recent_patient(patients[1]).unwrap();
    assert!(engine.is_protected_patient(patients[1]).unwrap());
    assert_eq!(
        engine.select_patient_to_recycle(None).unwrap(),
        Some(patients[2])
    );

    tx.commit().unwrap();
}

#[test]
fn queue_updates_require_a_transaction() {
    let (engine, _) = open_engine();

    assert!(matches!(
        engine.set_protected_patient(1, true).unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));
    assert!(matches!(
        engine.tag_most_recent_patient(1).unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));

    // Selection is a read and stays available.
    assert_eq!(engine.select_patient_to_recycle(None).unwrap(), None);
}

#[test]
fn recycling_respects_disk_threshold_reads() {
    let (engine, _) = open_engine();

    let tx = engine.start_transaction().unwrap();
    create_patients(&engine, 2); // sizes 10 + 11

    assert!(engine.is_disk_size_above(20).unwrap());
    assert!(!engine.is_disk_size_above(21).unwrap());

    tx.commit().unwrap();
}
