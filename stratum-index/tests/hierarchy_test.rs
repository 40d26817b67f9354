//! Integration test: the resource hierarchy, metadata, and globals.

mod common;

use stratum_core::models::{GlobalPropertyId, MetadataKind, ResourceLevel};
use stratum_core::StratumError;

use common::open_engine;

#[test]
fn simple_hierarchy() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    let [patient, study, series, instance] =
        common::build_chain(&engine, ["P", "S", "E", "I"]);

    assert_eq!(engine.lookup_parent(instance).unwrap(), Some(series));
    assert_eq!(engine.lookup_parent(series).unwrap(), Some(study));
    assert_eq!(engine.lookup_parent(study).unwrap(), Some(patient));
    assert_eq!(engine.lookup_parent(patient).unwrap(), None);

    assert_eq!(engine.get_resource_count(ResourceLevel::Instance).unwrap(), 1);
    assert_eq!(engine.get_resource_count(ResourceLevel::Patient).unwrap(), 1);

    assert_eq!(engine.get_public_id(series).unwrap(), "E");
    assert_eq!(
        engine.get_resource_level(instance).unwrap(),
        ResourceLevel::Instance
    );
    assert_eq!(
        engine.get_parent_public_id(instance).unwrap(),
        Some("E".to_owned())
    );
    assert_eq!(engine.get_parent_public_id(patient).unwrap(), None);

    assert_eq!(engine.lookup_resource("S").unwrap(), Some((study, ResourceLevel::Study)));
    assert_eq!(engine.lookup_resource("missing").unwrap(), None);

    assert!(engine.is_existing_resource(patient).unwrap());
    assert!(!engine.is_existing_resource(patient + 1000).unwrap());

    tx.commit().unwrap();
}

#[test]
fn children_are_enumerated_both_ways() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    let patient = engine.create_resource("p", ResourceLevel::Patient).unwrap();
    let study_a = engine.create_resource("sa", ResourceLevel::Study).unwrap();
    let study_b = engine.create_resource("sb", ResourceLevel::Study).unwrap();
    engine.attach_child(patient, study_a).unwrap();
    engine.attach_child(patient, study_b).unwrap();

    let mut children = engine.get_children_public_id(patient).unwrap();
    children.sort();
    assert_eq!(children, vec!["sa", "sb"]);

    let mut internal = engine.get_children_internal_id(patient).unwrap();
    internal.sort();
    assert_eq!(internal, vec![study_a, study_b]);

    assert!(engine.get_children_public_id(study_a).unwrap().is_empty());

    tx.commit().unwrap();
}

#[test]
fn duplicate_public_id_fails() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    engine.create_resource("same", ResourceLevel::Patient).unwrap();
    let err = engine
        .create_resource("same", ResourceLevel::Study)
        .unwrap_err();
    assert!(matches!(err, StratumError::Duplicate { .. }));

    tx.rollback().unwrap();
}

#[test]
fn mutations_require_a_transaction() {
    let (engine, _) = open_engine();

    assert!(matches!(
        engine
            .create_resource("p", ResourceLevel::Patient)
            .unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));
    assert!(matches!(
        engine.attach_child(1, 2).unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));
    assert!(matches!(
        engine
            .set_metadata(1, MetadataKind::REMOTE_AET, "PINNACLE")
            .unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));
    assert!(matches!(
        engine
            .set_global_property(GlobalPropertyId(2048), "World")
            .unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));
    assert!(matches!(
        engine
            .increment_global_sequence(GlobalPropertyId::ANONYMIZATION_SEQUENCE)
            .unwrap_err(),
        StratumError::BadSequenceOfCalls { .. }
    ));

    // Reads stay available outside a transaction.
    assert!(engine.lookup_resource("p").unwrap().is_none());
    assert_eq!(engine.get_resource_count(ResourceLevel::Patient).unwrap(), 0);
}

#[test]
fn paged_enumeration() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    for i in 0..5 {
        engine
            .create_resource(&format!("study-{i}"), ResourceLevel::Study)
            .unwrap();
    }

    let all = engine.get_all_public_ids(ResourceLevel::Study).unwrap();
    assert_eq!(all.len(), 5);

    let page = engine
        .get_all_public_ids_paged(ResourceLevel::Study, 1, 2)
        .unwrap();
    assert_eq!(page, vec!["study-1", "study-2"]);

    assert!(engine
        .get_all_public_ids_paged(ResourceLevel::Study, 0, 0)
        .unwrap()
        .is_empty());

    tx.commit().unwrap();
}

#[test]
fn metadata_round_trip() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    let instance = engine.create_resource("i", ResourceLevel::Instance).unwrap();

    assert!(engine.list_available_metadata(instance).unwrap().is_empty());

    engine
        .set_metadata(instance, MetadataKind::REMOTE_AET, "PINNACLE")
        .unwrap();
    engine
        .set_metadata(instance, MetadataKind::MODIFIED_FROM, "TUTU")
        .unwrap();
    assert_eq!(engine.list_available_metadata(instance).unwrap().len(), 2);

    engine
        .delete_metadata(instance, MetadataKind::MODIFIED_FROM)
        .unwrap();
    assert_eq!(
        engine.list_available_metadata(instance).unwrap(),
        vec![MetadataKind::REMOTE_AET]
    );

    assert_eq!(
        engine
            .lookup_metadata(instance, MetadataKind::REMOTE_AET)
            .unwrap()
            .as_deref(),
        Some("PINNACLE")
    );
    assert_eq!(
        engine
            .lookup_metadata(instance, MetadataKind::INDEX_IN_SERIES)
            .unwrap(),
        None
    );

    // Replacement in place.
    engine
        .set_metadata(instance, MetadataKind::REMOTE_AET, "ORTHELIA")
        .unwrap();
    let all = engine.get_all_metadata(instance).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[&MetadataKind::REMOTE_AET], "ORTHELIA");

    tx.commit().unwrap();
}

#[test]
fn global_properties_and_sequences() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    let property = GlobalPropertyId(2048);
    assert_eq!(engine.lookup_global_property(property).unwrap(), None);
    engine.set_global_property(property, "World").unwrap();
    assert_eq!(
        engine.lookup_global_property(property).unwrap().as_deref(),
        Some("World")
    );

    for expected in 1..=4 {
        assert_eq!(
            engine
                .increment_global_sequence(GlobalPropertyId::ANONYMIZATION_SEQUENCE)
                .unwrap(),
            expected
        );
    }

    tx.commit().unwrap();
}

#[test]
fn main_tags_signature_is_persisted_on_bootstrap() {
    let (engine, _) = open_engine();
    let tx = engine.start_transaction().unwrap();

    let stored = engine
        .stored_main_tags_signature(ResourceLevel::Patient)
        .unwrap()
        .expect("bootstrap persists the signatures");
    assert_eq!(
        stored,
        engine.main_tags_registry().signature_of(ResourceLevel::Patient)
    );

    tx.commit().unwrap();
}
