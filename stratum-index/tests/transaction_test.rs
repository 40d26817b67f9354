//! Integration test: transaction nesting and rollback poisoning.

mod common;

use stratum_core::models::ResourceLevel;
use stratum_core::StratumError;

use common::open_engine;

#[test]
fn nested_frames_commit_together() {
    let (engine, _) = open_engine();

    let outer = engine.start_transaction().unwrap();
    engine.create_resource("a", ResourceLevel::Patient).unwrap();

    let inner = engine.start_transaction().unwrap();
    engine.create_resource("b", ResourceLevel::Patient).unwrap();
    inner.commit().unwrap();

    outer.commit().unwrap();

    assert!(engine.lookup_resource("a").unwrap().is_some());
    assert!(engine.lookup_resource("b").unwrap().is_some());
}

#[test]
fn dropping_a_transaction_rolls_back() {
    let (engine, _) = open_engine();

    {
        let _tx = engine.start_transaction().unwrap();
        engine.create_resource("ghost", ResourceLevel::Patient).unwrap();
        // Dropped without commit.
    }

    assert!(engine.lookup_resource("ghost").unwrap().is_none());
}

#[test]
fn nested_rollback_poisons_the_stack() {
    let (engine, _) = open_engine();

    let outer = engine.start_transaction().unwrap();
    engine.create_resource("a", ResourceLevel::Patient).unwrap();

    let inner = engine.start_transaction().unwrap();
    engine.create_resource("b", ResourceLevel::Patient).unwrap();
    inner.rollback().unwrap();

    // Every subsequent begin fails...
    let err = engine.start_transaction().unwrap_err();
    assert!(matches!(err, StratumError::BadSequenceOfCalls { .. }));

    // ...and the outer commit becomes a rollback.
    let err = outer.commit().unwrap_err();
    assert!(matches!(err, StratumError::BadSequenceOfCalls { .. }));

    assert!(engine.lookup_resource("a").unwrap().is_none());
    assert!(engine.lookup_resource("b").unwrap().is_none());

    // The stack recovered: a fresh transaction works.
    let tx = engine.start_transaction().unwrap();
    engine.create_resource("c", ResourceLevel::Patient).unwrap();
    tx.commit().unwrap();
    assert!(engine.lookup_resource("c").unwrap().is_some());
}

#[test]
fn effects_inside_nested_frames_survive_the_outer_commit_only() {
    let (engine, events) = open_engine();

    let tx = engine.start_transaction().unwrap();
    let patient = engine.create_resource("p", ResourceLevel::Patient).unwrap();
    tx.commit().unwrap();

    let outer = engine.start_transaction().unwrap();
    let inner = engine.start_transaction().unwrap();
    engine.delete_resource(patient).unwrap();
    inner.commit().unwrap();

    // The inner commit is logical only: nothing delivered yet.
    assert!(events.lock().unwrap().changes.is_empty());

    outer.commit().unwrap();
    assert_eq!(events.lock().unwrap().changes.len(), 1);
}
