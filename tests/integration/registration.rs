//! Integration tests for provider registration and unregistration

use super::test_utils::{noop, recorder, recording_store, state, values};
use statemux::{SchemaConfig, StoreError, Value};

#[test]
fn test_register_returns_live_handle() {
    let (mut store, _) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();
    assert!(store.is_registered(id));
    assert_eq!(store.provider_count(), 1);
}

#[test]
fn test_conflicting_key_is_rejected() {
    let (mut store, _) = recording_store();
    store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();

    let err = store
        .register(SchemaConfig::new().field("foo", "bam"), noop())
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::RegistrationConflict {
            key: "foo".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "Provider already registered using the same name: foo"
    );
    assert_eq!(store.provider_count(), 1);
}

#[test]
fn test_conflict_checked_against_every_provider() {
    let (mut store, _) = recording_store();
    store
        .register(SchemaConfig::new().field("a", 1), noop())
        .unwrap();
    store
        .register(SchemaConfig::new().with_prefix("pre").field("b", 1), noop())
        .unwrap();

    let (calls, cb) = recorder();
    let err = store
        .register(
            SchemaConfig::new().field("c", 1).field("pre.b", 2),
            cb,
        )
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::RegistrationConflict {
            key: "pre.b".to_string()
        }
    );

    // The rejected provider never joins, so it never hears about updates.
    store.update(values(&[("c", "5")]));
    store.run_pending().unwrap();
    assert!(calls.lock().is_empty());
    assert_eq!(store.provider_count(), 2);
}

#[test]
fn test_prefix_avoids_conflict() {
    let (mut store, _) = recording_store();
    store
        .register(SchemaConfig::new().field("bar", "bar.0"), noop())
        .unwrap();
    let namespaced = SchemaConfig::from_defaults(vec![
        ("bar", Value::from("bar.1")),
        ("_", Value::from("pre")),
    ])
    .unwrap();
    assert!(store.register(namespaced, noop()).is_ok());
}

#[test]
fn test_unregistered_provider_stops_receiving_updates() {
    let (mut store, _) = recording_store();
    let (calls, cb) = recorder();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), cb)
        .unwrap();

    assert!(store.unregister(id));
    store.update(values(&[("foo", "bam")]));
    store.run_pending().unwrap();

    assert!(calls.lock().is_empty());
}

#[test]
fn test_update_after_unregister_fails() {
    let (mut store, outbound) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();
    store.unregister(id);

    let err = store
        .update_provider(id, state(&[("foo", Value::from("bam"))]))
        .unwrap_err();
    assert_eq!(err, StoreError::UnregisteredProvider(id));
    assert_eq!(
        err.to_string(),
        "Unregistered provider attempting to update state"
    );
    assert!(store.values().is_empty());

    store.run_pending().unwrap();
    assert!(outbound.lock().is_empty());
}

#[test]
fn test_unregister_unknown_is_noop() {
    let (mut store, _) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();
    assert!(store.unregister(id));
    assert!(!store.unregister(id));
    assert_eq!(store.provider_count(), 0);
}

#[test]
fn test_key_freed_by_unregister_can_be_reused() {
    let (mut store, _) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();
    store.unregister(id);
    assert!(store
        .register(SchemaConfig::new().field("foo", "baz"), noop())
        .is_ok());
}
