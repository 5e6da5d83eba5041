//! Integration tests for provider-driven updates and outbound debouncing

use super::test_utils::{noop, recorder, recording_store, state, values};
use statemux::schema::codec::EnumCodec;
use statemux::{Codec, CodecError, SchemaConfig, State, Value};
use std::sync::Arc;

#[test]
fn test_calls_callback_asynchronously_on_update() {
    let (mut store, outbound) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();

    store
        .update_provider(id, state(&[("foo", Value::from("bam"))]))
        .unwrap();
    assert!(outbound.lock().is_empty());

    store.run_pending().unwrap();
    let outbound = outbound.lock();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0], values(&[("foo", "bam")]));
}

#[test]
fn test_debounces_callback_calls() {
    let (mut store, outbound) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("foo", "bar"), noop())
        .unwrap();

    store
        .update_provider(id, state(&[("foo", Value::from("bam"))]))
        .unwrap();
    store
        .update_provider(id, state(&[("foo", Value::from("baz"))]))
        .unwrap();
    store.run_pending().unwrap();
    store.run_pending().unwrap();

    let outbound = outbound.lock();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0], values(&[("foo", "baz")]));
}

#[test]
fn test_outbound_carries_every_provider_key() {
    let (mut store, outbound) = recording_store();
    let a = store
        .register(SchemaConfig::new().field("zoom", 3), noop())
        .unwrap();
    let b = store
        .register(
            SchemaConfig::new().with_prefix("layer").field("visible", true),
            noop(),
        )
        .unwrap();

    store
        .update_provider(a, state(&[("zoom", Value::from(4))]))
        .unwrap();
    store
        .update_provider(b, state(&[("visible", Value::from(false))]))
        .unwrap();
    store.run_pending().unwrap();

    let outbound = outbound.lock();
    assert_eq!(outbound.len(), 1);
    assert_eq!(
        outbound[0],
        values(&[("zoom", "4"), ("layer.visible", "false")])
    );
}

#[test]
fn test_separate_ticks_flush_separately() {
    let (mut store, outbound) = recording_store();
    let id = store
        .register(SchemaConfig::new().field("n", 0), noop())
        .unwrap();

    store.update_provider(id, state(&[("n", Value::from(1))])).unwrap();
    store.run_pending().unwrap();
    store.update_provider(id, state(&[("n", Value::from(2))])).unwrap();
    store.run_pending().unwrap();

    let outbound = outbound.lock();
    assert_eq!(outbound.len(), 2);
    assert_eq!(outbound[1], values(&[("n", "2")]));
}

#[test]
fn test_provider_update_is_not_echoed_back() {
    let (mut store, _) = recording_store();
    let (calls, cb) = recorder();
    let id = store
        .register(SchemaConfig::new().field("theme", "light"), cb)
        .unwrap();
    store.run_pending().unwrap();

    store
        .update_provider(id, state(&[("theme", Value::from("dark"))]))
        .unwrap();
    let persisted = store.values().clone();
    store.run_pending().unwrap();

    // The persistence layer writes the same values back.
    store.update(persisted);
    store.run_pending().unwrap();
    assert_eq!(calls.lock().len(), 1);
}

#[test]
fn test_invalid_enum_update_is_rejected() {
    let (mut store, outbound) = recording_store();
    let id = store
        .register(
            SchemaConfig::new().field_with(
                "theme",
                "light",
                Arc::new(EnumCodec::new(["light", "dark"])),
            ),
            noop(),
        )
        .unwrap();

    assert!(store
        .update_provider(id, state(&[("theme", Value::from("neon"))]))
        .is_err());
    store.run_pending().unwrap();
    assert!(outbound.lock().is_empty());
    assert!(store.values().is_empty());
}

/// Encodes a length in the unit named by the sibling `unit` field.
#[derive(Debug)]
struct LengthCodec;

impl Codec for LengthCodec {
    fn kind(&self) -> &'static str {
        "length"
    }

    fn encode(&self, value: &Value, context: &State) -> Result<String, CodecError> {
        let metres = value.as_number().ok_or(CodecError::Mismatch {
            expected: "number",
            found: value.kind(),
        })?;
        match context.get("unit").and_then(Value::as_text) {
            Some("km") => Ok(format!("{}km", metres / 1000.0)),
            _ => Ok(format!("{}m", metres)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        let invalid = |reason: &str| CodecError::Invalid {
            kind: "length",
            raw: raw.to_string(),
            reason: reason.to_string(),
        };
        if let Some(km) = raw.strip_suffix("km") {
            let n: f64 = km.parse().map_err(|_| invalid("bad km"))?;
            Ok(Value::Number(n * 1000.0))
        } else if let Some(m) = raw.strip_suffix('m') {
            let n: f64 = m.parse().map_err(|_| invalid("bad m"))?;
            Ok(Value::Number(n))
        } else {
            Err(invalid("missing unit"))
        }
    }
}

#[test]
fn test_serialization_uses_sibling_context() {
    let (mut store, _) = recording_store();
    let schema = SchemaConfig::new()
        .field("unit", "m")
        .field_with("distance", 0, Arc::new(LengthCodec));
    let id = store.register(schema, noop()).unwrap();
    store.run_pending().unwrap();

    store
        .update_provider(
            id,
            state(&[("unit", Value::from("km")), ("distance", Value::from(2500))]),
        )
        .unwrap();
    assert_eq!(
        store.values().get("distance").map(String::as_str),
        Some("2.5km")
    );

    // Later updates keep using the accumulated unit.
    store
        .update_provider(id, state(&[("distance", Value::from(500))]))
        .unwrap();
    assert_eq!(
        store.values().get("distance").map(String::as_str),
        Some("0.5km")
    );
}

#[test]
fn test_equivalent_encodings_are_not_reported() {
    let (mut store, _) = recording_store();
    let (calls, cb) = recorder();
    let schema = SchemaConfig::new()
        .field("unit", "km")
        .field_with("distance", 1000, Arc::new(LengthCodec));
    store.register(schema, cb).unwrap();
    store.run_pending().unwrap();

    // 1000m and 1km are the same distance once encoded in the current unit.
    store.update(values(&[("unit", "km"), ("distance", "1000m")]));
    store.run_pending().unwrap();
    assert_eq!(calls.lock().len(), 1);
}
