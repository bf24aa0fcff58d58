//! # Composite Schema Ordering
//!
//! The flattening of a composite type follows member registration order,
//! not name order, and nested composites expand in place.

use std::sync::Arc;

use cvt_core::{
    leaf, CircuitValue, CircuitValueError, CompositeType, Member, Record, SchemaBuilder,
    SchemaRegistry,
};
use cvt_field::Field;
use serde_json::json;

fn transfer(registry: &Arc<SchemaRegistry>, reversed: bool) -> CompositeType {
    let builder = SchemaBuilder::new("Transfer");
    let builder = if reversed {
        builder.field("to", leaf::field()).field("amount", leaf::uint32())
    } else {
        builder.field("amount", leaf::uint32()).field("to", leaf::field())
    };
    builder.register(registry).unwrap()
}

fn sample() -> CircuitValue {
    Record::named("Transfer").with("amount", 5u64).with("to", 42u64).into()
}

#[test]
fn flattening_follows_registration_order() {
    let forward = transfer(&Arc::new(SchemaRegistry::new()), false).descriptor();
    let reversed = transfer(&Arc::new(SchemaRegistry::new()), true).descriptor();

    assert_eq!(
        forward.to_fields(&sample()).unwrap(),
        vec![Field::constant(5u64), Field::constant(42u64)]
    );
    assert_eq!(
        reversed.to_fields(&sample()).unwrap(),
        vec![Field::constant(42u64), Field::constant(5u64)]
    );
    for d in [&forward, &reversed] {
        let flat = d.to_fields(&sample()).unwrap();
        let rebuilt = d.of_fields(&flat).unwrap();
        assert!(rebuilt.value_eq(&sample()).unwrap());
        assert_eq!(d.to_fields(&rebuilt).unwrap(), flat);
    }
}

#[test]
fn composite_json_sentinels() {
    let d = transfer(&Arc::new(SchemaRegistry::new()), false).descriptor();
    assert_eq!(d.from_json(&json!([5, "42"])).unwrap(), None);
    assert_eq!(d.from_json(&json!(null)).unwrap(), None);
    assert_eq!(d.from_json(&json!({"amount": "5"})).unwrap(), None);

    let decoded = d.from_json(&json!({"amount": "5", "to": "42"})).unwrap().unwrap();
    assert!(decoded.value_eq(&sample()).unwrap());
    assert_eq!(d.to_json(&decoded).unwrap(), json!({"amount": "5", "to": "42"}));
}

#[test]
fn unencoded_members_are_skipped() {
    let registry = Arc::new(SchemaRegistry::new());
    let ty = SchemaBuilder::new("Note")
        .field("memo", Member::Unencoded)
        .field("value", leaf::field())
        .register(&registry)
        .unwrap();
    assert_eq!(ty.schema().len(), 1);
    let value: CircuitValue = Record::named("Note")
        .with("memo", json!("ignored"))
        .with("value", 1u64)
        .into();
    assert_eq!(ty.descriptor().to_fields(&value).unwrap(), vec![Field::ONE]);
}

#[test]
fn duplicate_member_is_rejected() {
    let registry = Arc::new(SchemaRegistry::new());
    let err = SchemaBuilder::new("Dup")
        .field("x", leaf::field())
        .field("x", leaf::boolean())
        .register(&registry)
        .unwrap_err();
    assert!(matches!(err, CircuitValueError::DuplicateField { .. }));
}

#[test]
fn nested_composite_expands_in_place() {
    let registry = Arc::new(SchemaRegistry::new());
    let inner = transfer(&registry, false).descriptor();
    let batch = SchemaBuilder::new("Batch")
        .field("nonce", leaf::field())
        .field("first", inner.clone())
        .field("last", inner)
        .register(&registry)
        .unwrap()
        .descriptor();
    assert_eq!(batch.size_in_fields(), 5);

    let value: CircuitValue = Record::named("Batch")
        .with("nonce", 9u64)
        .with("first", sample())
        .with("last", sample())
        .into();
    let flat = batch.to_fields(&value).unwrap();
    assert_eq!(flat[0], Field::constant(9u64));
    assert_eq!(flat[3], Field::constant(5u64));
    assert!(batch.of_fields(&flat).unwrap().value_eq(&value).unwrap());
}

#[test]
fn global_registry_is_shared() {
    let name = "IntegrationGlobalPair";
    SchemaBuilder::new(name)
        .field("l", leaf::field())
        .field("r", leaf::field())
        .register(&SchemaRegistry::global())
        .unwrap();
    assert!(SchemaRegistry::global().contains(name));
    assert_eq!(CompositeType::global(name).size_in_fields(), 2);
}
