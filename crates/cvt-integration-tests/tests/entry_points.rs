//! # Entry-Point Argument Layout
//!
//! Arguments are laid out first-to-last and recovered by consuming from
//! the end of the field sequence. Auxiliary data travels beside the
//! fields, one list per argument.

use std::sync::Arc;

use cvt_core::{
    circuit_array, circuit_value, flatten_arguments, leaf, type_of_array, unflatten_arguments,
    AsFieldsAndAux, CircuitValue, CircuitValueError, FieldsAndAux, Opaque, Record, SchemaBuilder,
    SchemaRegistry, Shape, ShapeOptions,
};
use cvt_field::Field;

fn c(v: u64) -> Field {
    Field::constant(v)
}

#[test]
fn mixed_arguments_round_trip() {
    let registry = Arc::new(SchemaRegistry::new());
    let point = SchemaBuilder::new("Point")
        .field("x", leaf::field())
        .field("y", leaf::field())
        .register(&registry)
        .unwrap()
        .descriptor();

    let a = AsFieldsAndAux::from_circuit_value(point);
    let b = AsFieldsAndAux::from_circuit_value(circuit_array(leaf::boolean(), 2));
    let e = AsFieldsAndAux::from_circuit_value(type_of_array(vec![]));
    let types: [&dyn FieldsAndAux; 3] = [&a, &e, &b];

    let args: Vec<CircuitValue> = vec![
        Record::named("Point").with("x", 1u64).with("y", 2u64).into(),
        Vec::<CircuitValue>::new().into(),
        vec![CircuitValue::from(true), CircuitValue::from(false)].into(),
    ];
    let flat = flatten_arguments(&types, &args).unwrap();
    assert_eq!(flat.fields, vec![c(1), c(2), Field::ONE, Field::ZERO]);
    assert_eq!(flat.aux.len(), 3);

    let back = unflatten_arguments(&types, flat).unwrap();
    assert_eq!(back.len(), 3);
    for (x, y) in back.iter().zip(&args) {
        assert!(x.value_eq(y).unwrap());
    }
}

#[test]
fn leftover_and_missing_fields_are_errors() {
    let f = AsFieldsAndAux::from_circuit_value(leaf::field());
    let types: [&dyn FieldsAndAux; 1] = [&f];

    let mut flat = flatten_arguments(&types, &[CircuitValue::from(3u64)]).unwrap();
    flat.fields.insert(0, c(0));
    assert!(matches!(
        unflatten_arguments(&types, flat.clone()),
        Err(CircuitValueError::ArityMismatch { expected: 1, actual: 2, .. })
    ));

    flat.fields.clear();
    assert!(matches!(
        unflatten_arguments(&types, flat),
        Err(CircuitValueError::ArityMismatch { .. })
    ));
}

#[test]
fn opaque_arguments_survive_the_round_trip() {
    let receipt = circuit_value(
        &Shape::object([
            ("amount", Shape::Leaf(leaf::uint32())),
            ("payer", Shape::Leaf(leaf::opaque())),
        ]),
        &ShapeOptions::default(),
    )
    .unwrap();
    let count = AsFieldsAndAux::from_circuit_value(leaf::field());
    let types: [&dyn FieldsAndAux; 2] = [&receipt, &count];

    let payer = Opaque::new(String::from("alice"));
    let args: Vec<CircuitValue> = vec![
        Record::new().with("amount", 40u64).with("payer", payer.clone()).into(),
        CircuitValue::from(1u64),
    ];
    let flat = flatten_arguments(&types, &args).unwrap();
    assert_eq!(flat.fields, vec![c(40), c(1)]);
    assert_eq!(flat.aux[0].len(), 1);
    assert!(flat.aux[1].is_empty());

    let back = unflatten_arguments(&types, flat).unwrap();
    let rebuilt = back[0].as_record().and_then(|r| r.get("payer")).cloned();
    match rebuilt {
        Some(CircuitValue::Opaque(handle)) => assert!(handle.ptr_eq(&payer)),
        other => panic!("payer was not restored: {other:?}"),
    }
    assert_eq!(back, args);

    let stripped = AsFieldsAndAux::from_circuit_value(receipt.clone());
    let types: [&dyn FieldsAndAux; 1] = [&stripped];
    let flat = flatten_arguments(&types, &args[..1]).unwrap();
    assert!(flat.aux[0].is_empty());
    assert!(matches!(
        unflatten_arguments(&types, flat),
        Err(CircuitValueError::ArityMismatch { .. })
    ));
}
