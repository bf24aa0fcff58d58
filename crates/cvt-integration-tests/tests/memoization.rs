//! # Witness Memoization Across Passes
//!
//! A circuit body is executed once per construction pass. Randomized
//! witnesses wrapped in `memoize_witness` must produce identical values on
//! every pass that shares a context, and the compiled and proved constraint
//! systems must agree.

use cvt_core::{
    circuit_array, get_blinding_value, leaf, memoize_witness, CircuitValue, CircuitValueError,
    MemoizationContext,
};
use cvt_field::{constraint_system, run_and_check, Field, Fp};
use rand::rngs::OsRng;

/// A body that witnesses two random values, a random pair and a blinding
/// factor, and returns every witnessed field value.
fn body() -> Result<Vec<Field>, CircuitValueError> {
    let pair = circuit_array(leaf::field(), 2);
    let a = memoize_witness(&leaf::field(), || Ok(Fp::random(&mut OsRng).into()))?;
    let b = memoize_witness(&pair, || {
        Ok(vec![
            CircuitValue::from(Fp::random(&mut OsRng)),
            CircuitValue::from(Fp::random(&mut OsRng)),
        ]
        .into())
    })?;
    let r = get_blinding_value()?;
    let mut out = leaf::field().to_fields(&a)?;
    out.extend(pair.to_fields(&b)?);
    out.push(r);
    Ok(out)
}

fn values(fields: &[Field]) -> Vec<Fp> {
    fields.iter().map(|f| f.value().unwrap()).collect()
}

#[test]
fn two_prove_passes_replay_identical_witnesses() {
    let mut ctx = MemoizationContext::new();
    let first = ctx.run(|| run_and_check(body)).unwrap();
    assert_eq!(ctx.filled(), 2);
    assert_eq!(ctx.slot(1).map(<[Fp]>::len), Some(2));

    ctx.rewind();
    let second = ctx.run(|| run_and_check(body)).unwrap();

    assert_eq!(values(&first.output), values(&second.output));
    assert_eq!(
        first.constraint_system.digest().unwrap(),
        second.constraint_system.digest().unwrap()
    );
    assert_eq!(second.output[3].value().unwrap(), ctx.blinding_value().unwrap());
}

#[test]
fn plain_construction_pass_is_replayed_by_a_prove_pass() {
    let mut ctx = MemoizationContext::new();
    let constructed = ctx.run(body).unwrap();
    assert_eq!(ctx.filled(), 2);
    assert!(constructed.iter().all(Field::is_constant));
    let slots: Vec<Vec<Fp>> = (0..2)
        .filter_map(|i| ctx.slot(i).map(<[Fp]>::to_vec))
        .collect();

    ctx.rewind();
    let proved = ctx.run(|| run_and_check(body)).unwrap();

    assert_eq!(values(&constructed), values(&proved.output));
    assert_eq!(ctx.filled(), 2);
    assert_eq!(ctx.cursor(), 2);
    let replayed: Vec<Vec<Fp>> = (0..2)
        .filter_map(|i| ctx.slot(i).map(<[Fp]>::to_vec))
        .collect();
    assert_eq!(slots, replayed);
    assert_eq!(
        proved.output[3].value().unwrap(),
        ctx.blinding_value().unwrap()
    );
}

#[test]
fn without_context_each_pass_draws_fresh_values() {
    let first = run_and_check(body).unwrap();
    let second = run_and_check(body).unwrap();
    assert_ne!(values(&first.output), values(&second.output));
}

#[test]
fn compile_pass_leaves_slots_untouched_and_matches_prove_pass() {
    let mut ctx = MemoizationContext::new();
    let compiled = ctx.run(|| constraint_system(body)).unwrap();
    assert_eq!(ctx.filled(), 0);
    assert_eq!(ctx.cursor(), 0);

    let proved = ctx.run(|| run_and_check(body)).unwrap();
    assert_eq!(ctx.filled(), 2);
    assert_eq!(
        compiled.digest().unwrap(),
        proved.constraint_system.digest().unwrap()
    );
}

#[test]
fn contexts_nest_and_restore() {
    let mut outer = MemoizationContext::new();
    let mut inner = MemoizationContext::new();
    outer
        .run(|| -> Result<(), CircuitValueError> {
            memoize_witness(&leaf::field(), || Ok(1u64.into()))?;
            inner.run(|| memoize_witness(&leaf::field(), || Ok(2u64.into())))?;
            memoize_witness(&leaf::field(), || Ok(3u64.into()))?;
            Ok(())
        })
        .unwrap();
    assert_eq!(outer.filled(), 2);
    assert_eq!(outer.slot(1), Some(&[Fp::new(3)][..]));
    assert_eq!(inner.slot(0), Some(&[Fp::new(2)][..]));
}
