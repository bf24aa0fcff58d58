//! # Witnesses and Memoization
//!
//! [`witness`] brings a host-computed value into the circuit as private
//! inputs. [`memoize_witness`] additionally pins the value to a slot of the
//! active [`MemoizationContext`], so that a later pass replaying the same
//! construction sequence sees bit-identical field elements even when the
//! computation is non-deterministic.
//!
//! ## Replay Protocol
//!
//! 1. The construction pass runs inside `ctx.run(..)`. Each memoized
//!    witness reserves the slot at the cursor, evaluates its computation
//!    once and stores the constant flattening with its auxiliary data.
//! 2. `ctx.rewind()` resets the cursor, keeping slots and the blinding value.
//! 3. The proving pass runs inside `ctx.run(..)` again. Each memoized
//!    witness finds its slot filled and reuses it without calling the
//!    computation.
//!
//! A compile pass never evaluates witness computations, so it neither reads
//! nor advances the context.
//!
//! ## Security Invariant
//!
//! A slot is written at most once per context. Replays never recompute.
//! Contexts are scoped on a thread-local stack; the guard in
//! [`MemoizationContext::run`] pops the context and writes it back to the
//! caller on every exit path, including panics.

use std::cell::RefCell;

use cvt_field::{exists, in_checked_computation, Field, Fp};
use rand::rngs::OsRng;
use serde_json::Value as Json;

use crate::error::CircuitValueError;
use crate::leaf;
use crate::provable::Descriptor;
use crate::value::CircuitValue;

/// Introduce a value computed by `compute` as a witness of type `d`.
///
/// Outside a checked computation this is just `compute()`. Inside one,
/// the value's flattening becomes `d.size_in_fields()` private inputs, the
/// value is rebuilt from those inputs plus the computed value's auxiliary
/// data, and `d.check` constrains it. During a compile pass `compute` is
/// not called and every auxiliary entry is rebuilt as a JSON null.
///
/// # Errors
///
/// Propagates errors from `compute`, `d.to_fields`, `d.of_fields` and
/// `d.check`.
pub fn witness<F>(d: &Descriptor, compute: F) -> Result<CircuitValue, CircuitValueError>
where
    F: FnOnce() -> Result<CircuitValue, CircuitValueError>,
{
    if !in_checked_computation() {
        return compute();
    }
    let mut aux = None;
    let fields = exists(d.size_in_fields(), || -> Result<Vec<Fp>, CircuitValueError> {
        let value = compute()?;
        aux = Some(d.to_auxiliary(&value));
        d.to_fields(&value)?
            .iter()
            .map(|f| f.value().map_err(CircuitValueError::from))
            .collect()
    })?;
    let aux = aux.unwrap_or_else(|| vec![CircuitValue::Primitive(Json::Null); d.size_in_aux()]);
    let value = d.of_fields_with_aux(&fields, &aux)?;
    d.check(&value)?;
    Ok(value)
}

#[derive(Clone, Debug, PartialEq)]
struct Slot {
    fields: Vec<Fp>,
    aux: Vec<CircuitValue>,
}

/// Slot storage pinning witness values across construction passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoizationContext {
    slots: Vec<Option<Slot>>,
    cursor: usize,
    blinding_value: Option<Fp>,
}

thread_local! {
    static MEMO_STACK: RefCell<Vec<MemoizationContext>> = const { RefCell::new(Vec::new()) };
}

/// Pops the context pushed by [`MemoizationContext::run`] and hands it back.
struct ContextGuard<'a> {
    target: &'a mut MemoizationContext,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = MEMO_STACK.with(|stack| stack.borrow_mut().pop()) {
            *self.target = ctx;
        }
    }
}

fn with_active<R>(f: impl FnOnce(&mut MemoizationContext) -> R) -> Option<R> {
    MEMO_STACK.with(|stack| stack.borrow_mut().last_mut().map(f))
}

impl MemoizationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the cursor for a replay pass. Slots and the blinding value
    /// are kept.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// The stored flattening at `index`, if any.
    pub fn slot(&self, index: usize) -> Option<&[Fp]> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .map(|s| s.fields.as_slice())
    }

    pub fn blinding_value(&self) -> Option<Fp> {
        self.blinding_value
    }

    /// Run `f` with this context active.
    ///
    /// The context is moved onto the thread-local stack for the duration
    /// of `f` and written back afterwards, whether `f` returns or unwinds.
    pub fn run<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let ctx = std::mem::take(self);
        MEMO_STACK.with(|stack| stack.borrow_mut().push(ctx));
        let _guard = ContextGuard { target: self };
        f()
    }

    /// Advance the cursor and return the reserved index with its content.
    fn reserve(&mut self) -> (usize, Option<Slot>) {
        let index = self.cursor;
        self.cursor += 1;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        (index, self.slots[index].clone())
    }
}

/// Returns true while a memoization context is active on this thread.
pub fn has_memoization_context() -> bool {
    MEMO_STACK.with(|stack| !stack.borrow().is_empty())
}

/// Like [`witness`], but pinned to the next slot of the active context.
///
/// With no active context this is exactly [`witness`].
///
/// # Errors
///
/// As [`witness`]; additionally [`CircuitValueError::ArityMismatch`] when a
/// replayed slot does not match `d`'s size.
pub fn memoize_witness<F>(d: &Descriptor, compute: F) -> Result<CircuitValue, CircuitValueError>
where
    F: FnOnce() -> Result<CircuitValue, CircuitValueError>,
{
    if !has_memoization_context() {
        return witness(d, compute);
    }
    witness(d, || {
        let Some((index, stored)) = with_active(MemoizationContext::reserve) else {
            return compute();
        };
        let Slot { fields, aux } = match stored {
            Some(slot) => {
                tracing::trace!(slot = index, "replaying memoized witness");
                slot
            }
            None => {
                let value = compute()?;
                let slot = Slot {
                    fields: d
                        .to_fields(&value)?
                        .iter()
                        .map(Field::value)
                        .collect::<Result<Vec<_>, _>>()?,
                    aux: d.to_auxiliary(&value),
                };
                with_active(|ctx| {
                    if let Some(stored) = ctx.slots.get_mut(index) {
                        *stored = Some(slot.clone());
                    }
                });
                tracing::debug!(
                    slot = index,
                    size = slot.fields.len(),
                    aux = slot.aux.len(),
                    type_name = %d.type_name(),
                    "memoized witness"
                );
                slot
            }
        };
        if fields.len() != d.size_in_fields() {
            return Err(CircuitValueError::arity(
                &d.type_name(),
                d.size_in_fields(),
                fields.len(),
            ));
        }
        let constants: Vec<Field> = fields.into_iter().map(Field::Constant).collect();
        d.of_fields_with_aux(&constants, &aux)
    })
}

/// A random field element scoped to the active context.
///
/// Sampled on first use and reused for every later call within the same
/// context, including replays. Without a context every call samples afresh.
pub fn get_blinding_value() -> Result<Field, CircuitValueError> {
    let value = witness(&leaf::field(), || {
        let v = with_active(|ctx| *ctx.blinding_value.get_or_insert_with(|| Fp::random(&mut OsRng)))
            .unwrap_or_else(|| Fp::random(&mut OsRng));
        Ok(CircuitValue::from(v))
    })?;
    value
        .as_field()
        .ok_or_else(|| CircuitValueError::shape("Field", "a field element", value.variant_name()))
}
