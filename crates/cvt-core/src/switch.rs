//! # Multiplexer
//!
//! [`switch`] selects one of several candidates of the same type with a
//! one-hot selector, as a per-element weighted sum
//! `out[j] = Σ_i mask[i] * values[i][j]`.
//!
//! ## Soundness
//!
//! The "at most one bit set" check is not a circuit constraint. A mask made
//! only of constants is checked immediately; any other mask is checked when
//! values are available (prove pass or plain execution) and never during a
//! compile pass. A verifier does not see the check. Callers that need the
//! selection enforced in-circuit must constrain the mask themselves, e.g.
//! by asserting its sum equals one.

use cvt_field::{as_prover, Bool, Field};

use crate::error::CircuitValueError;
use crate::provable::Descriptor;
use crate::value::CircuitValue;

fn count_set(mask: &[Bool]) -> Result<usize, CircuitValueError> {
    let mut n = 0;
    for bit in mask {
        if bit.value()? {
            n += 1;
        }
    }
    Ok(n)
}

fn at_most_one(mask: &[Bool]) -> Result<(), CircuitValueError> {
    let n = count_set(mask)?;
    if n > 1 {
        return Err(CircuitValueError::InvariantViolation(format!(
            "switch selector has {n} bits set, expected at most one"
        )));
    }
    Ok(())
}

/// Select `values[i]` where `mask[i]` is the single set bit.
///
/// # Errors
///
/// - [`CircuitValueError::LengthMismatch`] if `mask` and `values` differ in
///   length.
/// - [`CircuitValueError::InvariantViolation`] if more than one bit is set,
///   immediately for a constant mask, otherwise when values are available.
pub fn switch(
    mask: &[Bool],
    d: &Descriptor,
    values: &[CircuitValue],
) -> Result<CircuitValue, CircuitValueError> {
    if mask.len() != values.len() {
        return Err(CircuitValueError::LengthMismatch {
            mask: mask.len(),
            values: values.len(),
        });
    }

    if mask.iter().all(Bool::is_constant) {
        at_most_one(mask)?;
    } else {
        tracing::debug!(
            candidates = mask.len(),
            type_name = %d.type_name(),
            "switch selector is not constant, deferring cardinality check"
        );
        as_prover(|| at_most_one(mask))?;
    }

    let mut out = vec![Field::ZERO; d.size_in_fields()];
    for (bit, value) in mask.iter().zip(values) {
        let fields = d.to_fields(value)?;
        if *bit == Bool::FALSE {
            continue;
        }
        for (acc, f) in out.iter_mut().zip(fields) {
            let term = if *bit == Bool::TRUE {
                f
            } else {
                f * bit.to_field()
            };
            *acc = *acc + term;
        }
    }
    d.of_fields_with_aux(&out, &crate::ops::shared_auxiliary(d, values)?)
}
