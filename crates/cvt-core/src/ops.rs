//! Generic operations over any descriptor, expressed through its
//! flattening. Auxiliary data never enters arithmetic; selections require
//! every candidate to carry the same auxiliary data.

use cvt_field::{Bool, CircuitError, Field};
use serde_json::Value as Json;

use crate::error::CircuitValueError;
use crate::provable::Descriptor;
use crate::value::CircuitValue;

/// Rebuild `value` with every element replaced by its constant value.
///
/// # Errors
///
/// Fails during a compile pass, where variables have no values.
pub fn to_constant(d: &Descriptor, value: &CircuitValue) -> Result<CircuitValue, CircuitValueError> {
    let fields = d
        .to_fields(value)?
        .iter()
        .map(Field::to_constant)
        .collect::<Result<Vec<_>, CircuitError>>()?;
    d.of_fields_with_aux(&fields, &d.to_auxiliary(value))
}

/// The auxiliary data shared by every candidate of a selection.
pub(crate) fn shared_auxiliary<'a>(
    d: &Descriptor,
    candidates: impl IntoIterator<Item = &'a CircuitValue>,
) -> Result<Vec<CircuitValue>, CircuitValueError> {
    let mut auxes = candidates.into_iter().map(|v| d.to_auxiliary(v));
    let Some(first) = auxes.next() else {
        return Ok(vec![CircuitValue::Primitive(Json::Null); d.size_in_aux()]);
    };
    if auxes.any(|aux| aux != first) {
        return Err(CircuitValueError::InvariantViolation(format!(
            "{}: candidates carry different auxiliary data",
            d.type_name()
        )));
    }
    Ok(first)
}

/// True when every element of the flattening is a constant.
pub fn is_constant(d: &Descriptor, value: &CircuitValue) -> Result<bool, CircuitValueError> {
    Ok(d.to_fields(value)?.iter().all(Field::is_constant))
}

/// In-circuit equality of two values of the same type.
pub fn equal(d: &Descriptor, a: &CircuitValue, b: &CircuitValue) -> Result<Bool, CircuitValueError> {
    let (xs, ys) = (d.to_fields(a)?, d.to_fields(b)?);
    Ok(xs
        .into_iter()
        .zip(ys)
        .fold(Bool::TRUE, |acc, (x, y)| acc.and(x.equals(y))))
}

/// Constrain two values of the same type to be equal, element by element.
pub fn assert_equal(d: &Descriptor, a: &CircuitValue, b: &CircuitValue) -> Result<(), CircuitValueError> {
    let (xs, ys) = (d.to_fields(a)?, d.to_fields(b)?);
    for (x, y) in xs.into_iter().zip(ys) {
        x.assert_equal(y)?;
    }
    Ok(())
}

/// Two-way select: `condition ? then : otherwise`.
///
/// A constant condition returns the chosen value unchanged. Otherwise each
/// element is `otherwise + condition * (then - otherwise)`.
pub fn provable_if(
    condition: Bool,
    d: &Descriptor,
    then: &CircuitValue,
    otherwise: &CircuitValue,
) -> Result<CircuitValue, CircuitValueError> {
    let (xs, ys) = (d.to_fields(then)?, d.to_fields(otherwise)?);
    if condition.is_constant() {
        return Ok(if condition.value()? {
            then.clone()
        } else {
            otherwise.clone()
        });
    }
    let c = condition.to_field();
    let fields: Vec<Field> = xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| y + c * (x - y))
        .collect();
    d.of_fields_with_aux(&fields, &shared_auxiliary(d, [then, otherwise])?)
}
