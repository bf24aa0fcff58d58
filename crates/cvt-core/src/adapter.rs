//! # Entry-Point Adapters
//!
//! Top-level circuit entry points take their arguments as one field
//! sequence plus per-argument auxiliary data. [`FieldsAndAux`] is the
//! contract they consume. A [`Descriptor`] implements it directly and
//! carries its auxiliary data through; [`AsFieldsAndAux`] lifts a plain
//! descriptor into it with no auxiliary data at all.
//!
//! ## Ordering Contract
//!
//! [`FieldsAndAux::from_fields`] consumes its elements from the *end* of
//! the shared sequence. [`flatten_arguments`] therefore lays arguments out
//! first to last and [`unflatten_arguments`] reads them back last to first.

use cvt_field::Field;

use crate::error::CircuitValueError;
use crate::provable::Descriptor;
use crate::value::CircuitValue;

/// A descriptor that also carries non-arithmetic auxiliary data.
pub trait FieldsAndAux {
    fn type_name(&self) -> String;

    fn size_in_fields(&self) -> usize;

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError>;

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue>;

    /// Rebuild a value by taking `size_in_fields()` elements off the end of
    /// `fields`.
    fn from_fields(
        &self,
        fields: &mut Vec<Field>,
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError>;
}

/// Split the last `n` elements off `fields`.
fn take_tail(type_name: &str, fields: &mut Vec<Field>, n: usize) -> Result<Vec<Field>, CircuitValueError> {
    if fields.len() < n {
        return Err(CircuitValueError::arity(type_name, n, fields.len()));
    }
    Ok(fields.split_off(fields.len() - n))
}

impl FieldsAndAux for Descriptor {
    fn type_name(&self) -> String {
        Descriptor::type_name(self)
    }

    fn size_in_fields(&self) -> usize {
        Descriptor::size_in_fields(self)
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        Descriptor::to_fields(self, value)
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        Descriptor::to_auxiliary(self, value)
    }

    fn from_fields(
        &self,
        fields: &mut Vec<Field>,
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        let tail = take_tail(&Descriptor::type_name(self), fields, Descriptor::size_in_fields(self))?;
        self.of_fields_with_aux(&tail, aux)
    }
}

/// A plain descriptor viewed as [`FieldsAndAux`] with no auxiliary data.
#[derive(Clone, Debug)]
pub struct AsFieldsAndAux {
    descriptor: Descriptor,
}

impl AsFieldsAndAux {
    pub fn from_circuit_value(descriptor: Descriptor) -> Self {
        AsFieldsAndAux { descriptor }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl FieldsAndAux for AsFieldsAndAux {
    fn type_name(&self) -> String {
        self.descriptor.type_name()
    }

    fn size_in_fields(&self) -> usize {
        self.descriptor.size_in_fields()
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        self.descriptor.to_fields(value)
    }

    fn to_auxiliary(&self, _value: &CircuitValue) -> Vec<CircuitValue> {
        Vec::new()
    }

    fn from_fields(
        &self,
        fields: &mut Vec<Field>,
        _aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        let tail = take_tail(&self.type_name(), fields, self.size_in_fields())?;
        self.descriptor.of_fields(&tail)
    }
}

/// Arguments of an entry point, flattened.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatArguments {
    /// Every argument's fields, first argument first.
    pub fields: Vec<Field>,
    /// Auxiliary data, one entry per argument.
    pub aux: Vec<Vec<CircuitValue>>,
}

fn count_mismatch(types: usize, actual: usize) -> CircuitValueError {
    CircuitValueError::arity("entry-point arguments", types, actual)
}

/// Lay out `args` as one field sequence.
///
/// # Errors
///
/// [`CircuitValueError::ArityMismatch`] if `args` and `types` differ in
/// length; otherwise whatever flattening an argument raises.
pub fn flatten_arguments(
    types: &[&dyn FieldsAndAux],
    args: &[CircuitValue],
) -> Result<FlatArguments, CircuitValueError> {
    if types.len() != args.len() {
        return Err(count_mismatch(types.len(), args.len()));
    }
    let mut flat = FlatArguments {
        fields: Vec::new(),
        aux: Vec::with_capacity(args.len()),
    };
    for (ty, arg) in types.iter().zip(args) {
        flat.fields.extend(ty.to_fields(arg)?);
        flat.aux.push(ty.to_auxiliary(arg));
    }
    Ok(flat)
}

/// Inverse of [`flatten_arguments`]: consumes from the end, last argument
/// first, and returns the arguments in declaration order.
///
/// # Errors
///
/// [`CircuitValueError::ArityMismatch`] if the aux list has the wrong
/// length or elements are missing or left over.
pub fn unflatten_arguments(
    types: &[&dyn FieldsAndAux],
    flat: FlatArguments,
) -> Result<Vec<CircuitValue>, CircuitValueError> {
    if flat.aux.len() != types.len() {
        return Err(count_mismatch(types.len(), flat.aux.len()));
    }
    let FlatArguments { mut fields, aux } = flat;
    let mut args = Vec::with_capacity(types.len());
    for (ty, aux) in types.iter().zip(&aux).rev() {
        args.push(ty.from_fields(&mut fields, aux)?);
    }
    if !fields.is_empty() {
        let expected: usize = types.iter().map(|t| t.size_in_fields()).sum();
        return Err(CircuitValueError::arity(
            "entry-point arguments",
            expected,
            expected + fields.len(),
        ));
    }
    args.reverse();
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::circuit_array;
    use crate::leaf;
    use crate::value::Opaque;

    fn c(v: u64) -> Field {
        Field::constant(v)
    }

    #[test]
    fn from_fields_consumes_the_tail() {
        let adapter = AsFieldsAndAux::from_circuit_value(circuit_array(leaf::field(), 2));
        let mut fields = vec![c(1), c(2), c(3)];
        let v = adapter.from_fields(&mut fields, &[]).unwrap();
        assert_eq!(v, CircuitValue::Array(vec![2u64.into(), 3u64.into()]));
        assert_eq!(fields, vec![c(1)]);
        assert!(adapter.from_fields(&mut fields, &[]).is_err());
    }

    #[test]
    fn adapter_has_no_auxiliary_data() {
        let adapter = AsFieldsAndAux::from_circuit_value(leaf::field());
        assert!(adapter.to_auxiliary(&CircuitValue::from(1u64)).is_empty());
        assert_eq!(adapter.size_in_fields(), 1);
    }

    #[test]
    fn arguments_round_trip_in_declaration_order() {
        let a = AsFieldsAndAux::from_circuit_value(leaf::field());
        let b = AsFieldsAndAux::from_circuit_value(circuit_array(leaf::boolean(), 2));
        let types: [&dyn FieldsAndAux; 2] = [&a, &b];
        let args = vec![
            CircuitValue::from(9u64),
            CircuitValue::Array(vec![true.into(), false.into()]),
        ];
        let flat = flatten_arguments(&types, &args).unwrap();
        assert_eq!(flat.fields, vec![c(9), Field::ONE, Field::ZERO]);
        assert!(flat.aux.iter().all(Vec::is_empty));
        assert_eq!(unflatten_arguments(&types, flat).unwrap(), args);
    }

    #[test]
    fn descriptors_carry_auxiliary_data_through_arguments() {
        let tagged = crate::combinators::type_of_array(vec![leaf::field(), leaf::opaque()]);
        let count = leaf::uint32();
        let types: [&dyn FieldsAndAux; 2] = [&tagged, &count];
        let handle = Opaque::new(String::from("callback"));
        let args = vec![
            CircuitValue::Array(vec![4u64.into(), handle.clone().into()]),
            CircuitValue::from(2u64),
        ];
        let flat = flatten_arguments(&types, &args).unwrap();
        assert_eq!(flat.fields, vec![c(4), c(2)]);
        assert_eq!(flat.aux[0], [CircuitValue::from(handle)]);
        assert!(flat.aux[1].is_empty());
        assert_eq!(unflatten_arguments(&types, flat.clone()).unwrap(), args);

        let mut dropped = flat;
        dropped.aux[0].clear();
        assert!(matches!(
            unflatten_arguments(&types, dropped),
            Err(CircuitValueError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn argument_count_and_leftovers_are_checked() {
        let a = AsFieldsAndAux::from_circuit_value(leaf::field());
        let types: [&dyn FieldsAndAux; 1] = [&a];
        assert!(flatten_arguments(&types, &[]).is_err());

        let flat = FlatArguments {
            fields: vec![c(1), c(2)],
            aux: vec![vec![]],
        };
        assert_eq!(
            unflatten_arguments(&types, flat),
            Err(CircuitValueError::arity("entry-point arguments", 1, 2))
        );
    }
}
