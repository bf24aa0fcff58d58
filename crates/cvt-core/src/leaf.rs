//! # Leaf Descriptors
//!
//! The built-in atomic types every composite is ultimately made of. The
//! arithmetic leaves occupy exactly one field element and carry every
//! optional capability. `Opaque` occupies none; its value travels as a
//! single auxiliary entry.
//!
//! | Type | Value | `check` | Hash input | JSON |
//! |------|-------|---------|------------|------|
//! | `Field` | `CircuitValue::Field` | none | one unpacked field | decimal string |
//! | `Bool` | `CircuitValue::Bool` | 0 or 1 | packed, 1 bit | boolean |
//! | `UInt32` | `CircuitValue::Field` | `< 2^32` | packed, 32 bits | decimal string |
//! | `Opaque` | `CircuitValue::Opaque` | none | empty | unsupported |

use cvt_field::{Bool, Field, Fp};
use serde_json::Value as Json;

use crate::error::CircuitValueError;
use crate::hash_input::HashInput;
use crate::provable::{Descriptor, HashInputCodec, JsonCodec, Provable};
use crate::value::CircuitValue;

/// Descriptor for a single field element.
pub fn field() -> Descriptor {
    Descriptor::new(FieldType)
}

/// Descriptor for a boolean.
pub fn boolean() -> Descriptor {
    Descriptor::new(BoolType)
}

/// Descriptor for an unsigned 32-bit integer.
pub fn uint32() -> Descriptor {
    Descriptor::new(UInt32Type)
}

/// Descriptor for host data that never enters the circuit.
pub fn opaque() -> Descriptor {
    Descriptor::new(OpaqueType)
}

fn single(type_name: &str, fields: &[Field]) -> Result<Field, CircuitValueError> {
    match fields {
        [f] => Ok(*f),
        _ => Err(CircuitValueError::arity(type_name, 1, fields.len())),
    }
}

fn expect_field(type_name: &str, value: &CircuitValue) -> Result<Field, CircuitValueError> {
    value
        .as_field()
        .ok_or_else(|| CircuitValueError::shape(type_name, "a field element", value.variant_name()))
}

/// Parse a decimal string or a JSON integer.
fn decimal(json: &Json) -> Option<Fp> {
    match json {
        Json::String(s) => s.parse().ok(),
        Json::Number(n) => n.as_u64().and_then(|v| v.to_string().parse().ok()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldType;

impl Provable for FieldType {
    fn type_name(&self) -> String {
        "Field".into()
    }

    fn size_in_fields(&self) -> usize {
        1
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        Ok(vec![expect_field("Field", value)?])
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        Ok(CircuitValue::Field(single("Field", fields)?))
    }

    fn check(&self, _value: &CircuitValue) -> Result<(), CircuitValueError> {
        Ok(())
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        Some(self)
    }
}

impl HashInputCodec for FieldType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        Ok(HashInput::from_fields(vec![expect_field("Field", value)?]))
    }
}

impl JsonCodec for FieldType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        let v = expect_field("Field", value)?.value()?;
        Ok(Json::String(v.to_string()))
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        Ok(decimal(json).map(CircuitValue::from))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoolType;

impl BoolType {
    fn expect(value: &CircuitValue) -> Result<Bool, CircuitValueError> {
        value
            .as_bool()
            .ok_or_else(|| CircuitValueError::shape("Bool", "a boolean", value.variant_name()))
    }
}

impl Provable for BoolType {
    fn type_name(&self) -> String {
        "Bool".into()
    }

    fn size_in_fields(&self) -> usize {
        1
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        Ok(vec![Self::expect(value)?.to_field()])
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        Ok(CircuitValue::Bool(Bool::from_field_unchecked(single(
            "Bool", fields,
        )?)))
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        Ok(Self::expect(value)?.to_field().assert_boolean()?)
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        Some(self)
    }
}

impl HashInputCodec for BoolType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        Ok(HashInput::from_packed(vec![(
            Self::expect(value)?.to_field(),
            1,
        )]))
    }
}

impl JsonCodec for BoolType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        Ok(Json::Bool(Self::expect(value)?.value()?))
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        Ok(json.as_bool().map(CircuitValue::from))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UInt32Type;

impl Provable for UInt32Type {
    fn type_name(&self) -> String {
        "UInt32".into()
    }

    fn size_in_fields(&self) -> usize {
        1
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        Ok(vec![expect_field("UInt32", value)?])
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        Ok(CircuitValue::Field(single("UInt32", fields)?))
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        Ok(expect_field("UInt32", value)?.assert_range(32)?)
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        Some(self)
    }
}

impl HashInputCodec for UInt32Type {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        Ok(HashInput::from_packed(vec![(
            expect_field("UInt32", value)?,
            32,
        )]))
    }
}

impl JsonCodec for UInt32Type {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        let v = expect_field("UInt32", value)?.value()?;
        Ok(Json::String(v.to_string()))
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        Ok(decimal(json)
            .filter(|v| v.as_u64() <= u64::from(u32::MAX))
            .map(CircuitValue::from))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpaqueType;

impl OpaqueType {
    fn expect(value: &CircuitValue) -> Result<(), CircuitValueError> {
        match value {
            // Compile passes rebuild auxiliary entries as nulls.
            CircuitValue::Opaque(_) | CircuitValue::Primitive(Json::Null) => Ok(()),
            other => Err(CircuitValueError::shape(
                "Opaque",
                "an opaque value",
                other.variant_name(),
            )),
        }
    }
}

impl Provable for OpaqueType {
    fn type_name(&self) -> String {
        "Opaque".into()
    }

    fn size_in_fields(&self) -> usize {
        0
    }

    fn size_in_aux(&self) -> usize {
        1
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        Self::expect(value)?;
        Ok(Vec::new())
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields_with_aux(fields, &[])
    }

    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        if !fields.is_empty() {
            return Err(CircuitValueError::arity("Opaque", 0, fields.len()));
        }
        match aux {
            [value] => Ok(value.clone()),
            _ => Err(CircuitValueError::aux_arity("Opaque", 1, aux.len())),
        }
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        Self::expect(value)
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        vec![value.clone()]
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }
}

impl HashInputCodec for OpaqueType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        Self::expect(value)?;
        Ok(HashInput::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provable::DescriptorKind;
    use crate::value::Opaque;
    use cvt_field::{constraint_system, run_and_check, CircuitError};
    use serde_json::json;

    #[test]
    fn leaves_are_full_single_element_descriptors() {
        for d in [field(), boolean(), uint32()] {
            assert_eq!(d.size_in_fields(), 1);
            assert_eq!(d.kind(), DescriptorKind::Full);
        }
    }

    #[test]
    fn of_fields_requires_exactly_one_element() {
        let two = [Field::ONE, Field::ZERO];
        assert_eq!(
            field().of_fields(&two),
            Err(CircuitValueError::arity("Field", 1, 2))
        );
        assert!(boolean().of_fields(&[]).is_err());
    }

    #[test]
    fn wrong_variant_is_a_shape_mismatch() {
        let err = boolean().to_fields(&CircuitValue::from(1u64)).unwrap_err();
        assert!(matches!(err, CircuitValueError::ShapeMismatch { .. }));
    }

    #[test]
    fn bool_check_rejects_two() {
        let bogus = boolean().of_fields(&[Field::constant(2u64)]).unwrap();
        assert!(matches!(
            boolean().check(&bogus),
            Err(CircuitValueError::Circuit(CircuitError::NotBoolean(_)))
        ));
    }

    #[test]
    fn uint32_check_records_a_range_gate() {
        let cs = constraint_system(|| {
            let w = cvt_field::exists(1, || Ok::<_, CircuitError>(vec![]))?;
            uint32().check(&CircuitValue::Field(w[0]))
        })
        .unwrap();
        assert_eq!(cs.rows(), 1);

        let too_big = CircuitValue::from(1u64 << 32);
        assert!(run_and_check(|| uint32().check(&too_big)).is_err());
    }

    #[test]
    fn json_encodings() {
        assert_eq!(
            field().to_json(&CircuitValue::from(12u64)).unwrap(),
            json!("12")
        );
        assert_eq!(boolean().to_json(&true.into()).unwrap(), json!(true));
        assert_eq!(
            uint32().from_json(&json!("4294967295")).unwrap(),
            Some(CircuitValue::from(u64::from(u32::MAX)))
        );
        assert_eq!(uint32().from_json(&json!("4294967296")).unwrap(), None);
        assert_eq!(field().from_json(&json!(7)).unwrap(), Some(7u64.into()));
        assert_eq!(field().from_json(&json!([1])).unwrap(), None);
        assert_eq!(boolean().from_json(&json!("true")).unwrap(), None);
    }

    #[test]
    fn hash_inputs_pack_small_types() {
        let b = boolean().to_input(&true.into()).unwrap();
        assert_eq!(b.packed, vec![(Field::ONE, 1)]);
        let u = uint32().to_input(&CircuitValue::from(5u64)).unwrap();
        assert_eq!(u.packed, vec![(Field::constant(5u64), 32)]);
        let f = field().to_input(&CircuitValue::from(5u64)).unwrap();
        assert_eq!(f.fields, vec![Field::constant(5u64)]);
    }

    #[test]
    fn opaque_values_travel_as_auxiliary_data() {
        let d = opaque();
        assert_eq!(d.size_in_fields(), 0);
        assert_eq!(d.size_in_aux(), 1);
        assert_eq!(d.kind(), DescriptorKind::FieldsOnly);

        let handle = Opaque::new(String::from("session"));
        let value = CircuitValue::Opaque(handle.clone());
        assert!(d.to_fields(&value).unwrap().is_empty());
        let aux = d.to_auxiliary(&value);
        match d.of_fields_with_aux(&[], &aux).unwrap() {
            CircuitValue::Opaque(back) => assert!(back.ptr_eq(&handle)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            d.of_fields(&[]),
            Err(CircuitValueError::arity("Opaque auxiliary data", 1, 0))
        );
        assert!(d.to_fields(&CircuitValue::from(1u64)).is_err());
    }
}
