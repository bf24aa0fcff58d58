//! # Array and Tuple Combinators
//!
//! Build descriptors out of descriptors:
//!
//! - [`circuit_array`]: `length` copies of one element type, flattened
//!   element after element.
//! - [`type_of_array`]: a fixed-shape tuple of distinct element types,
//!   flattened position after position.
//!
//! Both produce ordinary [`Descriptor`]s, so they nest freely; a matrix is
//! an array of arrays and needs no separate implementation.
//!
//! Auxiliary data is sliced per element the same way fields are.
//!
//! Optional capabilities are inherited: an array supports hash input or
//! JSON exactly when its element does, a tuple when every position does.

use cvt_field::Field;
use serde_json::Value as Json;

use crate::error::{Capability, CircuitValueError};
use crate::hash_input::HashInput;
use crate::provable::{Descriptor, HashInputCodec, JsonCodec, Provable};
use crate::value::CircuitValue;

/// A fixed-length homogeneous array of `element`.
pub fn circuit_array(element: Descriptor, length: usize) -> Descriptor {
    Descriptor::new(ArrayType { element, length })
}

/// A `rows x cols` grid, stored row-major.
pub fn matrix(element: Descriptor, rows: usize, cols: usize) -> Descriptor {
    circuit_array(circuit_array(element, cols), rows)
}

/// A fixed-shape heterogeneous tuple.
pub fn type_of_array(elements: Vec<Descriptor>) -> Descriptor {
    Descriptor::new(TupleType { elements })
}

fn expect_items<'a>(
    type_name: &str,
    value: &'a CircuitValue,
    expected: usize,
) -> Result<&'a [CircuitValue], CircuitValueError> {
    let items = value
        .as_array()
        .ok_or_else(|| CircuitValueError::shape(type_name, "an array", value.variant_name()))?;
    if items.len() != expected {
        return Err(CircuitValueError::arity(type_name, expected, items.len()));
    }
    Ok(items)
}

fn expect_exact(type_name: &str, fields: &[Field], size: usize) -> Result<(), CircuitValueError> {
    if fields.len() != size {
        return Err(CircuitValueError::arity(type_name, size, fields.len()));
    }
    Ok(())
}

fn expect_aux(type_name: &str, aux: &[CircuitValue], size: usize) -> Result<(), CircuitValueError> {
    if aux.len() != size {
        return Err(CircuitValueError::aux_arity(type_name, size, aux.len()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    element: Descriptor,
    length: usize,
}

impl ArrayType {
    pub fn element(&self) -> &Descriptor {
        &self.element
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Provable for ArrayType {
    fn type_name(&self) -> String {
        format!("{}[{}]", self.element.type_name(), self.length)
    }

    fn size_in_fields(&self) -> usize {
        self.length * self.element.size_in_fields()
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        let items = expect_items(&self.type_name(), value, self.length)?;
        let mut fields = Vec::with_capacity(self.size_in_fields());
        for item in items {
            fields.extend(self.element.to_fields(item)?);
        }
        Ok(fields)
    }

    fn size_in_aux(&self) -> usize {
        self.length * self.element.size_in_aux()
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields_with_aux(fields, &[])
    }

    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        expect_exact(&self.type_name(), fields, self.size_in_fields())?;
        expect_aux(&self.type_name(), aux, self.size_in_aux())?;
        let (n, m) = (self.element.size_in_fields(), self.element.size_in_aux());
        let items = (0..self.length)
            .map(|i| {
                self.element
                    .of_fields_with_aux(&fields[i * n..(i + 1) * n], &aux[i * m..(i + 1) * m])
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CircuitValue::Array(items))
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        for item in expect_items(&self.type_name(), value, self.length)? {
            self.element.check(item)?;
        }
        Ok(())
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .flat_map(|item| self.element.to_auxiliary(item))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        self.element
            .supports(Capability::HashInput)
            .then_some(self as &dyn HashInputCodec)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        self.element
            .supports(Capability::Json)
            .then_some(self as &dyn JsonCodec)
    }
}

impl HashInputCodec for ArrayType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        let mut input = HashInput::empty();
        for item in expect_items(&self.type_name(), value, self.length)? {
            input = input.append(self.element.to_input(item)?);
        }
        Ok(input)
    }
}

impl JsonCodec for ArrayType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        expect_items(&self.type_name(), value, self.length)?
            .iter()
            .map(|item| self.element.to_json(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array)
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        let Some(raw) = json.as_array().filter(|a| a.len() == self.length) else {
            return Ok(None);
        };
        let mut items = Vec::with_capacity(self.length);
        for r in raw {
            match self.element.from_json(r)? {
                Some(item) => items.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(CircuitValue::Array(items)))
    }
}

#[derive(Debug, Clone)]
pub struct TupleType {
    elements: Vec<Descriptor>,
}

impl TupleType {
    pub fn elements(&self) -> &[Descriptor] {
        &self.elements
    }
}

impl Provable for TupleType {
    fn type_name(&self) -> String {
        let names: Vec<_> = self.elements.iter().map(Descriptor::type_name).collect();
        format!("({})", names.join(", "))
    }

    fn size_in_fields(&self) -> usize {
        self.elements.iter().map(Descriptor::size_in_fields).sum()
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        let items = expect_items(&self.type_name(), value, self.elements.len())?;
        let mut fields = Vec::with_capacity(self.size_in_fields());
        for (d, item) in self.elements.iter().zip(items) {
            fields.extend(d.to_fields(item)?);
        }
        Ok(fields)
    }

    fn size_in_aux(&self) -> usize {
        self.elements.iter().map(Descriptor::size_in_aux).sum()
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields_with_aux(fields, &[])
    }

    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        expect_exact(&self.type_name(), fields, self.size_in_fields())?;
        expect_aux(&self.type_name(), aux, self.size_in_aux())?;
        let (mut offset, mut aux_offset) = (0, 0);
        let mut items = Vec::with_capacity(self.elements.len());
        for d in &self.elements {
            let (n, m) = (d.size_in_fields(), d.size_in_aux());
            items.push(d.of_fields_with_aux(
                &fields[offset..offset + n],
                &aux[aux_offset..aux_offset + m],
            )?);
            offset += n;
            aux_offset += m;
        }
        Ok(CircuitValue::Array(items))
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        let items = expect_items(&self.type_name(), value, self.elements.len())?;
        for (d, item) in self.elements.iter().zip(items) {
            d.check(item)?;
        }
        Ok(())
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        value
            .as_array()
            .map(|items| {
                self.elements
                    .iter()
                    .zip(items)
                    .flat_map(|(d, item)| d.to_auxiliary(item))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        self.elements
            .iter()
            .all(|d| d.supports(Capability::HashInput))
            .then_some(self as &dyn HashInputCodec)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        self.elements
            .iter()
            .all(|d| d.supports(Capability::Json))
            .then_some(self as &dyn JsonCodec)
    }
}

impl HashInputCodec for TupleType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        let items = expect_items(&self.type_name(), value, self.elements.len())?;
        let mut input = HashInput::empty();
        for (d, item) in self.elements.iter().zip(items) {
            input = input.append(d.to_input(item)?);
        }
        Ok(input)
    }
}

impl JsonCodec for TupleType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        let items = expect_items(&self.type_name(), value, self.elements.len())?;
        self.elements
            .iter()
            .zip(items)
            .map(|(d, item)| d.to_json(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array)
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        let Some(raw) = json.as_array().filter(|a| a.len() == self.elements.len()) else {
            return Ok(None);
        };
        let mut items = Vec::with_capacity(raw.len());
        for (d, r) in self.elements.iter().zip(raw) {
            match d.from_json(r)? {
                Some(item) => items.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(CircuitValue::Array(items)))
    }
}
