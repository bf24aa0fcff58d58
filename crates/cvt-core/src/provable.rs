//! # Descriptor Contract
//!
//! A descriptor is the capability bundle that makes a value kind
//! circuit-compatible. The mandatory capabilities live on [`Provable`];
//! `check` is a required method, so a descriptor without validation cannot
//! be constructed at all.
//!
//! The optional capabilities (hash input, JSON) are separate traits that a
//! descriptor exposes through [`Provable::hash_input`] and
//! [`Provable::json`]. [`Descriptor`] resolves them once, when it wraps the
//! implementation, and records the outcome as a [`DescriptorKind`]. Call
//! sites ask the wrapper rather than probing the implementation.
//!
//! ## Invariants
//!
//! - `size_in_fields()` does not depend on any value.
//! - `to_fields(v).len() == size_in_fields()`; [`Descriptor::to_fields`]
//!   enforces this on every call.
//! - `to_auxiliary(v).len() == size_in_aux()`, and
//!   `of_fields_with_aux(to_fields(v), to_auxiliary(v))` is structurally
//!   equal to `v`. For types without auxiliary data that reduces to
//!   `of_fields(to_fields(v))`.

use std::fmt;
use std::sync::Arc;

use cvt_field::Field;
use serde_json::Value as Json;

use crate::error::{Capability, CircuitValueError};
use crate::hash_input::HashInput;
use crate::value::CircuitValue;

/// The mandatory descriptor capabilities.
pub trait Provable: fmt::Debug + Send + Sync {
    /// Human-readable type name used in diagnostics.
    fn type_name(&self) -> String;

    /// Fixed number of field elements a value flattens to.
    fn size_in_fields(&self) -> usize;

    /// Flatten a value in canonical order.
    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError>;

    /// Rebuild a value from its flattening.
    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError>;

    /// Assert, inside the circuit, the type's range and shape invariants.
    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError>;

    /// Fixed number of auxiliary entries a value carries.
    fn size_in_aux(&self) -> usize {
        0
    }

    /// Non-arithmetic data carried alongside the flattening.
    fn to_auxiliary(&self, _value: &CircuitValue) -> Vec<CircuitValue> {
        Vec::new()
    }

    /// Rebuild a value from its flattening and its auxiliary data.
    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        _aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields(fields)
    }

    /// The hash-input capability, if supported.
    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        None
    }

    /// The JSON capability, if supported.
    fn json(&self) -> Option<&dyn JsonCodec> {
        None
    }
}

/// Canonical hash-input encoding.
pub trait HashInputCodec {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError>;
}

/// JSON encoding.
pub trait JsonCodec {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError>;

    /// Decode a value. `Ok(None)` means the input does not have the
    /// expected shape; it is not an error.
    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError>;
}

/// Which optional capabilities a descriptor carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Hash input and JSON are both available.
    Full,
    /// At least one optional capability is missing.
    FieldsOnly,
}

/// A shared, capability-resolved descriptor.
#[derive(Clone)]
pub struct Descriptor {
    inner: Arc<dyn Provable>,
    hash_input: bool,
    json: bool,
}

impl Descriptor {
    /// Wrap a descriptor implementation, resolving its optional capabilities.
    pub fn new(provable: impl Provable + 'static) -> Self {
        Self::from_arc(Arc::new(provable))
    }

    pub fn from_arc(inner: Arc<dyn Provable>) -> Self {
        let hash_input = inner.hash_input().is_some();
        let json = inner.json().is_some();
        Descriptor {
            inner,
            hash_input,
            json,
        }
    }

    pub fn kind(&self) -> DescriptorKind {
        if self.hash_input && self.json {
            DescriptorKind::Full
        } else {
            DescriptorKind::FieldsOnly
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::HashInput => self.hash_input,
            Capability::Json => self.json,
        }
    }

    pub fn type_name(&self) -> String {
        self.inner.type_name()
    }

    pub fn size_in_fields(&self) -> usize {
        self.inner.size_in_fields()
    }

    /// Flatten `value`, verifying the declared size.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitValueError::ArityMismatch`] if the implementation
    /// produced a different number of elements than it declares.
    pub fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        let fields = self.inner.to_fields(value)?;
        let expected = self.size_in_fields();
        if fields.len() != expected {
            return Err(CircuitValueError::arity(
                &self.type_name(),
                expected,
                fields.len(),
            ));
        }
        Ok(fields)
    }

    pub fn size_in_aux(&self) -> usize {
        self.inner.size_in_aux()
    }

    pub fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.inner.of_fields(fields)
    }

    /// Rebuild from fields and auxiliary data.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitValueError::ArityMismatch`] unless `aux` holds
    /// exactly `size_in_aux()` entries.
    pub fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        let expected = self.size_in_aux();
        if aux.len() != expected {
            return Err(CircuitValueError::aux_arity(
                &self.type_name(),
                expected,
                aux.len(),
            ));
        }
        self.inner.of_fields_with_aux(fields, aux)
    }

    pub fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        self.inner.check(value)
    }

    pub fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        self.inner.to_auxiliary(value)
    }

    /// Hash-input encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitValueError::MissingCapability`] when the descriptor
    /// has no hash-input capability.
    pub fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        match self.inner.hash_input() {
            Some(codec) if self.hash_input => codec.to_input(value),
            _ => Err(self.missing(Capability::HashInput)),
        }
    }

    /// Hash-input encoding, falling back to the plain flattening as
    /// unpacked fields when the capability is absent.
    pub fn to_input_or_fields(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        if self.hash_input {
            self.to_input(value)
        } else {
            Ok(HashInput::from_fields(self.to_fields(value)?))
        }
    }

    pub fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        match self.inner.json() {
            Some(codec) if self.json => codec.to_json(value),
            _ => Err(self.missing(Capability::Json)),
        }
    }

    /// Decode JSON. `Ok(None)` is the malformed-input sentinel.
    pub fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        match self.inner.json() {
            Some(codec) if self.json => codec.from_json(json),
            _ => Err(self.missing(Capability::Json)),
        }
    }

    fn missing(&self, capability: Capability) -> CircuitValueError {
        CircuitValueError::MissingCapability {
            type_name: self.type_name(),
            capability,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_name", &self.type_name())
            .field("size_in_fields", &self.size_in_fields())
            .field("kind", &self.kind())
            .finish()
    }
}
