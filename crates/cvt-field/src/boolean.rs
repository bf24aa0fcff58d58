//! # Circuit Booleans
//!
//! [`Bool`] wraps a [`Field`] that is known to hold 0 or 1. Logic gates are
//! expressed arithmetically, so they never need a fresh boolean constraint:
//! the product and complement of booleans are booleans.

use std::ops::Not;

use crate::error::CircuitError;
use crate::field::Field;
use crate::fp::Fp;

/// A field element constrained to `{0, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bool(Field);

impl Bool {
    /// The constant `true`.
    pub const TRUE: Bool = Bool(Field::ONE);
    /// The constant `false`.
    pub const FALSE: Bool = Bool(Field::ZERO);

    /// A constant boolean.
    pub fn constant(value: bool) -> Self {
        Bool(Field::Constant(Fp::from(value)))
    }

    /// Wrap a field element without constraining it.
    ///
    /// The caller is responsible for ensuring the element is 0 or 1, either
    /// by construction or through [`Field::assert_boolean`].
    pub fn from_field_unchecked(field: Field) -> Self {
        Bool(field)
    }

    /// The underlying field element.
    pub fn to_field(self) -> Field {
        self.0
    }

    /// Returns true for constants.
    pub fn is_constant(&self) -> bool {
        self.0.is_constant()
    }

    /// The concrete value.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::ValueUnavailable`] during a compile pass and
    /// [`CircuitError::NotBoolean`] if the underlying element is not 0 or 1.
    pub fn value(&self) -> Result<bool, CircuitError> {
        let v = self.0.value()?;
        if v == Fp::ZERO {
            Ok(false)
        } else if v == Fp::ONE {
            Ok(true)
        } else {
            Err(CircuitError::NotBoolean(v))
        }
    }

    /// Strip the variable binding, keeping only the value.
    ///
    /// # Errors
    ///
    /// Same as [`Bool::value`].
    pub fn to_constant(&self) -> Result<Bool, CircuitError> {
        self.value().map(Bool::constant)
    }

    /// `self && rhs`
    pub fn and(self, rhs: Bool) -> Bool {
        Bool(self.0 * rhs.0)
    }

    /// `self || rhs`
    pub fn or(self, rhs: Bool) -> Bool {
        !(!self).and(!rhs)
    }

    /// In-circuit equality of two booleans.
    pub fn equals(self, rhs: Bool) -> Bool {
        self.0.equals(rhs.0)
    }

    /// Constrain `self == rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::AssertionFailed`] on a known mismatch.
    pub fn assert_equal(self, rhs: Bool) -> Result<(), CircuitError> {
        self.0.assert_equal(rhs.0)
    }

    /// Constrain `self` to be true.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::AssertionFailed`] when known to be false.
    pub fn assert_true(self) -> Result<(), CircuitError> {
        self.0.assert_equal(Field::ONE)
    }
}

impl Not for Bool {
    type Output = Bool;

    fn not(self) -> Bool {
        Bool(Field::ONE - self.0)
    }
}

impl From<bool> for Bool {
    fn from(value: bool) -> Self {
        Bool::constant(value)
    }
}

impl From<Bool> for Field {
    fn from(value: Bool) -> Self {
        value.0
    }
}
