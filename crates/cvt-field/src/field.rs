//! # Circuit Field Elements
//!
//! [`Field`] is the value every circuit type flattens to. It is either a
//! constant known at construction time or a variable allocated in the
//! active circuit run.
//!
//! Arithmetic on two constants folds immediately. Anything involving a
//! variable allocates an output variable and records a gate; in a prove
//! pass the output carries its computed value, in a compile pass it does
//! not.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::boolean::Bool;
use crate::circuit;
use crate::constraint::{BinaryOp, Gate, Wire};
use crate::error::CircuitError;
use crate::fp::Fp;

/// A variable allocated in a circuit run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    pub(crate) index: usize,
    pub(crate) value: Option<Fp>,
}

impl Variable {
    /// Placeholder for a value-less variable used outside its run.
    pub(crate) const DETACHED: Variable = Variable {
        index: usize::MAX,
        value: None,
    };

    /// Allocation index within the run that created it.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The assigned value, present only in prove-mode runs.
    pub fn value(&self) -> Option<Fp> {
        self.value
    }
}

/// A circuit field element: constant or variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// A value fixed at construction time.
    Constant(Fp),
    /// A variable of the active circuit.
    Variable(Variable),
}

impl Field {
    /// The constant zero.
    pub const ZERO: Field = Field::Constant(Fp::ZERO);
    /// The constant one.
    pub const ONE: Field = Field::Constant(Fp::ONE);

    /// A constant field element.
    pub fn constant(value: impl Into<Fp>) -> Self {
        Field::Constant(value.into())
    }

    /// Returns true for constants.
    pub fn is_constant(&self) -> bool {
        matches!(self, Field::Constant(_))
    }

    /// The concrete value.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::ValueUnavailable`] for a variable without an
    /// assignment (compile pass).
    pub fn value(&self) -> Result<Fp, CircuitError> {
        match self {
            Field::Constant(v) => Ok(*v),
            Field::Variable(var) => var.value.ok_or(CircuitError::ValueUnavailable),
        }
    }

    /// Strip the variable binding, keeping only the value.
    ///
    /// # Errors
    ///
    /// Same as [`Field::value`].
    pub fn to_constant(&self) -> Result<Field, CircuitError> {
        self.value().map(Field::Constant)
    }

    pub(crate) fn wire(&self) -> Wire {
        match self {
            Field::Constant(v) => Wire::Constant(*v),
            Field::Variable(var) => Wire::Variable(var.index),
        }
    }

    fn known(&self) -> Option<Fp> {
        self.value().ok()
    }

    fn binary(self, rhs: Field, op: BinaryOp, f: fn(Fp, Fp) -> Fp) -> Field {
        match (self, rhs) {
            (Field::Constant(a), Field::Constant(b)) => Field::Constant(f(a, b)),
            _ => {
                let value = self.known().zip(rhs.known()).map(|(a, b)| f(a, b));
                circuit::derive(op, self, rhs, value)
            }
        }
    }

    /// `self * self`
    pub fn square(self) -> Field {
        self * self
    }

    /// In-circuit equality test.
    pub fn equals(self, rhs: Field) -> Bool {
        let eq = self.binary(rhs, BinaryOp::IsEqual, |a, b| Fp::from(a == b));
        Bool::from_field_unchecked(eq)
    }

    /// Constrain `self == rhs`.
    ///
    /// Fails immediately when both values are known and differ; otherwise
    /// records a gate checked at the end of the run.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::AssertionFailed`] on a known mismatch.
    pub fn assert_equal(self, rhs: Field) -> Result<(), CircuitError> {
        if let (Some(a), Some(b)) = (self.known(), rhs.known()) {
            if a != b {
                return Err(CircuitError::AssertionFailed(format!("{a} != {b}")));
            }
        }
        if !(self.is_constant() && rhs.is_constant()) {
            circuit::constrain(Gate::AssertEqual {
                left: self.wire(),
                right: rhs.wire(),
            });
        }
        Ok(())
    }

    /// Constrain `self` to be 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotBoolean`] on a known violation.
    pub fn assert_boolean(self) -> Result<(), CircuitError> {
        if let Some(v) = self.known() {
            if v != Fp::ZERO && v != Fp::ONE {
                return Err(CircuitError::NotBoolean(v));
            }
        }
        if !self.is_constant() {
            circuit::constrain(Gate::Boolean { wire: self.wire() });
        }
        Ok(())
    }

    /// Constrain `self < 2^bits`.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::AssertionFailed`] on a known violation.
    pub fn assert_range(self, bits: u32) -> Result<(), CircuitError> {
        if let Some(v) = self.known() {
            if bits < 64 && v.as_u64() >= (1u64 << bits) {
                return Err(CircuitError::AssertionFailed(format!(
                    "{v} does not fit in {bits} bits"
                )));
            }
        }
        if !self.is_constant() {
            circuit::constrain(Gate::Range {
                wire: self.wire(),
                bits,
            });
        }
        Ok(())
    }
}

impl Add for Field {
    type Output = Field;

    fn add(self, rhs: Field) -> Field {
        self.binary(rhs, BinaryOp::Add, |a, b| a + b)
    }
}

impl Sub for Field {
    type Output = Field;

    fn sub(self, rhs: Field) -> Field {
        self.binary(rhs, BinaryOp::Sub, |a, b| a - b)
    }
}

impl Mul for Field {
    type Output = Field;

    fn mul(self, rhs: Field) -> Field {
        self.binary(rhs, BinaryOp::Mul, |a, b| a * b)
    }
}

impl Neg for Field {
    type Output = Field;

    fn neg(self) -> Field {
        Field::ZERO - self
    }
}

impl From<Fp> for Field {
    fn from(value: Fp) -> Self {
        Field::Constant(value)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Constant(Fp::new(value))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Constant(v) => write!(f, "{v}"),
            Field::Variable(var) => match var.value {
                Some(v) => write!(f, "v{}={v}", var.index),
                None => write!(f, "v{}", var.index),
            },
        }
    }
}
