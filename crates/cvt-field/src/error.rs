//! # Engine Errors
//!
//! Faults raised by the arithmetic engine. Every variant aborts the current
//! construction pass; nothing here is retried.

use thiserror::Error;

use crate::fp::Fp;

/// Error raised by field arithmetic or the checked-computation runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// A variable's value was read during a compile pass, where no values exist.
    #[error("variable value is not available while compiling a constraint system")]
    ValueUnavailable,

    /// An assertion over known values failed.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// A field element expected to be 0 or 1 was something else.
    #[error("expected a boolean field element, found {0}")]
    NotBoolean(Fp),

    /// A recorded gate does not hold for the assigned values.
    #[error("constraint {index} is not satisfied: {gate}")]
    Unsatisfied {
        /// Position of the gate in the constraint system.
        index: usize,
        /// Debug rendering of the offending gate.
        gate: String,
    },

    /// A witness computation produced the wrong number of elements.
    #[error("witness produced {actual} field elements, expected {expected}")]
    WitnessArity {
        /// Number of elements the witness slot was declared with.
        expected: usize,
        /// Number of elements the computation returned.
        actual: usize,
    },

    /// A decimal field literal could not be parsed.
    #[error("invalid field literal: {0:?}")]
    InvalidLiteral(String),

    /// A decimal literal parsed but is not below the modulus.
    #[error("field literal {0} is not a canonical element")]
    NonCanonical(String),

    /// Canonical serialization of a constraint system failed.
    #[error("constraint system serialization failed: {0}")]
    Serialization(String),
}
