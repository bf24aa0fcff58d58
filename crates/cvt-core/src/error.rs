//! # Error Types
//!
//! The failure taxonomy of the circuit-value type system. Every variant is
//! fatal to the construction pass that raised it; nothing is retried.
//!
//! Malformed JSON is deliberately absent: decoders report it as `Ok(None)`
//! so callers can distinguish "bad input" from "bad descriptor".

use std::fmt;

use cvt_field::CircuitError;
use thiserror::Error;

/// An optional descriptor capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Canonical hash-input encoding.
    HashInput,
    /// JSON encode/decode.
    Json,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::HashInput => f.write_str("hash input"),
            Capability::Json => f.write_str("json"),
        }
    }
}

/// Errors raised while flattening, reconstructing, checking or selecting
/// circuit values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitValueError {
    /// A field sequence or tuple does not have the length a descriptor expects.
    #[error("{type_name}: expected {expected} elements, got {actual}")]
    ArityMismatch {
        /// Descriptor that detected the mismatch.
        type_name: String,
        /// Length the descriptor requires.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A descriptor was used where it must expose a capability it lacks.
    #[error("{type_name} does not support {capability}")]
    MissingCapability {
        /// Descriptor lacking the capability.
        type_name: String,
        /// The capability that was required.
        capability: Capability,
    },

    /// A construction-time invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Multiplexer selector and candidate lists differ in length.
    #[error("selector has {mask} entries but {values} candidates were supplied")]
    LengthMismatch {
        /// Number of selector bits.
        mask: usize,
        /// Number of candidate values.
        values: usize,
    },

    /// A value does not have the shape its descriptor describes.
    #[error("{type_name}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Descriptor that rejected the value.
        type_name: String,
        /// What the descriptor expected.
        expected: &'static str,
        /// What it was given.
        found: String,
    },

    /// A composite member was registered twice.
    #[error("field {field:?} is already registered on {type_name}")]
    DuplicateField {
        /// Composite type name.
        type_name: String,
        /// Offending member name.
        field: String,
    },

    /// A structural shape description is not usable.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A witness computation reported a failure.
    #[error("witness computation failed: {0}")]
    WitnessFailed(String),

    /// An engine-level fault.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

impl CircuitValueError {
    pub(crate) fn shape(type_name: &str, expected: &'static str, found: impl fmt::Debug) -> Self {
        let mut found = format!("{found:?}");
        if found.chars().count() > 64 {
            found = found.chars().take(61).collect();
            found.push_str("...");
        }
        CircuitValueError::ShapeMismatch {
            type_name: type_name.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn arity(type_name: &str, expected: usize, actual: usize) -> Self {
        CircuitValueError::ArityMismatch {
            type_name: type_name.to_string(),
            expected,
            actual,
        }
    }

    pub(crate) fn aux_arity(type_name: &str, expected: usize, actual: usize) -> Self {
        Self::arity(&format!("{type_name} auxiliary data"), expected, actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_descriptor() {
        let err = CircuitValueError::arity("Point", 2, 1);
        assert_eq!(err.to_string(), "Point: expected 2 elements, got 1");

        let err = CircuitValueError::MissingCapability {
            type_name: "Opaque".into(),
            capability: Capability::HashInput,
        };
        assert_eq!(err.to_string(), "Opaque does not support hash input");
    }

    #[test]
    fn engine_errors_convert_transparently() {
        let err: CircuitValueError = CircuitError::ValueUnavailable.into();
        assert_eq!(err.to_string(), CircuitError::ValueUnavailable.to_string());
    }

    #[test]
    fn long_shape_descriptions_are_truncated() {
        let err = CircuitValueError::shape("Field", "a field", "x".repeat(200));
        match err {
            CircuitValueError::ShapeMismatch { found, .. } => {
                assert_eq!(found.chars().count(), 64);
                assert!(found.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
