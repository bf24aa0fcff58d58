//! # Gates and Constraint-System Summaries
//!
//! Every non-constant operation in a circuit run records a [`Gate`]. The
//! gate list of a finished run is a [`ConstraintSystem`].
//!
//! ## Determinism
//!
//! Gates reference variables by allocation index and embed constants by
//! value, so two passes that execute the same logical computation record
//! identical gate lists regardless of the witness values involved.
//! [`ConstraintSystem::digest`] hashes the RFC 8785 canonical JSON of that
//! list, which makes a compile pass and a prove pass comparable
//! byte-for-byte.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CircuitError;
use crate::fp::Fp;

/// A gate input: either an embedded constant or a variable index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wire {
    /// A constant folded into the gate.
    Constant(Fp),
    /// A variable allocated earlier in the same run.
    Variable(usize),
}

/// Binary operations that produce a fresh output variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    IsEqual,
}

impl BinaryOp {
    pub(crate) fn gate(self, left: Wire, right: Wire, output: usize) -> Gate {
        match self {
            BinaryOp::Add => Gate::Add {
                left,
                right,
                output,
            },
            BinaryOp::Sub => Gate::Sub {
                left,
                right,
                output,
            },
            BinaryOp::Mul => Gate::Mul {
                left,
                right,
                output,
            },
            BinaryOp::IsEqual => Gate::IsEqual {
                left,
                right,
                output,
            },
        }
    }
}

/// A single recorded constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gate {
    /// `output = left + right`
    Add { left: Wire, right: Wire, output: usize },
    /// `output = left - right`
    Sub { left: Wire, right: Wire, output: usize },
    /// `output = left * right`
    Mul { left: Wire, right: Wire, output: usize },
    /// `output = (left == right) ? 1 : 0`
    IsEqual { left: Wire, right: Wire, output: usize },
    /// `left == right`
    AssertEqual { left: Wire, right: Wire },
    /// `wire * (wire - 1) == 0`
    Boolean { wire: Wire },
    /// `wire < 2^bits`
    Range { wire: Wire, bits: u32 },
}

impl Gate {
    /// Evaluate the gate against an assignment.
    ///
    /// Returns `None` when any referenced wire has no value.
    pub fn is_satisfied(&self, eval: impl Fn(Wire) -> Option<Fp>) -> Option<bool> {
        let out = |index: usize| eval(Wire::Variable(index));
        let holds = match *self {
            Gate::Add {
                left,
                right,
                output,
            } => out(output)? == eval(left)? + eval(right)?,
            Gate::Sub {
                left,
                right,
                output,
            } => out(output)? == eval(left)? - eval(right)?,
            Gate::Mul {
                left,
                right,
                output,
            } => out(output)? == eval(left)? * eval(right)?,
            Gate::IsEqual {
                left,
                right,
                output,
            } => out(output)? == Fp::from(eval(left)? == eval(right)?),
            Gate::AssertEqual { left, right } => eval(left)? == eval(right)?,
            Gate::Boolean { wire } => {
                let v = eval(wire)?;
                v == Fp::ZERO || v == Fp::ONE
            }
            Gate::Range { wire, bits } => {
                let v = eval(wire)?.as_u64();
                bits >= 64 || v < (1u64 << bits)
            }
        };
        Some(holds)
    }
}

/// Summary of a finished circuit run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystem {
    /// Number of variables allocated (witnesses plus derived outputs).
    pub variable_count: usize,
    /// Number of variables introduced through the witness primitive.
    pub witness_count: usize,
    /// Recorded gates, in execution order.
    pub gates: Vec<Gate>,
}

impl ConstraintSystem {
    /// Number of gates, one row each.
    pub fn rows(&self) -> usize {
        self.gates.len()
    }

    /// Lowercase hex SHA-256 of the canonical JSON of the gate list.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Serialization`] if canonicalization fails.
    pub fn digest(&self) -> Result<String, CircuitError> {
        let canonical = serde_jcs::to_string(&self.gates)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        let hash = Sha256::digest(canonical.as_bytes());
        Ok(hash.iter().map(|b| format!("{b:02x}")).collect())
    }
}
