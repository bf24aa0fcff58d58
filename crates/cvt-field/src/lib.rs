//! # cvt-field — Arithmetic Engine for Circuit Values
//!
//! The field-arithmetic collaborator the circuit-value type system is built
//! against. It owns everything that touches raw field elements and circuit
//! wiring; `cvt-core` never reaches below this API.
//!
//! ## Architecture
//!
//! - **Field** (`fp.rs`): [`Fp`], an element of the 64-bit Goldilocks prime
//!   field `p = 2^64 - 2^32 + 1`.
//!
//! - **Circuit values** (`field.rs`, `boolean.rs`): [`Field`] is either a
//!   constant or a variable allocated in the active circuit. [`Bool`] is a
//!   `Field` known to be 0 or 1.
//!
//! - **Runtime** (`circuit.rs`): the checked-computation mode. A circuit run
//!   is either a *compile* pass (variables carry no values, witness closures
//!   are skipped) or a *prove* pass (variables carry values, every gate is
//!   verified at the end). Runs are scoped on a thread-local stack and the
//!   previous state is restored on every exit path, including panics.
//!
//! - **Constraints** (`constraint.rs`): the recorded [`Gate`] list and the
//!   [`ConstraintSystem`] summary with a canonical SHA-256 digest.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cvt-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod boolean;
pub mod circuit;
pub mod constraint;
pub mod error;
pub mod field;
pub mod fp;

// Re-export primary types for ergonomic imports.
pub use boolean::Bool;
pub use circuit::{
    as_prover, constraint_system, exists, in_checked_computation, in_prover, mode, run_and_check,
    CircuitRun, Mode,
};
pub use constraint::{ConstraintSystem, Gate, Wire};
pub use error::CircuitError;
pub use field::{Field, Variable};
pub use fp::{Fp, MODULUS};
