//! # cvt-core — Circuit-Value Type System
//!
//! Converts structured application data into the flat, ordered sequence of
//! field elements an arithmetic circuit consumes, and back.
//!
//! ## Architecture
//!
//! - **Descriptor contract** (`provable.rs`): the [`Provable`] trait and the
//!   capability-resolved [`Descriptor`] wrapper every other module builds on.
//!
//! - **Values** (`value.rs`): [`CircuitValue`], the dynamic value model with
//!   declared atomic / composite / container kinds.
//!
//! - **Leaves** (`leaf.rs`): built-in `Field`, `Bool` and `UInt32`
//!   descriptors, plus `Opaque` for host data carried as auxiliary data.
//!
//! - **Schema registry** (`schema.rs`) and **composite base**
//!   (`composite.rs`): named composite types registered member by member,
//!   with flatten / rebuild / check / hash input / JSON derived from the
//!   schema.
//!
//! - **Combinators** (`combinators.rs`): fixed-length arrays, matrices and
//!   heterogeneous tuples.
//!
//! - **Structural builder** (`structural.rs`): descriptors for ad hoc nested
//!   shapes without a registered schema.
//!
//! - **Witnesses** (`witness.rs`): witness introduction, memoized replay
//!   across construction passes, context-scoped blinding values.
//!
//! - **Multiplexer** (`switch.rs`) and **generic operations** (`ops.rs`).
//!
//! - **Entry-point adapters** (`adapter.rs`): [`AsFieldsAndAux`] and the
//!   argument layout used by circuit entry points.
//!
//! ## Crate Policy
//!
//! - Depends only on `cvt-field` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests; every fault is a
//!   [`CircuitValueError`].

pub mod adapter;
pub mod combinators;
pub mod composite;
pub mod error;
pub mod hash_input;
pub mod leaf;
pub mod ops;
pub mod provable;
pub mod schema;
pub mod structural;
pub mod switch;
pub mod value;
pub mod witness;

// Re-export primary types for ergonomic imports.
pub use adapter::{flatten_arguments, unflatten_arguments, AsFieldsAndAux, FieldsAndAux, FlatArguments};
pub use combinators::{circuit_array, matrix, type_of_array};
pub use composite::CompositeType;
pub use error::{Capability, CircuitValueError};
pub use hash_input::{HashInput, PACKED_FIELD_CAPACITY};
pub use ops::{assert_equal, equal, is_constant, provable_if, to_constant};
pub use provable::{Descriptor, DescriptorKind, HashInputCodec, JsonCodec, Provable};
pub use schema::{Member, Schema, SchemaBuilder, SchemaEntry, SchemaRegistry};
pub use structural::{circuit_value, Shape, ShapeOptions};
pub use switch::switch;
pub use value::{CircuitValue, Opaque, Record, ValueKind};
pub use witness::{get_blinding_value, has_memoization_context, memoize_witness, witness, MemoizationContext};
