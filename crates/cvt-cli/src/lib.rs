//! # cvt-cli — Developer CLI for Circuit-Value Shapes
//!
//! Provides the `cvt` command-line interface over structural circuit types
//! described in shape files (see [`shape_file`]).
//!
//! ## Subcommands
//!
//! - `cvt inspect` — Flattened layout: size, kind and leaf offsets.
//! - `cvt flatten` — Decode a value against a shape and print its fields.
//! - `cvt compile` — Constraint-system summary, optionally cross-checked
//!   against a prove pass for a concrete value.
//!
//! ```bash
//! cvt inspect note.yaml --json
//! cvt flatten note.yaml value.json --hash-input --verify
//! cvt compile note.yaml --value value.json
//! ```
//!
//! Every handler returns an exit code: 0 on success, 1 when the input is
//! valid but the check it asked for failed. Operational errors propagate as
//! `anyhow::Error` and exit 1 from `main`.

pub mod compile;
pub mod flatten;
pub mod inspect;
pub mod shape_file;
