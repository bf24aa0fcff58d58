//! # Flatten Subcommand
//!
//! Decodes a JSON/YAML value against a shape and prints its field
//! elements, optionally with the packed hash input.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use cvt_core::{CircuitValue, Descriptor};
use cvt_field::Field;

use crate::shape_file;

/// Arguments for the `cvt flatten` subcommand.
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Path to the shape file (YAML or JSON).
    #[arg(value_name = "SHAPE")]
    pub shape: PathBuf,

    /// Path to the value to flatten (YAML or JSON).
    #[arg(value_name = "VALUE")]
    pub value: PathBuf,

    /// Also print the packed hash input.
    #[arg(long)]
    pub hash_input: bool,

    /// Decode the flattening back and verify it re-encodes to the input.
    #[arg(long)]
    pub verify: bool,
}

/// Execute the flatten subcommand.
///
/// Returns exit code: 0 on success, 1 if the value does not match the
/// shape or fails verification.
pub fn run_flatten(args: &FlattenArgs) -> Result<u8> {
    let descriptor = shape_file::load(&args.shape)?.descriptor()?;
    let raw = shape_file::read_document(&args.value)?;

    let Some(value) = descriptor
        .from_json(&raw)
        .context("shape has no JSON encoding")?
    else {
        println!("FAIL: value does not match shape {}", descriptor.type_name());
        return Ok(1);
    };

    let fields = descriptor.to_fields(&value).context("failed to flatten value")?;
    tracing::debug!(size = fields.len(), "flattened value");

    let mut report = json!({ "fields": decimal(&fields)? });
    if args.hash_input {
        let packed = descriptor
            .to_input(&value)
            .context("failed to encode hash input")?
            .pack_to_fields();
        report["hash_input"] = json!(decimal(&packed)?);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.verify && !round_trips(&descriptor, &value, &fields)? {
        println!("FAIL: flattening does not round-trip");
        return Ok(1);
    }
    Ok(0)
}

fn round_trips(d: &Descriptor, value: &CircuitValue, fields: &[Field]) -> Result<bool> {
    let rebuilt = d.of_fields_with_aux(fields, &d.to_auxiliary(value))?;
    Ok(rebuilt.value_eq(value)? && d.to_fields(&rebuilt)? == fields)
}

fn decimal(fields: &[Field]) -> Result<Vec<String>> {
    fields
        .iter()
        .map(|f| Ok(f.value()?.to_string()))
        .collect()
}
