//! # Compile Subcommand
//!
//! Compiles "witness a value of this shape and check it" into a constraint
//! system and prints its summary. With `--value`, also proves the same
//! circuit for a concrete value and verifies that both passes produced the
//! same constraint system.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use cvt_core::{witness, CircuitValue, CircuitValueError};
use cvt_field::{constraint_system, run_and_check, ConstraintSystem};

use crate::shape_file;

/// Arguments for the `cvt compile` subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Path to the shape file (YAML or JSON).
    #[arg(value_name = "SHAPE")]
    pub shape: PathBuf,

    /// Prove the circuit for this value (YAML or JSON) and compare digests.
    #[arg(long, value_name = "VALUE")]
    pub value: Option<PathBuf>,

    /// Include the full gate list in the output.
    #[arg(long)]
    pub gates: bool,
}

/// Execute the compile subcommand.
///
/// Returns exit code: 0 on success, 1 if the value does not match the
/// shape, fails its checks, or proves a different constraint system.
pub fn run_compile(args: &CompileArgs) -> Result<u8> {
    let descriptor = shape_file::load(&args.shape)?.descriptor()?;

    let compiled = constraint_system(|| {
        witness(&descriptor, || {
            Err(CircuitValueError::WitnessFailed(
                "no value while compiling".into(),
            ))
        })
    })?;
    let digest = compiled.digest()?;
    print_summary("compiled", &compiled, &digest, args.gates)?;

    let Some(value_path) = &args.value else {
        return Ok(0);
    };
    let raw = shape_file::read_document(value_path)?;
    let Some(value) = descriptor.from_json(&raw)? else {
        println!("FAIL: value does not match shape {}", descriptor.type_name());
        return Ok(1);
    };

    let proved = match run_and_check(|| witness(&descriptor, || Ok::<CircuitValue, _>(value))) {
        Ok(run) => run.constraint_system,
        Err(e) => {
            println!("FAIL: {e}");
            return Ok(1);
        }
    };
    let proved_digest = proved.digest()?;
    print_summary("proved", &proved, &proved_digest, args.gates)?;

    if proved_digest == digest {
        println!("OK: prove pass matches compiled constraint system");
        Ok(0)
    } else {
        tracing::warn!(compiled = %digest, proved = %proved_digest, "constraint systems differ");
        println!("FAIL: prove pass produced a different constraint system");
        Ok(1)
    }
}

fn print_summary(label: &str, cs: &ConstraintSystem, digest: &str, gates: bool) -> Result<()> {
    let mut report = json!({
        "pass": label,
        "rows": cs.rows(),
        "variables": cs.variable_count,
        "witnesses": cs.witness_count,
        "digest": digest,
    });
    if gates {
        report["gates"] = serde_json::to_value(&cs.gates)?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
