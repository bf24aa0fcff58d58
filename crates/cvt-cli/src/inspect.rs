//! # Inspect Subcommand
//!
//! Prints the flattened layout of a shape: total size, descriptor kind and
//! the offset of every leaf.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::shape_file::{self, LayoutEntry};

/// Arguments for the `cvt inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the shape file (YAML or JSON).
    #[arg(value_name = "SHAPE")]
    pub shape: PathBuf,

    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect subcommand. Always exits 0 on success.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let file = shape_file::load(&args.shape)?;
    let descriptor = file.descriptor()?;
    let entries = shape_file::layout(&file);
    tracing::info!(
        shape = %args.shape.display(),
        size = descriptor.size_in_fields(),
        leaves = entries.len(),
        "inspected shape"
    );

    if args.json {
        let report = json!({
            "type_name": descriptor.type_name(),
            "size_in_fields": descriptor.size_in_fields(),
            "kind": format!("{:?}", descriptor.kind()),
            "layout": entries.iter().map(entry_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("type:  {}", descriptor.type_name());
        println!("size:  {}", descriptor.size_in_fields());
        println!("kind:  {:?}", descriptor.kind());
        for e in &entries {
            println!("  [{:>4}..{:<4}] {:<8} {}", e.offset, e.offset + e.size, e.type_name, e.path);
        }
    }
    Ok(0)
}

fn entry_json(e: &LayoutEntry) -> serde_json::Value {
    json!({
        "path": e.path,
        "type": e.type_name,
        "offset": e.offset,
        "size": e.size,
    })
}
