//! # Shape Files
//!
//! YAML or JSON documents describing a structural circuit type:
//!
//! ```yaml
//! order: [owner, amount, memo]   # optional top-level member order
//! shape:
//!   owner: [Field, Field]
//!   amount: UInt32
//!   flags: { $array: Bool, $length: 4 }
//!   memo: { $const: "transfer" }
//! ```
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `Field`, `Bool`, `UInt32` | leaf descriptor |
//! | sequence | positional array, one shape per position |
//! | mapping | object, members in sorted key order |
//! | `{ $array: s, $length: n }` | `n` copies of `s` |
//! | `{ $const: v }` | constant, occupies no field elements |
//!
//! A document may expand to at most [`MAX_SHAPE_NODES`] shape nodes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value as Json;

use cvt_core::{leaf, Descriptor, Shape, ShapeOptions};

/// Upper bound on the shape nodes a document may expand to.
pub const MAX_SHAPE_NODES: usize = 1 << 20;

/// A parsed shape file.
#[derive(Clone, Debug)]
pub struct ShapeFile {
    pub shape: Shape,
    pub options: ShapeOptions,
}

impl ShapeFile {
    /// Synthesize the descriptor for this shape.
    pub fn descriptor(&self) -> Result<Descriptor> {
        cvt_core::circuit_value(&self.shape, &self.options).context("shape is not usable")
    }
}

/// Read a YAML or JSON document into a JSON value.
pub fn read_document(path: &Path) -> Result<Json> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Load and parse a shape file.
pub fn load(path: &Path) -> Result<ShapeFile> {
    let doc = read_document(path)?;
    parse_document(&doc).with_context(|| format!("invalid shape file {}", path.display()))
}

/// Parse the top-level document (`shape` plus optional `order`).
pub fn parse_document(doc: &Json) -> Result<ShapeFile> {
    let shape = doc
        .get("shape")
        .ok_or_else(|| anyhow!("missing top-level `shape` key"))?;
    let custom_object_keys = match doc.get("order") {
        None | Some(Json::Null) => None,
        Some(Json::Array(keys)) => Some(
            keys.iter()
                .map(|k| {
                    k.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow!("`order` entries must be strings, found {k}"))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(other) => bail!("`order` must be a list of keys, found {other}"),
    };
    let shape = parse_shape(shape)?;
    let nodes = node_count(&shape);
    if nodes > MAX_SHAPE_NODES {
        bail!("shape expands to {nodes} nodes, more than the limit of {MAX_SHAPE_NODES}");
    }
    Ok(ShapeFile {
        shape,
        options: ShapeOptions { custom_object_keys },
    })
}

/// Parse one shape node.
pub fn parse_shape(node: &Json) -> Result<Shape> {
    match node {
        Json::String(name) => leaf_by_name(name).map(Shape::Leaf),
        Json::Array(items) => Ok(Shape::Array(
            items.iter().map(parse_shape).collect::<Result<Vec<_>>>()?,
        )),
        Json::Object(map) => {
            if let Some(value) = map.get("$const") {
                if map.len() != 1 {
                    bail!("`$const` cannot be combined with other keys");
                }
                return Ok(Shape::Constant(value.clone()));
            }
            if let Some(element) = map.get("$array") {
                let length = map
                    .get("$length")
                    .and_then(Json::as_u64)
                    .ok_or_else(|| anyhow!("`$array` requires a non-negative integer `$length`"))?;
                if map.len() != 2 {
                    bail!("`$array` accepts only `$length` alongside it");
                }
                let length = usize::try_from(length).context("`$length` is too large")?;
                let element = parse_shape(element)?;
                match length.checked_mul(node_count(&element)) {
                    Some(nodes) if nodes <= MAX_SHAPE_NODES => {}
                    _ => bail!(
                        "`$length` {length} expands past the limit of {MAX_SHAPE_NODES} shape nodes"
                    ),
                }
                return Ok(Shape::repeat(element, length));
            }
            let members = map
                .iter()
                .map(|(k, v)| Ok((k.clone(), parse_shape(v)?)))
                .collect::<Result<BTreeMap<_, _>>>()?;
            Ok(Shape::Object(members))
        }
        other => bail!("unsupported shape node {other}"),
    }
}

/// Nodes in `shape`, counting containers and leaves alike.
fn node_count(shape: &Shape) -> usize {
    match shape {
        Shape::Leaf(_) | Shape::Constant(_) => 1,
        Shape::Array(items) => items.iter().map(node_count).fold(1, usize::saturating_add),
        Shape::Object(members) => members.values().map(node_count).fold(1, usize::saturating_add),
    }
}

fn leaf_by_name(name: &str) -> Result<Descriptor> {
    match name {
        "Field" => Ok(leaf::field()),
        "Bool" => Ok(leaf::boolean()),
        "UInt32" => Ok(leaf::uint32()),
        other => bail!("unknown leaf type {other:?} (expected Field, Bool or UInt32)"),
    }
}

/// One leaf of a shape's flattened layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    /// JSON-pointer-style path to the leaf.
    pub path: String,
    pub type_name: String,
    pub offset: usize,
    pub size: usize,
}

/// The flattened layout of a shape, in flattening order.
///
/// Mirrors the member order of the synthesized descriptor: sorted keys,
/// except the top-level object when a custom order is given.
pub fn layout(file: &ShapeFile) -> Vec<LayoutEntry> {
    let mut out = Vec::new();
    let mut offset = 0;
    match (&file.shape, &file.options.custom_object_keys) {
        (Shape::Object(members), Some(order)) => {
            for key in order {
                if let Some(s) = members.get(key) {
                    walk(s, &format!("/{key}"), &mut offset, &mut out);
                }
            }
        }
        (shape, _) => walk(shape, "", &mut offset, &mut out),
    }
    out
}

fn walk(shape: &Shape, path: &str, offset: &mut usize, out: &mut Vec<LayoutEntry>) {
    match shape {
        Shape::Leaf(d) => {
            let size = d.size_in_fields();
            out.push(LayoutEntry {
                path: if path.is_empty() { "/".into() } else { path.into() },
                type_name: d.type_name(),
                offset: *offset,
                size,
            });
            *offset += size;
        }
        Shape::Array(items) => {
            for (i, s) in items.iter().enumerate() {
                walk(s, &format!("{path}/{i}"), offset, out);
            }
        }
        Shape::Object(members) => {
            for (k, s) in members {
                walk(s, &format!("{path}/{k}"), offset, out);
            }
        }
        Shape::Constant(_) => {}
    }
}
