//! # Structural Descriptors
//!
//! [`circuit_value`] synthesizes a descriptor for an ad hoc nested shape
//! without registering a schema. The shape is resolved once into a node
//! tree; every later operation walks that tree.
//!
//! | Shape | Size | Value |
//! |-------|------|-------|
//! | `Leaf(d)` | `d.size_in_fields()` | whatever `d` accepts |
//! | `Array([s..])` | sum over positions | `CircuitValue::Array` |
//! | `Object({k: s})` | sum over keys | `CircuitValue::Record` |
//! | `Constant(json)` | 0 | `CircuitValue::Primitive` equal to `json` |
//!
//! A constant is part of the type: any other value in its position is a
//! shape mismatch, and JSON that disagrees with it does not decode.
//! Auxiliary data of the leaves is gathered and handed back in the same
//! order as the fields.
//!
//! Object keys are visited in sorted order. [`ShapeOptions`] may override
//! the order of the top-level object only.

use std::collections::{BTreeMap, BTreeSet};

use cvt_field::Field;
use serde_json::{Map, Value as Json};

use crate::error::CircuitValueError;
use crate::hash_input::HashInput;
use crate::provable::{Descriptor, HashInputCodec, JsonCodec, Provable};
use crate::value::{CircuitValue, Record};

/// A nested shape around circuit-compatible leaves.
#[derive(Clone, Debug)]
pub enum Shape {
    /// A value that already has a descriptor; delegated to directly.
    Leaf(Descriptor),
    /// Positions recursed in order.
    Array(Vec<Shape>),
    /// Keys recursed in sorted order.
    Object(BTreeMap<String, Shape>),
    /// A host primitive that occupies no field elements.
    Constant(Json),
}

impl Shape {
    /// `length` copies of `element`.
    pub fn repeat(element: Shape, length: usize) -> Shape {
        Shape::Array(vec![element; length])
    }

    /// Build an object shape from `(key, shape)` pairs.
    pub fn object<K: Into<String>>(members: impl IntoIterator<Item = (K, Shape)>) -> Shape {
        Shape::Object(members.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }
}

impl From<Descriptor> for Shape {
    fn from(value: Descriptor) -> Self {
        Shape::Leaf(value)
    }
}

/// Options for [`circuit_value`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Member order of the top-level object, replacing sorted order. Must
    /// name exactly the object's keys.
    pub custom_object_keys: Option<Vec<String>>,
}

/// Synthesize a descriptor for `shape`.
///
/// # Errors
///
/// Returns [`CircuitValueError::InvalidShape`] when `custom_object_keys`
/// is set but the shape is not an object or the key lists disagree.
pub fn circuit_value(shape: &Shape, options: &ShapeOptions) -> Result<Descriptor, CircuitValueError> {
    let root = match (&options.custom_object_keys, shape) {
        (None, _) => Node::resolve(shape),
        (Some(keys), Shape::Object(members)) => {
            let wanted: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
            let present: BTreeSet<&str> = members.keys().map(String::as_str).collect();
            if wanted.len() != keys.len() || wanted != present {
                return Err(CircuitValueError::InvalidShape(format!(
                    "custom key order {keys:?} does not match object keys {present:?}"
                )));
            }
            let mut ordered = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(s) = members.get(key) {
                    ordered.push((key.clone(), Node::resolve(s)));
                }
            }
            Node::object(ordered)
        }
        (Some(_), _) => {
            return Err(CircuitValueError::InvalidShape(
                "custom key order requires an object shape".into(),
            ))
        }
    };
    Ok(Descriptor::new(StructuralType { root }))
}

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf(Descriptor),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
    Constant(Json),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    size: usize,
    aux: usize,
}

impl Node {
    fn resolve(shape: &Shape) -> Node {
        match shape {
            Shape::Leaf(d) => Node {
                size: d.size_in_fields(),
                aux: d.size_in_aux(),
                kind: NodeKind::Leaf(d.clone()),
            },
            Shape::Array(items) => {
                let items: Vec<Node> = items.iter().map(Node::resolve).collect();
                Node {
                    size: items.iter().map(|n| n.size).sum(),
                    aux: items.iter().map(|n| n.aux).sum(),
                    kind: NodeKind::Array(items),
                }
            }
            Shape::Object(members) => Node::object(
                members
                    .iter()
                    .map(|(k, s)| (k.clone(), Node::resolve(s)))
                    .collect(),
            ),
            Shape::Constant(json) => Node {
                size: 0,
                aux: 0,
                kind: NodeKind::Constant(json.clone()),
            },
        }
    }

    fn object(members: Vec<(String, Node)>) -> Node {
        Node {
            size: members.iter().map(|(_, n)| n.size).sum(),
            aux: members.iter().map(|(_, n)| n.aux).sum(),
            kind: NodeKind::Object(members),
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Leaf(d) => d.type_name(),
            NodeKind::Array(items) => {
                let inner: Vec<_> = items.iter().map(Node::describe).collect();
                format!("[{}]", inner.join(", "))
            }
            NodeKind::Object(members) => {
                let inner: Vec<_> = members
                    .iter()
                    .map(|(k, n)| format!("{k}: {}", n.describe()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            NodeKind::Constant(json) => json.to_string(),
        }
    }

    fn supports_json(&self) -> bool {
        match &self.kind {
            NodeKind::Leaf(d) => d.supports(crate::error::Capability::Json),
            NodeKind::Array(items) => items.iter().all(Node::supports_json),
            NodeKind::Object(members) => members.iter().all(|(_, n)| n.supports_json()),
            NodeKind::Constant(_) => true,
        }
    }

    fn items<'a>(&self, value: &'a CircuitValue, len: usize) -> Result<&'a [CircuitValue], CircuitValueError> {
        let items = value
            .as_array()
            .ok_or_else(|| CircuitValueError::shape(&self.describe(), "an array", value.variant_name()))?;
        if items.len() != len {
            return Err(CircuitValueError::arity(&self.describe(), len, items.len()));
        }
        Ok(items)
    }

    fn member<'a>(&self, value: &'a CircuitValue, key: &str) -> Result<&'a CircuitValue, CircuitValueError> {
        let record = value
            .as_record()
            .ok_or_else(|| CircuitValueError::shape(&self.describe(), "a record", value.variant_name()))?;
        record
            .get(key)
            .ok_or_else(|| CircuitValueError::shape(&self.describe(), "every shape key", format!("no {key}")))
    }

    fn constant(&self, expected: &Json, value: &CircuitValue) -> Result<(), CircuitValueError> {
        match value {
            CircuitValue::Primitive(found) if found == expected => Ok(()),
            CircuitValue::Primitive(found) => Err(CircuitValueError::shape(
                &self.describe(),
                "the declared constant",
                found,
            )),
            other => Err(CircuitValueError::shape(
                &self.describe(),
                "a primitive",
                other.variant_name(),
            )),
        }
    }

    fn flatten(&self, value: &CircuitValue, out: &mut Vec<Field>) -> Result<(), CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => out.extend(d.to_fields(value)?),
            NodeKind::Array(nodes) => {
                for (node, item) in nodes.iter().zip(self.items(value, nodes.len())?) {
                    node.flatten(item, out)?;
                }
            }
            NodeKind::Object(members) => {
                for (key, node) in members {
                    node.flatten(self.member(value, key)?, out)?;
                }
            }
            NodeKind::Constant(json) => self.constant(json, value)?,
        }
        Ok(())
    }

    /// `fields` and `aux` hold exactly this node's share.
    fn rebuild(&self, fields: &[Field], aux: &[CircuitValue]) -> Result<CircuitValue, CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => d.of_fields_with_aux(fields, aux),
            NodeKind::Array(nodes) => {
                let (mut offset, mut aux_offset) = (0, 0);
                let mut items = Vec::with_capacity(nodes.len());
                for node in nodes {
                    items.push(node.rebuild(
                        &fields[offset..offset + node.size],
                        &aux[aux_offset..aux_offset + node.aux],
                    )?);
                    offset += node.size;
                    aux_offset += node.aux;
                }
                Ok(CircuitValue::Array(items))
            }
            NodeKind::Object(members) => {
                let (mut offset, mut aux_offset) = (0, 0);
                let mut record = Record::new();
                for (key, node) in members {
                    let member = node.rebuild(
                        &fields[offset..offset + node.size],
                        &aux[aux_offset..aux_offset + node.aux],
                    )?;
                    record.insert(key.clone(), member);
                    offset += node.size;
                    aux_offset += node.aux;
                }
                Ok(CircuitValue::Record(record))
            }
            NodeKind::Constant(json) => Ok(CircuitValue::Primitive(json.clone())),
        }
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => d.check(value),
            NodeKind::Array(nodes) => nodes
                .iter()
                .zip(self.items(value, nodes.len())?)
                .try_for_each(|(node, item)| node.check(item)),
            NodeKind::Object(members) => members
                .iter()
                .try_for_each(|(key, node)| node.check(self.member(value, key)?)),
            NodeKind::Constant(json) => self.constant(json, value),
        }
    }

    fn auxiliary(&self, value: &CircuitValue, out: &mut Vec<CircuitValue>) {
        match &self.kind {
            NodeKind::Leaf(d) => out.extend(d.to_auxiliary(value)),
            NodeKind::Array(nodes) => {
                if let Some(items) = value.as_array() {
                    for (node, item) in nodes.iter().zip(items) {
                        node.auxiliary(item, out);
                    }
                }
            }
            NodeKind::Object(members) => {
                if let Some(record) = value.as_record() {
                    for (key, node) in members {
                        if let Some(v) = record.get(key) {
                            node.auxiliary(v, out);
                        }
                    }
                }
            }
            NodeKind::Constant(_) => {}
        }
    }

    fn hash_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => d.to_input_or_fields(value),
            NodeKind::Array(nodes) => {
                let mut input = HashInput::empty();
                for (node, item) in nodes.iter().zip(self.items(value, nodes.len())?) {
                    input = input.append(node.hash_input(item)?);
                }
                Ok(input)
            }
            NodeKind::Object(members) => {
                let mut input = HashInput::empty();
                for (key, node) in members {
                    input = input.append(node.hash_input(self.member(value, key)?)?);
                }
                Ok(input)
            }
            NodeKind::Constant(json) => {
                self.constant(json, value)?;
                Ok(HashInput::empty())
            }
        }
    }

    fn encode(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => d.to_json(value),
            NodeKind::Array(nodes) => nodes
                .iter()
                .zip(self.items(value, nodes.len())?)
                .map(|(node, item)| node.encode(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            NodeKind::Object(members) => {
                let mut map = Map::new();
                for (key, node) in members {
                    map.insert(key.clone(), node.encode(self.member(value, key)?)?);
                }
                Ok(Json::Object(map))
            }
            NodeKind::Constant(json) => {
                self.constant(json, value)?;
                Ok(json.clone())
            }
        }
    }

    fn decode(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        match &self.kind {
            NodeKind::Leaf(d) => d.from_json(json),
            NodeKind::Array(nodes) => {
                let Some(raw) = json.as_array().filter(|a| a.len() == nodes.len()) else {
                    return Ok(None);
                };
                let mut items = Vec::with_capacity(nodes.len());
                for (node, r) in nodes.iter().zip(raw) {
                    match node.decode(r)? {
                        Some(item) => items.push(item),
                        None => return Ok(None),
                    }
                }
                Ok(Some(CircuitValue::Array(items)))
            }
            NodeKind::Object(members) => {
                let Json::Object(map) = json else {
                    return Ok(None);
                };
                let mut record = Record::new();
                for (key, node) in members {
                    let Some(member) = map.get(key).map(|r| node.decode(r)).transpose()?.flatten()
                    else {
                        return Ok(None);
                    };
                    record.insert(key.clone(), member);
                }
                Ok(Some(CircuitValue::Record(record)))
            }
            NodeKind::Constant(c) => Ok((json == c).then(|| CircuitValue::Primitive(c.clone()))),
        }
    }
}

/// Descriptor synthesized by [`circuit_value`].
#[derive(Clone, Debug)]
pub struct StructuralType {
    root: Node,
}

impl Provable for StructuralType {
    fn type_name(&self) -> String {
        self.root.describe()
    }

    fn size_in_fields(&self) -> usize {
        self.root.size
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        let mut out = Vec::with_capacity(self.root.size);
        self.root.flatten(value, &mut out)?;
        Ok(out)
    }

    fn size_in_aux(&self) -> usize {
        self.root.aux
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields_with_aux(fields, &[])
    }

    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        if fields.len() != self.root.size {
            return Err(CircuitValueError::arity(
                &self.type_name(),
                self.root.size,
                fields.len(),
            ));
        }
        if aux.len() != self.root.aux {
            return Err(CircuitValueError::aux_arity(
                &self.type_name(),
                self.root.aux,
                aux.len(),
            ));
        }
        self.root.rebuild(fields, aux)
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        self.root.check(value)
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        let mut out = Vec::new();
        self.root.auxiliary(value, &mut out);
        out
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        self.root.supports_json().then_some(self as &dyn JsonCodec)
    }
}

impl HashInputCodec for StructuralType {
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        self.root.hash_input(value)
    }
}

impl JsonCodec for StructuralType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        self.root.encode(value)
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        self.root.decode(json)
    }
}
