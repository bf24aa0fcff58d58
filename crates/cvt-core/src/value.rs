//! # Circuit Values
//!
//! [`CircuitValue`] is the dynamic representation every descriptor operates
//! on. Each variant declares its kind up front, so cloning and comparison
//! never inspect runtime type names:
//!
//! | Kind | Variants | Clone | Compare |
//! |------|----------|-------|---------|
//! | Atomic | `Field`, `Bool`, `Primitive`, `Opaque` | copy / share | by value, opaque by identity |
//! | Composite | `Record` | member-wise | member-wise |
//! | Container | `Array` | element-wise | element-wise, length first |
//!
//! Derived `PartialEq` compares *wiring* (a variable equals only the same
//! variable). [`CircuitValue::value_eq`] compares the assigned values.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cvt_field::{Bool, Field, Fp};
use serde_json::Value as Json;

use crate::error::CircuitValueError;

/// A host value carried through a circuit untouched.
///
/// Opaque values are never deep-cloned and compare by identity.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wrap an arbitrary host value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Opaque(Arc::new(value))
    }

    /// Borrow the wrapped value as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

/// A keyed structure: an instance of a registered composite type or an ad
/// hoc object built by the structural builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// Registered type name; `None` for structural records.
    pub type_name: Option<String>,
    /// Member values by name.
    pub fields: BTreeMap<String, CircuitValue>,
}

impl Record {
    /// An empty structural record.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty record tagged with a composite type name.
    pub fn named(type_name: impl Into<String>) -> Self {
        Record {
            type_name: Some(type_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CircuitValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a member.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CircuitValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a member.
    pub fn get(&self, name: &str) -> Option<&CircuitValue> {
        self.fields.get(name)
    }
}

/// Declared kind of a value, used to pick clone/compare strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Indivisible: field elements, booleans, host primitives, opaque data.
    Atomic,
    /// Keyed structure compared member by member.
    Composite,
    /// Ordered sequence compared element by element.
    Container,
}

/// A circuit-shaped value.
#[derive(Clone, Debug, PartialEq)]
pub enum CircuitValue {
    /// A single field element.
    Field(Field),
    /// A boolean.
    Bool(Bool),
    /// A fixed-length array or heterogeneous tuple.
    Array(Vec<CircuitValue>),
    /// A keyed structure.
    Record(Record),
    /// A host primitive that occupies no field elements.
    Primitive(Json),
    /// A host value passed through by identity.
    Opaque(Opaque),
}

impl CircuitValue {
    /// The declared kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            CircuitValue::Field(_)
            | CircuitValue::Bool(_)
            | CircuitValue::Primitive(_)
            | CircuitValue::Opaque(_) => ValueKind::Atomic,
            CircuitValue::Record(_) => ValueKind::Composite,
            CircuitValue::Array(_) => ValueKind::Container,
        }
    }

    /// Short variant name for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            CircuitValue::Field(_) => "field",
            CircuitValue::Bool(_) => "bool",
            CircuitValue::Array(_) => "array",
            CircuitValue::Record(_) => "record",
            CircuitValue::Primitive(_) => "primitive",
            CircuitValue::Opaque(_) => "opaque",
        }
    }

    pub fn as_field(&self) -> Option<Field> {
        match self {
            CircuitValue::Field(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<Bool> {
        match self {
            CircuitValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CircuitValue]> {
        match self {
            CircuitValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            CircuitValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Compare assigned values rather than wiring.
    ///
    /// Values of different variants, arrays of different lengths and
    /// records with different member sets are unequal. Opaque values are
    /// equal only to themselves.
    ///
    /// # Errors
    ///
    /// Fails when a variable's value is not available (compile pass).
    pub fn value_eq(&self, other: &CircuitValue) -> Result<bool, CircuitValueError> {
        match (self, other) {
            (CircuitValue::Field(a), CircuitValue::Field(b)) => Ok(a.value()? == b.value()?),
            (CircuitValue::Bool(a), CircuitValue::Bool(b)) => Ok(a.value()? == b.value()?),
            (CircuitValue::Array(a), CircuitValue::Array(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.value_eq(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (CircuitValue::Record(a), CircuitValue::Record(b)) => {
                if a.type_name != b.type_name || a.fields.len() != b.fields.len() {
                    return Ok(false);
                }
                for (name, x) in &a.fields {
                    match b.fields.get(name) {
                        Some(y) if x.value_eq(y)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (CircuitValue::Primitive(a), CircuitValue::Primitive(b)) => Ok(a == b),
            (CircuitValue::Opaque(a), CircuitValue::Opaque(b)) => Ok(a.ptr_eq(b)),
            _ => Ok(false),
        }
    }
}

impl From<Field> for CircuitValue {
    fn from(value: Field) -> Self {
        CircuitValue::Field(value)
    }
}

impl From<Fp> for CircuitValue {
    fn from(value: Fp) -> Self {
        CircuitValue::Field(Field::Constant(value))
    }
}

impl From<u64> for CircuitValue {
    fn from(value: u64) -> Self {
        CircuitValue::Field(Field::constant(value))
    }
}

impl From<Bool> for CircuitValue {
    fn from(value: Bool) -> Self {
        CircuitValue::Bool(value)
    }
}

impl From<bool> for CircuitValue {
    fn from(value: bool) -> Self {
        CircuitValue::Bool(Bool::constant(value))
    }
}

impl From<Vec<CircuitValue>> for CircuitValue {
    fn from(value: Vec<CircuitValue>) -> Self {
        CircuitValue::Array(value)
    }
}

impl From<Record> for CircuitValue {
    fn from(value: Record) -> Self {
        CircuitValue::Record(value)
    }
}

impl From<Json> for CircuitValue {
    fn from(value: Json) -> Self {
        CircuitValue::Primitive(value)
    }
}

impl From<Opaque> for CircuitValue {
    fn from(value: Opaque) -> Self {
        CircuitValue::Opaque(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvt_field::{exists, run_and_check, CircuitError};
    use serde_json::json;

    #[test]
    fn kinds_are_declared_per_variant() {
        assert_eq!(CircuitValue::from(3u64).kind(), ValueKind::Atomic);
        assert_eq!(CircuitValue::from(json!("memo")).kind(), ValueKind::Atomic);
        assert_eq!(CircuitValue::from(Record::new()).kind(), ValueKind::Composite);
        assert_eq!(CircuitValue::Array(vec![]).kind(), ValueKind::Container);
    }

    #[test]
    fn opaque_compares_by_identity() {
        let a = Opaque::new(vec![1u8, 2, 3]);
        let b = Opaque::new(vec![1u8, 2, 3]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        assert!(a.downcast_ref::<String>().is_none());
        assert_eq!(format!("{a:?}"), "Opaque(..)");
    }

    #[test]
    fn record_builder_and_lookup() {
        let r = Record::named("Point").with("x", 1u64).with("y", 2u64);
        assert_eq!(r.type_name.as_deref(), Some("Point"));
        assert_eq!(r.get("y"), Some(&CircuitValue::from(2u64)));
        assert!(r.get("z").is_none());
    }

    #[test]
    fn value_eq_ignores_wiring() {
        let run = run_and_check(|| {
            let w = exists(1, || Ok::<_, CircuitError>(vec![Fp::new(7)]))?;
            Ok::<_, CircuitError>(CircuitValue::Field(w[0]))
        })
        .unwrap();
        let variable = run.output;
        let constant = CircuitValue::from(7u64);
        assert_ne!(variable, constant);
        assert!(variable.value_eq(&constant).unwrap());
    }

    #[test]
    fn value_eq_structural_cases() {
        let a = CircuitValue::Array(vec![1u64.into(), true.into()]);
        let b = CircuitValue::Array(vec![1u64.into(), true.into()]);
        let c = CircuitValue::Array(vec![1u64.into()]);
        assert!(a.value_eq(&b).unwrap());
        assert!(!a.value_eq(&c).unwrap());
        assert!(!a.value_eq(&CircuitValue::from(1u64)).unwrap());

        let p = CircuitValue::from(Record::named("P").with("x", 1u64));
        let q = CircuitValue::from(Record::new().with("x", 1u64));
        assert!(!p.value_eq(&q).unwrap());

        let o = Opaque::new(5u32);
        assert!(CircuitValue::from(o.clone())
            .value_eq(&CircuitValue::from(o))
            .unwrap());
    }
}
