//! # Schema Registry
//!
//! Ordered member lists for named composite types. A type's schema is
//! built once, member by member in declaration order, before any instance
//! exists; it is read-only afterwards.
//!
//! ## Order Is Load-Bearing
//!
//! The registration order *is* the flattening order and the hash-input
//! order. Reordering members changes every downstream encoding, with no
//! migration path.
//!
//! ## Concurrency
//!
//! The registry is a `parking_lot::RwLock` over a map. Registration takes
//! the write lock briefly; lookups hand out a shared `Arc<Schema>` so no
//! lock is held while a descriptor runs. Registering into a schema that
//! is still borrowed copies it; outstanding handles keep the old member
//! list.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::composite::CompositeType;
use crate::error::CircuitValueError;
use crate::provable::Descriptor;

/// A member offered for registration.
#[derive(Clone, Debug)]
pub enum Member {
    /// A member with a field encoding.
    Provable(Descriptor),
    /// A host-only member with no field encoding. Registering one is
    /// skipped with a warning; the member never appears in flattenings.
    Unencoded,
}

impl From<Descriptor> for Member {
    fn from(value: Descriptor) -> Self {
        Member::Provable(value)
    }
}

/// One `(name, descriptor)` pair of a schema.
#[derive(Clone, Debug)]
pub struct SchemaEntry {
    pub name: String,
    pub descriptor: Descriptor,
}

/// The ordered member list of a composite type.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of member sizes.
    pub fn size_in_fields(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.descriptor.size_in_fields())
            .sum()
    }

    pub fn size_in_aux(&self) -> usize {
        self.entries.iter().map(|e| e.descriptor.size_in_aux()).sum()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Process-wide or isolated store of composite schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    /// An isolated, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide registry.
    pub fn global() -> Arc<SchemaRegistry> {
        static GLOBAL: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SchemaRegistry::new())))
    }

    /// Append a member to `type_name`'s schema.
    ///
    /// [`Member::Unencoded`] is skipped with a warning and leaves the
    /// schema unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitValueError::DuplicateField`] if `field_name` is
    /// already registered on this type.
    pub fn register(
        &self,
        type_name: &str,
        field_name: &str,
        member: impl Into<Member>,
    ) -> Result<(), CircuitValueError> {
        let descriptor = match member.into() {
            Member::Provable(d) => d,
            Member::Unencoded => {
                tracing::warn!(
                    type_name = %type_name,
                    field = %field_name,
                    "member has no field encoding, skipping registration"
                );
                return Ok(());
            }
        };

        let mut schemas = self.schemas.write();
        let schema = Arc::make_mut(schemas.entry(type_name.to_string()).or_default());
        if schema.get(field_name).is_some() {
            return Err(CircuitValueError::DuplicateField {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            });
        }
        tracing::debug!(
            type_name = %type_name,
            field = %field_name,
            descriptor = %descriptor.type_name(),
            position = schema.len(),
            "registered composite member"
        );
        schema.entries.push(SchemaEntry {
            name: field_name.to_string(),
            descriptor,
        });
        Ok(())
    }

    /// The schema of `type_name`; empty when nothing was registered.
    pub fn schema(&self, type_name: &str) -> Arc<Schema> {
        self.schemas
            .read()
            .get(type_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.read().contains_key(type_name)
    }
}

/// Declarative registration of a composite type, one member per call in
/// declaration order.
///
/// ```
/// use cvt_core::{leaf, SchemaBuilder, SchemaRegistry};
///
/// let registry = std::sync::Arc::new(SchemaRegistry::new());
/// let point = SchemaBuilder::new("Point")
///     .field("x", leaf::field())
///     .field("y", leaf::field())
///     .register(&registry)
///     .unwrap();
/// assert_eq!(point.size_in_fields(), 2);
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    type_name: String,
    members: Vec<(String, Member)>,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        SchemaBuilder {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.members.push((name.into(), member.into()));
        self
    }

    /// Register every member, in order, and return the composite descriptor.
    ///
    /// # Errors
    ///
    /// Stops at the first [`CircuitValueError::DuplicateField`].
    pub fn register(
        self,
        registry: &Arc<SchemaRegistry>,
    ) -> Result<CompositeType, CircuitValueError> {
        for (name, member) in self.members {
            registry.register(&self.type_name, &name, member)?;
        }
        Ok(CompositeType::new(self.type_name, Arc::clone(registry)))
    }
}
