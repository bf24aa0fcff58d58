//! # Composite Value Base
//!
//! The generic operations of a registered composite type, implemented once
//! against its schema. A composite value is a [`Record`] tagged with the
//! type name; members are visited in schema order by every operation.
//!
//! ## Reconstruction
//!
//! `of_fields` assigns member values directly. It never runs `check` or
//! any other validation; callers that need validation call `check`
//! explicitly (the witness path always does).

use std::fmt;
use std::sync::Arc;

use cvt_field::{Bool, Field};
use serde_json::{Map, Value as Json};

use crate::error::{Capability, CircuitValueError};
use crate::hash_input::HashInput;
use crate::ops;
use crate::provable::{Descriptor, HashInputCodec, JsonCodec, Provable};
use crate::schema::{Schema, SchemaRegistry};
use crate::value::{CircuitValue, Record};

/// Descriptor of a named composite type backed by a schema registry.
#[derive(Clone)]
pub struct CompositeType {
    name: String,
    registry: Arc<SchemaRegistry>,
}

impl CompositeType {
    pub fn new(name: impl Into<String>, registry: Arc<SchemaRegistry>) -> Self {
        CompositeType {
            name: name.into(),
            registry,
        }
    }

    /// A composite type resolved against the process-wide registry.
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, SchemaRegistry::global())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.registry.schema(&self.name)
    }

    pub fn size_in_fields(&self) -> usize {
        self.schema().size_in_fields()
    }

    /// Wrap as a shareable descriptor.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::new(self.clone())
    }

    /// Strip variable bindings from every member.
    pub fn to_constant(&self, value: &CircuitValue) -> Result<CircuitValue, CircuitValueError> {
        ops::to_constant(&self.descriptor(), value)
    }

    /// In-circuit structural equality.
    pub fn equals(&self, a: &CircuitValue, b: &CircuitValue) -> Result<Bool, CircuitValueError> {
        ops::equal(&self.descriptor(), a, b)
    }

    fn record<'a>(&self, value: &'a CircuitValue) -> Result<&'a Record, CircuitValueError> {
        match value {
            CircuitValue::Record(r) if r.type_name.as_deref().map_or(true, |n| n == self.name) => {
                Ok(r)
            }
            CircuitValue::Record(r) => Err(CircuitValueError::shape(
                &self.name,
                "a record of this type",
                r.type_name.as_deref().unwrap_or_default(),
            )),
            other => Err(CircuitValueError::shape(
                &self.name,
                "a record",
                other.variant_name(),
            )),
        }
    }

    fn member<'a>(
        &self,
        record: &'a Record,
        name: &str,
    ) -> Result<&'a CircuitValue, CircuitValueError> {
        record.get(name).ok_or_else(|| {
            CircuitValueError::shape(&self.name, "every registered member", format!("no {name}"))
        })
    }
}

impl fmt::Debug for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Provable for CompositeType {
    fn type_name(&self) -> String {
        self.name.clone()
    }

    fn size_in_fields(&self) -> usize {
        CompositeType::size_in_fields(self)
    }

    fn to_fields(&self, value: &CircuitValue) -> Result<Vec<Field>, CircuitValueError> {
        let schema = self.schema();
        if schema.is_empty() {
            return Ok(Vec::new());
        }
        let record = self.record(value)?;
        let mut fields = Vec::with_capacity(schema.size_in_fields());
        for entry in schema.entries() {
            fields.extend(entry.descriptor.to_fields(self.member(record, &entry.name)?)?);
        }
        Ok(fields)
    }

    fn size_in_aux(&self) -> usize {
        self.schema().size_in_aux()
    }

    fn of_fields(&self, fields: &[Field]) -> Result<CircuitValue, CircuitValueError> {
        self.of_fields_with_aux(fields, &[])
    }

    fn of_fields_with_aux(
        &self,
        fields: &[Field],
        aux: &[CircuitValue],
    ) -> Result<CircuitValue, CircuitValueError> {
        let schema = self.schema();
        let size = schema.size_in_fields();
        if fields.len() < size {
            return Err(CircuitValueError::arity(&self.name, size, fields.len()));
        }
        let aux_size = schema.size_in_aux();
        if aux.len() != aux_size {
            return Err(CircuitValueError::aux_arity(&self.name, aux_size, aux.len()));
        }
        let mut record = Record::named(self.name.clone());
        let (mut offset, mut aux_offset) = (0, 0);
        for entry in schema.entries() {
            let (n, m) = (entry.descriptor.size_in_fields(), entry.descriptor.size_in_aux());
            let member = entry
                .descriptor
                .of_fields_with_aux(&fields[offset..offset + n], &aux[aux_offset..aux_offset + m])?;
            record.insert(entry.name.clone(), member);
            offset += n;
            aux_offset += m;
        }
        Ok(CircuitValue::Record(record))
    }

    fn check(&self, value: &CircuitValue) -> Result<(), CircuitValueError> {
        let schema = self.schema();
        if schema.is_empty() {
            return Ok(());
        }
        let record = self.record(value)?;
        for entry in schema.entries() {
            entry.descriptor.check(self.member(record, &entry.name)?)?;
        }
        Ok(())
    }

    fn to_auxiliary(&self, value: &CircuitValue) -> Vec<CircuitValue> {
        let Ok(record) = self.record(value) else {
            return Vec::new();
        };
        self.schema()
            .entries()
            .iter()
            .filter_map(|e| record.get(&e.name).map(|v| e.descriptor.to_auxiliary(v)))
            .flatten()
            .collect()
    }

    fn hash_input(&self) -> Option<&dyn HashInputCodec> {
        Some(self)
    }

    fn json(&self) -> Option<&dyn JsonCodec> {
        let all_json = self
            .schema()
            .entries()
            .iter()
            .all(|e| e.descriptor.supports(Capability::Json));
        if all_json {
            Some(self)
        } else {
            None
        }
    }
}

impl HashInputCodec for CompositeType {
    /// Members without their own hash-input capability contribute their
    /// plain flattening as unpacked fields. Packing defined deeper inside
    /// such a member is lost.
    fn to_input(&self, value: &CircuitValue) -> Result<HashInput, CircuitValueError> {
        let schema = self.schema();
        if schema.is_empty() {
            return Ok(HashInput::empty());
        }
        let record = self.record(value)?;
        let mut input = HashInput::empty();
        for entry in schema.entries() {
            let member = self.member(record, &entry.name)?;
            input = input.append(entry.descriptor.to_input_or_fields(member)?);
        }
        Ok(input)
    }
}

impl JsonCodec for CompositeType {
    fn to_json(&self, value: &CircuitValue) -> Result<Json, CircuitValueError> {
        let schema = self.schema();
        let mut map = Map::new();
        if schema.is_empty() {
            return Ok(Json::Object(map));
        }
        let record = self.record(value)?;
        for entry in schema.entries() {
            let member = self.member(record, &entry.name)?;
            map.insert(entry.name.clone(), entry.descriptor.to_json(member)?);
        }
        Ok(Json::Object(map))
    }

    fn from_json(&self, json: &Json) -> Result<Option<CircuitValue>, CircuitValueError> {
        let Json::Object(map) = json else {
            return Ok(None);
        };
        let mut record = Record::named(self.name.clone());
        for entry in self.schema().entries() {
            let Some(raw) = map.get(&entry.name) else {
                return Ok(None);
            };
            let Some(member) = entry.descriptor.from_json(raw)? else {
                return Ok(None);
            };
            record.insert(entry.name.clone(), member);
        }
        Ok(Some(CircuitValue::Record(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf;
    use crate::schema::{Member, SchemaBuilder};
    use crate::value::Opaque;
    use serde_json::json;

    fn point(registry: &Arc<SchemaRegistry>) -> CompositeType {
        SchemaBuilder::new("Point")
            .field("x", leaf::field())
            .field("y", leaf::field())
            .field("visible", leaf::boolean())
            .register(registry)
            .unwrap()
    }

    fn sample() -> CircuitValue {
        Record::named("Point")
            .with("x", 3u64)
            .with("y", 4u64)
            .with("visible", true)
            .into()
    }

    #[test]
    fn flattens_in_schema_order() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        assert_eq!(ty.size_in_fields(), 3);
        assert_eq!(
            ty.to_fields(&sample()).unwrap(),
            vec![Field::constant(3u64), Field::constant(4u64), Field::ONE]
        );
    }

    #[test]
    fn round_trip_rebuilds_the_record() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        let fields = ty.to_fields(&sample()).unwrap();
        assert_eq!(ty.of_fields(&fields).unwrap(), sample());
    }

    #[test]
    fn short_input_is_an_arity_error_and_surplus_is_ignored() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        assert_eq!(
            ty.of_fields(&[Field::ONE]),
            Err(CircuitValueError::arity("Point", 3, 1))
        );
        let mut fields = ty.to_fields(&sample()).unwrap();
        fields.push(Field::constant(99u64));
        assert_eq!(ty.of_fields(&fields).unwrap(), sample());
    }

    #[test]
    fn missing_schema_flattens_to_nothing() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = CompositeType::new("Ghost", registry).descriptor();
        assert_eq!(ty.size_in_fields(), 0);
        assert!(ty.to_fields(&CircuitValue::from(1u64)).unwrap().is_empty());
        assert_eq!(
            ty.of_fields(&[]).unwrap(),
            CircuitValue::Record(Record::named("Ghost"))
        );
    }

    #[test]
    fn wrong_record_type_is_rejected() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        let other: CircuitValue = Record::named("Vector")
            .with("x", 3u64)
            .with("y", 4u64)
            .with("visible", true)
            .into();
        assert!(matches!(
            ty.to_fields(&other),
            Err(CircuitValueError::ShapeMismatch { .. })
        ));
        let missing: CircuitValue = Record::named("Point").with("x", 1u64).into();
        assert!(ty.to_fields(&missing).is_err());
    }

    #[test]
    fn check_visits_every_member() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        let bad = ty
            .of_fields(&[Field::ONE, Field::ONE, Field::constant(2u64)])
            .unwrap();
        assert!(ty.check(&sample()).is_ok());
        assert!(ty.check(&bad).is_err());
    }

    #[test]
    fn hash_input_uses_member_codecs() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        let input = ty.to_input(&sample()).unwrap();
        assert_eq!(input.fields.len(), 2);
        assert_eq!(input.packed, vec![(Field::ONE, 1)]);
    }

    #[test]
    fn json_round_trip_and_sentinels() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = point(&registry).descriptor();
        let encoded = ty.to_json(&sample()).unwrap();
        assert_eq!(encoded, json!({"x": "3", "y": "4", "visible": true}));
        assert_eq!(ty.from_json(&encoded).unwrap(), Some(sample()));

        assert_eq!(ty.from_json(&json!([1, 2, 3])).unwrap(), None);
        assert_eq!(ty.from_json(&Json::Null).unwrap(), None);
        assert_eq!(ty.from_json(&json!({"x": "3", "y": "4"})).unwrap(), None);
        assert_eq!(
            ty.from_json(&json!({"x": "3", "y": "4", "visible": "yes"}))
                .unwrap(),
            None
        );
    }

    #[test]
    fn opaque_members_round_trip_through_auxiliary_data() {
        let registry = Arc::new(SchemaRegistry::new());
        let ty = SchemaBuilder::new("Tagged")
            .field("value", leaf::field())
            .field("origin", leaf::opaque())
            .register(&registry)
            .unwrap()
            .descriptor();
        assert_eq!(ty.size_in_fields(), 1);
        assert_eq!(ty.size_in_aux(), 1);
        assert!(!ty.supports(Capability::Json));

        let origin = Opaque::new(String::from("ledger"));
        let value: CircuitValue = Record::named("Tagged")
            .with("value", 8u64)
            .with("origin", origin)
            .into();
        let fields = ty.to_fields(&value).unwrap();
        let aux = ty.to_auxiliary(&value);
        assert_eq!(ty.of_fields_with_aux(&fields, &aux).unwrap(), value);
        assert_eq!(
            ty.of_fields(&fields),
            Err(CircuitValueError::arity("Tagged auxiliary data", 1, 0))
        );
    }

    #[test]
    fn nested_composites_flatten_recursively() {
        let registry = Arc::new(SchemaRegistry::new());
        let p = point(&registry);
        let segment = SchemaBuilder::new("Segment")
            .field("from", p.descriptor())
            .field("to", p.descriptor())
            .field("note", Member::Unencoded)
            .register(&registry)
            .unwrap();
        assert_eq!(segment.size_in_fields(), 6);
        let value: CircuitValue = Record::named("Segment")
            .with("from", sample())
            .with("to", sample())
            .into();
        let d = segment.descriptor();
        let fields = d.to_fields(&value).unwrap();
        assert_eq!(d.of_fields(&fields).unwrap(), value);
        assert_eq!(segment.to_constant(&value).unwrap(), value);
        assert_eq!(segment.equals(&value, &value).unwrap().value(), Ok(true));
    }
}
