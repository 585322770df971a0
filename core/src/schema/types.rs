#![deny(missing_docs)]

//! # Type Mapping
//!
//! Maps definitions to semantic wire types and builds Record Types for named
//! object definitions.
//!
//! Record Types are generated once per named object when the document is resolved.
//! A field whose definition refers to another model (including its own type)
//! is recorded as [`WireType::Record`] by *name*, so building a self-referential
//! type never recurses into itself.

use crate::error::{ClientError, ClientResult};
use crate::schema::graph::{DefId, Definition, DefinitionGraph, DefinitionKind, Primitive};
use crate::value::{Model, Value};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// The semantic type a definition maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    /// `string`
    Text,
    /// `string` / `date`
    Date,
    /// `string` / `date-time`
    Timestamp,
    /// `integer` / `int32`
    Int32,
    /// `integer` (64-bit)
    Int64,
    /// `number` / `float`
    Float,
    /// `number` / `double` (and unformatted numbers)
    Double,
    /// `boolean`
    Boolean,
    /// `file`
    Bytes,
    /// `array`
    Array(Box<WireType>),
    /// A generated Record Type, by name.
    Record(String),
    /// An object without a Record Type.
    Map,
    /// No declared type.
    Any,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Text => write!(f, "string"),
            WireType::Date => write!(f, "date"),
            WireType::Timestamp => write!(f, "date-time"),
            WireType::Int32 => write!(f, "int32"),
            WireType::Int64 => write!(f, "int64"),
            WireType::Float => write!(f, "float"),
            WireType::Double => write!(f, "double"),
            WireType::Boolean => write!(f, "boolean"),
            WireType::Bytes => write!(f, "file"),
            WireType::Array(inner) => write!(f, "array<{}>", inner),
            WireType::Record(name) => write!(f, "{}", name),
            WireType::Map => write!(f, "object"),
            WireType::Any => write!(f, "any"),
        }
    }
}

/// Maps a primitive type and format to its wire type.
pub fn map_primitive(primitive: Primitive, format: Option<&str>) -> WireType {
    match primitive {
        Primitive::String => match format {
            Some("date") => WireType::Date,
            Some("date-time") => WireType::Timestamp,
            _ => WireType::Text,
        },
        Primitive::Integer => match format {
            Some("int32") => WireType::Int32,
            _ => WireType::Int64,
        },
        Primitive::Number => match format {
            Some("float") => WireType::Float,
            // Default for number without format is double precision
            _ => WireType::Double,
        },
        Primitive::Boolean => WireType::Boolean,
        Primitive::File => WireType::Bytes,
    }
}

/// Maps a definition node to its wire type.
pub fn wire_type(graph: &DefinitionGraph, id: DefId) -> ClientResult<WireType> {
    let mut path = Vec::new();
    wire_type_inner(graph, id, &mut path)
}

fn wire_type_inner(
    graph: &DefinitionGraph,
    id: DefId,
    path: &mut Vec<DefId>,
) -> ClientResult<WireType> {
    let (target, def) = graph.deref(id)?;
    if let Some(name) = &def.model {
        return Ok(WireType::Record(name.clone()));
    }
    // Arrays of themselves have no finite description.
    if path.contains(&target) {
        return Ok(WireType::Any);
    }
    path.push(target);
    let ty = match &def.kind {
        DefinitionKind::Primitive(p) => map_primitive(*p, def.format.as_deref()),
        DefinitionKind::Array { items } => {
            WireType::Array(Box::new(wire_type_inner(graph, *items, path)?))
        }
        DefinitionKind::Object { .. } => WireType::Map,
        DefinitionKind::Any | DefinitionKind::Reference(_) => WireType::Any,
    };
    path.pop();
    Ok(ty)
}

/// One field of a Record Type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Property name.
    pub name: String,
    /// Property definition.
    pub definition: DefId,
    /// Whether the property is listed in `required`.
    pub required: bool,
    /// Declared default value.
    pub default: Option<JsonValue>,
    /// Semantic type of the property.
    pub wire_type: WireType,
}

/// A generated fixed-field type for a named object definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    definition: DefId,
    fields: IndexMap<String, FieldSpec>,
}

impl RecordType {
    /// Builds the field table for a named object definition.
    pub fn build(graph: &DefinitionGraph, id: DefId) -> ClientResult<Self> {
        let def = graph.get(id);
        let (Some(name), DefinitionKind::Object { properties, required }) = (&def.model, &def.kind)
        else {
            return Err(ClientError::schema(
                "Record Types can only be built for named object definitions",
            ));
        };

        let mut fields = IndexMap::new();
        for (prop_name, prop_id) in properties {
            let prop_def = graph.get(*prop_id);
            fields.insert(
                prop_name.clone(),
                FieldSpec {
                    name: prop_name.clone(),
                    definition: *prop_id,
                    required: required.contains(prop_name),
                    default: prop_def.default.clone(),
                    wire_type: wire_type(graph, *prop_id)?,
                },
            );
        }

        Ok(Self {
            name: name.clone(),
            definition: id,
            fields,
        })
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object definition this type was generated from.
    pub fn definition(&self) -> DefId {
        self.definition
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Builds an instance from keyword-style pairs.
    ///
    /// Unset fields stay unset; `null` values are not stored. Unknown names
    /// are rejected.
    pub fn instantiate<I, K, V>(&self, values: I) -> ClientResult<Model>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut model = Model::empty(&self.name);
        for (key, value) in values {
            let key = key.as_ref();
            if !self.fields.contains_key(key) {
                return Err(ClientError::schema(format!(
                    "{} has no field '{}'",
                    self.name, key
                )));
            }
            let value = value.into();
            if !value.is_null() {
                model.set(key, value);
            }
        }
        Ok(model)
    }
}

/// Record Types of a spec, cached by model name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    types: IndexMap<String, Arc<RecordType>>,
}

impl ModelRegistry {
    /// Generates a Record Type for every named object definition in the graph.
    pub fn build(graph: &DefinitionGraph) -> ClientResult<Self> {
        let mut types = IndexMap::new();
        for (id, def) in graph.iter() {
            if let Some(name) = named_object(def) {
                let record = RecordType::build(graph, id)?;
                types.insert(name.to_string(), Arc::new(record));
            }
        }
        Ok(Self { types })
    }

    /// Looks up a Record Type by model name.
    pub fn get(&self, name: &str) -> Option<&Arc<RecordType>> {
        self.types.get(name)
    }

    /// Looks up a Record Type, failing with a schema error when unknown.
    pub fn require(&self, name: &str) -> ClientResult<&Arc<RecordType>> {
        self.get(name)
            .ok_or_else(|| ClientError::schema(format!("Unknown model '{}'", name)))
    }

    /// Iterates over all Record Types in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.types.values()
    }
}

fn named_object(def: &Definition) -> Option<&str> {
    match def.kind {
        DefinitionKind::Object { .. } => def.model.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::document::ShimSchema;
    use crate::schema::graph::GraphBuilder;
    use serde_json::json;

    fn graph_with(defs: JsonValue) -> DefinitionGraph {
        let defs: IndexMap<String, ShimSchema> = serde_json::from_value(defs).unwrap();
        let mut builder = GraphBuilder::new();
        for (name, schema) in &defs {
            builder.add_named(name, schema).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_map_primitives() {
        assert_eq!(map_primitive(Primitive::String, None), WireType::Text);
        assert_eq!(map_primitive(Primitive::String, Some("date")), WireType::Date);
        assert_eq!(
            map_primitive(Primitive::String, Some("date-time")),
            WireType::Timestamp
        );
        assert_eq!(map_primitive(Primitive::Integer, None), WireType::Int64);
        assert_eq!(map_primitive(Primitive::Integer, Some("int32")), WireType::Int32);
        assert_eq!(map_primitive(Primitive::Number, Some("float")), WireType::Float);
        assert_eq!(map_primitive(Primitive::Number, None), WireType::Double);
        assert_eq!(map_primitive(Primitive::Boolean, None), WireType::Boolean);
        assert_eq!(map_primitive(Primitive::File, None), WireType::Bytes);
    }

    #[test]
    fn test_record_type_fields() {
        let graph = graph_with(json!({
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "name": {"type": "string"},
                    "status": {"type": "string", "default": "available"},
                    "tags": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                }
            },
            "Tag": {"type": "object", "properties": {"name": {"type": "string"}}}
        }));
        let registry = ModelRegistry::build(&graph).unwrap();
        let pet = registry.require("Pet").unwrap();

        let names: Vec<&str> = pet.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "status", "tags"]);
        assert!(pet.field("name").unwrap().required);
        assert!(!pet.field("id").unwrap().required);
        assert_eq!(pet.field("status").unwrap().default, Some(json!("available")));
        assert_eq!(
            pet.field("tags").unwrap().wire_type,
            WireType::Array(Box::new(WireType::Record("Tag".into())))
        );
    }

    #[test]
    fn test_self_referential_record_type() {
        let graph = graph_with(json!({
            "Node": {
                "properties": {
                    "next": {"$ref": "#/definitions/Node"},
                    "children": {"type": "array", "items": {"$ref": "#/definitions/Node"}}
                }
            }
        }));
        let registry = ModelRegistry::build(&graph).unwrap();
        let node = registry.require("Node").unwrap();
        assert_eq!(
            node.field("next").unwrap().wire_type,
            WireType::Record("Node".into())
        );
        assert_eq!(
            node.field("children").unwrap().wire_type.to_string(),
            "array<Node>"
        );
    }

    #[test]
    fn test_recursive_array_alias_terminates() {
        let graph = graph_with(json!({
            "Nested": {"type": "array", "items": {"$ref": "#/definitions/Nested"}}
        }));
        let id = graph.resolve("Nested").unwrap();
        assert_eq!(
            wire_type(&graph, id).unwrap(),
            WireType::Array(Box::new(WireType::Any))
        );
    }

    #[test]
    fn test_instantiate_rejects_unknown_field() {
        let graph = graph_with(json!({
            "Tag": {"properties": {"id": {"type": "integer"}, "name": {"type": "string"}}}
        }));
        let registry = ModelRegistry::build(&graph).unwrap();
        let tag = registry.require("Tag").unwrap();

        let model = tag.instantiate([("id", Value::from(99)), ("name", "mini".into())]).unwrap();
        assert_eq!(model.get("id"), Some(&Value::Integer(99)));

        let err = tag.instantiate([("colour", "brown")]).unwrap_err();
        assert_eq!(err.to_string(), "Schema Error: Tag has no field 'colour'");
    }
}
