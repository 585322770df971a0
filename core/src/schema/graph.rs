#![deny(missing_docs)]

//! # Definition Graph
//!
//! In-memory representation of the schema's type universe.
//!
//! Every schema node lives in an arena and is addressed by a [`DefId`].
//! A `$ref` is lowered into a [`DefinitionKind::Reference`] node that holds the
//! target *name*; it is resolved by lookup in the name table, so the same name
//! always yields the same node. Self- and mutually-referential definitions are
//! therefore representable without expanding them.

use crate::error::{ClientError, ClientResult};
use crate::schema::document::ShimSchema;
use crate::schema::refs::{extract_ref_name, RefTable};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashSet};

/// Handle to a node in a [`DefinitionGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(usize);

/// Primitive subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `file`
    File,
}

/// The shape of a definition node.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionKind {
    /// A schema without a type; values pass through unchanged.
    Any,
    /// A primitive value.
    Primitive(Primitive),
    /// An array of `items`.
    Array {
        /// Element definition.
        items: DefId,
    },
    /// An object with ordered properties.
    Object {
        /// Property definitions in declaration order.
        properties: IndexMap<String, DefId>,
        /// Names of required properties.
        required: BTreeSet<String>,
    },
    /// A reference to a named definition, resolved by name.
    Reference(String),
}

/// A node in the schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Shape of the node.
    pub kind: DefinitionKind,
    /// Format modifier (e.g. `date`, `date-time`, `int64`).
    pub format: Option<String>,
    /// Allowed values; empty when unconstrained.
    pub enum_values: Vec<JsonValue>,
    /// Declared default value.
    pub default: Option<JsonValue>,
    /// Record Type name for named object definitions.
    pub model: Option<String>,
}

impl Definition {
    fn new(kind: DefinitionKind) -> Self {
        Self {
            kind,
            format: None,
            enum_values: Vec::new(),
            default: None,
            model: None,
        }
    }

    /// Returns the primitive subtype, if this is a primitive node.
    pub fn primitive(&self) -> Option<Primitive> {
        match self.kind {
            DefinitionKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Returns true for object nodes.
    pub fn is_object(&self) -> bool {
        matches!(self.kind, DefinitionKind::Object { .. })
    }
}

/// The resolved type universe: an arena of nodes plus the name table.
///
/// Immutable once built; shared read-only by every operation of a `Spec`.
#[derive(Debug, Clone, Default)]
pub struct DefinitionGraph {
    nodes: Vec<Definition>,
    names: IndexMap<String, DefId>,
}

impl DefinitionGraph {
    /// Returns the node for a handle minted by this graph.
    pub fn get(&self, id: DefId) -> &Definition {
        &self.nodes[id.0]
    }

    /// Resolves a definition name to its node handle.
    ///
    /// The same name always resolves to the same handle.
    pub fn resolve(&self, name: &str) -> ClientResult<DefId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ClientError::schema(format!("Unresolved reference '{}'", name)))
    }

    /// Resolves a definition name to its node.
    pub fn definition(&self, name: &str) -> ClientResult<&Definition> {
        self.resolve(name).map(|id| self.get(id))
    }

    /// Follows reference nodes until a concrete node is reached.
    pub fn deref(&self, id: DefId) -> ClientResult<(DefId, &Definition)> {
        let mut current = id;
        let mut seen = HashSet::new();
        loop {
            let def = self.get(current);
            match &def.kind {
                DefinitionKind::Reference(name) => {
                    if !seen.insert(current) {
                        return Err(ClientError::schema(format!(
                            "Reference cycle through '{}' never reaches a concrete definition",
                            name
                        )));
                    }
                    current = self.resolve(name)?;
                }
                _ => return Ok((current, def)),
            }
        }
    }

    /// Names of all top-level definitions, in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Iterates over every node with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (DefId, &Definition)> {
        self.nodes.iter().enumerate().map(|(i, d)| (DefId(i), d))
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Lowers document schemas into a [`DefinitionGraph`].
///
/// References are recorded by name and checked in [`GraphBuilder::finish`],
/// so every unknown name is reported while the document is being resolved.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DefinitionGraph,
    referenced: IndexSet<String>,
    models: IndexMap<String, DefId>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers a named top-level definition.
    ///
    /// Object definitions become named models; the `x-model` extension, when
    /// present, overrides the model name.
    pub fn add_named(&mut self, name: &str, schema: &ShimSchema) -> ClientResult<DefId> {
        if self.graph.names.contains_key(name) {
            return Err(ClientError::schema(format!(
                "Duplicate definition '{}'",
                name
            )));
        }
        let model = schema.x_model.as_deref().unwrap_or(name);
        let id = self.lower_with_model(schema, Some(model))?;
        self.graph.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Lowers an anonymous schema (parameter, body or response schema).
    pub fn add_anonymous(&mut self, schema: &ShimSchema) -> ClientResult<DefId> {
        self.lower_with_model(schema, schema.x_model.as_deref())
    }

    /// Adds a reference node pointing at a named definition.
    pub fn add_reference(&mut self, name: &str) -> DefId {
        self.referenced.insert(name.to_string());
        self.push(Definition::new(DefinitionKind::Reference(name.to_string())))
    }

    /// Checks every recorded reference and freezes the graph.
    pub fn finish(self) -> ClientResult<DefinitionGraph> {
        for name in &self.referenced {
            if !self.graph.names.contains_key(name) {
                return Err(ClientError::schema(format!(
                    "Unresolved reference '{}'",
                    name
                )));
            }
        }
        Ok(self.graph)
    }

    fn push(&mut self, def: Definition) -> DefId {
        let id = DefId(self.graph.nodes.len());
        self.graph.nodes.push(def);
        id
    }

    fn lower_with_model(&mut self, schema: &ShimSchema, model: Option<&str>) -> ClientResult<DefId> {
        if let Some(ref_path) = &schema.ref_path {
            let name = extract_ref_name(ref_path, RefTable::Definitions)?;
            return Ok(self.add_reference(&name));
        }

        let type_name = schema.schema_type.as_ref().and_then(|t| t.primary());
        let kind = match type_name.as_deref() {
            Some("string") => DefinitionKind::Primitive(Primitive::String),
            Some("integer") => DefinitionKind::Primitive(Primitive::Integer),
            Some("number") => DefinitionKind::Primitive(Primitive::Number),
            Some("boolean") => DefinitionKind::Primitive(Primitive::Boolean),
            Some("file") => DefinitionKind::Primitive(Primitive::File),
            Some("array") => {
                let items = match &schema.items {
                    Some(items) => self.add_anonymous(items)?,
                    None => self.push(Definition::new(DefinitionKind::Any)),
                };
                DefinitionKind::Array { items }
            }
            Some("object") => self.lower_object(schema)?,
            None if !schema.properties.is_empty() => self.lower_object(schema)?,
            None => DefinitionKind::Any,
            Some(other) => {
                return Err(ClientError::schema(format!(
                    "Unsupported schema type '{}'",
                    other
                )))
            }
        };

        let model = match (&kind, model) {
            (DefinitionKind::Object { .. }, Some(name)) => {
                Some(self.claim_model_name(name)?)
            }
            _ => None,
        };

        let id = self.push(Definition {
            kind,
            format: schema.format.clone(),
            enum_values: schema.enum_values.clone(),
            default: schema.default.clone(),
            model,
        });
        if let Some(name) = &self.graph.nodes[id.0].model {
            self.models.insert(name.clone(), id);
        }
        Ok(id)
    }

    fn lower_object(&mut self, schema: &ShimSchema) -> ClientResult<DefinitionKind> {
        let mut properties = IndexMap::new();
        for (name, prop) in &schema.properties {
            let id = self.add_anonymous(prop)?;
            properties.insert(name.clone(), id);
        }
        let required = schema.required.0.iter().cloned().collect();
        Ok(DefinitionKind::Object {
            properties,
            required,
        })
    }

    fn claim_model_name(&self, name: &str) -> ClientResult<String> {
        if self.models.contains_key(name) {
            return Err(ClientError::schema(format!(
                "Duplicate model name '{}'",
                name
            )));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: JsonValue) -> ShimSchema {
        serde_json::from_value(value).unwrap()
    }

    fn tree_graph() -> DefinitionGraph {
        let mut builder = GraphBuilder::new();
        builder
            .add_named(
                "Node",
                &schema(json!({
                    "type": "object",
                    "required": ["value"],
                    "properties": {
                        "value": {"type": "integer"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/Node"}},
                        "parent": {"$ref": "#/definitions/Node"}
                    }
                })),
            )
            .unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn test_self_reference_is_stored_by_name() {
        let graph = tree_graph();
        let node_id = graph.resolve("Node").unwrap();
        let node = graph.get(node_id);
        assert_eq!(node.model.as_deref(), Some("Node"));

        let DefinitionKind::Object { properties, required } = &node.kind else {
            panic!("expected object");
        };
        assert!(required.contains("value"));
        let parent = graph.get(properties["parent"]);
        assert_eq!(parent.kind, DefinitionKind::Reference("Node".into()));

        let (target, _) = graph.deref(properties["parent"]).unwrap();
        assert_eq!(target, node_id);
    }

    #[test]
    fn test_resolve_is_identity_stable() {
        let graph = tree_graph();
        let a = graph.definition("Node").unwrap();
        let b = graph.definition("Node").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(graph.resolve("Node").unwrap(), graph.resolve("Node").unwrap());
    }

    #[test]
    fn test_mutual_references() {
        let mut builder = GraphBuilder::new();
        builder
            .add_named(
                "Owner",
                &schema(json!({"properties": {"pets": {"type": "array", "items": {"$ref": "Pet"}}}})),
            )
            .unwrap();
        builder
            .add_named(
                "Pet",
                &schema(json!({"properties": {"owner": {"$ref": "#/definitions/Owner"}}})),
            )
            .unwrap();
        let graph = builder.finish().unwrap();
        assert!(graph.definition("Owner").unwrap().is_object());
        assert!(graph.definition("Pet").unwrap().is_object());
    }

    #[test]
    fn test_unknown_reference_fails_at_finish() {
        let mut builder = GraphBuilder::new();
        builder
            .add_named(
                "Pet",
                &schema(json!({"properties": {"owner": {"$ref": "#/definitions/Nobody"}}})),
            )
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert_eq!(err.to_string(), "Schema Error: Unresolved reference 'Nobody'");
    }

    #[test]
    fn test_alias_cycle_detected_on_deref() {
        let mut builder = GraphBuilder::new();
        builder
            .add_named("A", &schema(json!({"$ref": "#/definitions/B"})))
            .unwrap();
        builder
            .add_named("B", &schema(json!({"$ref": "#/definitions/A"})))
            .unwrap();
        let graph = builder.finish().unwrap();
        let id = graph.resolve("A").unwrap();
        assert!(matches!(graph.deref(id), Err(ClientError::Schema(_))));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let mut builder = GraphBuilder::new();
        let err = builder.add_anonymous(&schema(json!({"type": "tuple"})));
        assert!(err.is_err());
    }

    #[test]
    fn test_inline_x_model_gets_a_name() {
        let mut builder = GraphBuilder::new();
        let id = builder
            .add_anonymous(&schema(json!({
                "type": "object",
                "x-model": "Address",
                "properties": {"street": {"type": "string"}}
            })))
            .unwrap();
        let graph = builder.finish().unwrap();
        assert_eq!(graph.get(id).model.as_deref(), Some("Address"));
    }
}
