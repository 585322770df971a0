#![deny(missing_docs)]

//! # Marshalling
//!
//! Recursive encode (native [`Value`] -> wire JSON) and decode (wire JSON ->
//! native [`Value`]) parameterized by a definition.
//!
//! Recursion follows the data, not the schema graph. Wire payloads are finite
//! trees, so cyclic definitions need no explicit guard here.

use crate::error::{ClientError, ClientResult};
use crate::schema::graph::{DefId, Definition, DefinitionGraph, DefinitionKind, Primitive};
use crate::schema::types::ModelRegistry;
use crate::value::{render_date, render_timestamp, Model, Value};
use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeSet;

/// Encodes and decodes values against the definitions of one spec.
#[derive(Debug, Clone, Copy)]
pub struct Marshaller<'a> {
    graph: &'a DefinitionGraph,
    models: &'a ModelRegistry,
}

impl<'a> Marshaller<'a> {
    /// Creates a marshaller over a graph and its Record Types.
    pub fn new(graph: &'a DefinitionGraph, models: &'a ModelRegistry) -> Self {
        Self { graph, models }
    }

    /// The definition graph values are checked against.
    pub fn graph(&self) -> &'a DefinitionGraph {
        self.graph
    }

    /// Encodes a native value into wire JSON.
    pub fn encode(&self, id: DefId, value: &Value) -> ClientResult<JsonValue> {
        let (_, def) = self.graph.deref(id)?;
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        let encoded = match &def.kind {
            DefinitionKind::Any => value.to_json(),
            DefinitionKind::Primitive(p) => encode_primitive(*p, def, value)?,
            DefinitionKind::Array { items } => {
                let Value::Array(elements) = value else {
                    return Err(mismatch("array", value));
                };
                elements
                    .iter()
                    .map(|element| self.encode(*items, element))
                    .collect::<ClientResult<Vec<_>>>()
                    .map(JsonValue::Array)?
            }
            DefinitionKind::Object {
                properties,
                required,
            } => self.encode_object(def, properties, required, value)?,
            DefinitionKind::Reference(_) => value.to_json(),
        };
        check_enum(def, &encoded)?;
        Ok(encoded)
    }

    fn encode_object(
        &self,
        def: &Definition,
        properties: &IndexMap<String, DefId>,
        required: &BTreeSet<String>,
        value: &Value,
    ) -> ClientResult<JsonValue> {
        let type_name = def.model.as_deref().unwrap_or("object");
        let extras: Vec<(&str, &Value)> = match value {
            Value::Model(model) => {
                if def.model.as_deref().is_some_and(|n| n != model.type_name()) {
                    return Err(ClientError::schema(format!(
                        "expected {} instance, found {}",
                        type_name,
                        model.type_name()
                    )));
                }
                Vec::new()
            }
            Value::Object(map) => map
                .iter()
                .filter(|(k, _)| !properties.contains_key(k.as_str()))
                .map(|(k, v)| (k.as_str(), v))
                .collect(),
            other => return Err(mismatch(type_name, other)),
        };

        let mut out = Map::new();
        for (name, prop_id) in properties {
            match value.field(name).filter(|v| !v.is_null()) {
                Some(field) => {
                    let encoded = self.encode(*prop_id, field).map_err(|e| match e {
                        ClientError::Schema(msg) => {
                            ClientError::Schema(format!("{}.{}: {}", type_name, name, msg))
                        }
                        other => other,
                    })?;
                    out.insert(name.clone(), encoded);
                }
                None if required.contains(name) => {
                    return Err(ClientError::schema(format!(
                        "required property '{}' missing from {}",
                        name, type_name
                    )));
                }
                None => {}
            }
        }
        for (name, extra) in extras {
            out.insert(name.to_string(), extra.to_json());
        }
        Ok(JsonValue::Object(out))
    }

    /// Decodes wire JSON into a native value.
    pub fn decode(&self, id: DefId, json: &JsonValue) -> ClientResult<Value> {
        let (_, def) = self.graph.deref(id)?;
        if json.is_null() {
            return Ok(Value::Null);
        }
        match &def.kind {
            DefinitionKind::Any | DefinitionKind::Reference(_) => Ok(Value::from_json(json)),
            DefinitionKind::Primitive(p) => decode_primitive(*p, def, json),
            DefinitionKind::Array { items } => {
                let JsonValue::Array(elements) = json else {
                    return Err(wire_mismatch("array", json));
                };
                elements
                    .iter()
                    .map(|element| self.decode(*items, element))
                    .collect::<ClientResult<Vec<_>>>()
                    .map(Value::Array)
            }
            DefinitionKind::Object { properties, .. } => {
                let JsonValue::Object(map) = json else {
                    return Err(wire_mismatch("object", json));
                };
                self.decode_object(def, properties, map)
            }
        }
    }

    fn decode_object(
        &self,
        def: &Definition,
        properties: &IndexMap<String, DefId>,
        map: &Map<String, JsonValue>,
    ) -> ClientResult<Value> {
        let Some(record) = def.model.as_deref().and_then(|n| self.models.get(n)) else {
            let mut bag = IndexMap::new();
            for (name, wire) in map {
                let decoded = match properties.get(name) {
                    Some(prop_id) => self.decode(*prop_id, wire)?,
                    None => Value::from_json(wire),
                };
                bag.insert(name.clone(), decoded);
            }
            return Ok(Value::Object(bag));
        };

        let mut model = Model::empty(record.name());
        for (name, wire) in map {
            match record.field(name) {
                Some(field) => {
                    let decoded = self.decode(field.definition, wire)?;
                    if !decoded.is_null() {
                        model.set(name, decoded);
                    }
                }
                None => {
                    tracing::trace!(model = record.name(), property = %name, "dropping undeclared property");
                }
            }
        }
        Ok(Value::Model(model))
    }
}

fn encode_primitive(primitive: Primitive, def: &Definition, value: &Value) -> ClientResult<JsonValue> {
    let format = def.format.as_deref();
    match (primitive, value) {
        (Primitive::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        (Primitive::String, Value::Date(d)) => Ok(JsonValue::String(render_date(d))),
        (Primitive::String, Value::DateTime(ts)) => Ok(JsonValue::String(render_timestamp(ts))),
        (Primitive::Integer, Value::Integer(i)) => {
            if format == Some("int32") && i32::try_from(*i).is_err() {
                return Err(ClientError::schema(format!("{} does not fit in int32", i)));
            }
            Ok(JsonValue::from(*i))
        }
        (Primitive::Integer, Value::Number(f)) if f.fract() == 0.0 && f.is_finite() => {
            let i = whole_to_i64(*f)
                .ok_or_else(|| ClientError::schema(format!("{} does not fit in int64", f)))?;
            encode_primitive(primitive, def, &Value::Integer(i))
        }
        (Primitive::Number, Value::Number(f)) => encode_number(*f, format),
        (Primitive::Number, Value::Integer(i)) => encode_number(*i as f64, format),
        (Primitive::Boolean, Value::Bool(b)) => Ok(JsonValue::Bool(*b)),
        (Primitive::File, _) => Err(ClientError::schema(
            "file values can only be sent as formData",
        )),
        (_, other) => Err(mismatch(primitive_name(primitive), other)),
    }
}

fn encode_number(f: f64, format: Option<&str>) -> ClientResult<JsonValue> {
    let f = if format == Some("float") {
        f64::from(f as f32)
    } else {
        f
    };
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| ClientError::schema(format!("{} is not a finite number", f)))
}

fn decode_primitive(primitive: Primitive, def: &Definition, json: &JsonValue) -> ClientResult<Value> {
    let format = def.format.as_deref();
    match (primitive, json) {
        (Primitive::String, JsonValue::String(s)) => match format {
            Some("date") => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| ClientError::schema(format!("invalid date '{}': {}", s, e))),
            Some("date-time") => DateTime::parse_from_rfc3339(s)
                .map(Value::DateTime)
                .map_err(|e| ClientError::schema(format!("invalid date-time '{}': {}", s, e))),
            _ => Ok(Value::String(s.clone())),
        },
        (Primitive::Integer, JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::Integer(i));
            }
            match n.as_f64().filter(|f| f.fract() == 0.0) {
                Some(f) => whole_to_i64(f)
                    .map(Value::Integer)
                    .ok_or_else(|| ClientError::schema(format!("{} does not fit in int64", n))),
                None => Err(wire_mismatch("integer", json)),
            }
        }
        (Primitive::Number, JsonValue::Number(n)) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| wire_mismatch("number", json)),
        (Primitive::Boolean, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (Primitive::File, JsonValue::String(s)) => Ok(Value::Bytes(s.clone().into_bytes())),
        _ => Err(wire_mismatch(primitive_name(primitive), json)),
    }
}

/// Converts a whole float to `i64`, or `None` outside the representable range.
fn whole_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    (f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

fn check_enum(def: &Definition, encoded: &JsonValue) -> ClientResult<()> {
    if def.enum_values.is_empty() || def.enum_values.contains(encoded) {
        return Ok(());
    }
    Err(ClientError::schema(format!(
        "{} is not one of {}",
        encoded,
        JsonValue::Array(def.enum_values.clone())
    )))
}

fn primitive_name(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "string",
        Primitive::Integer => "integer",
        Primitive::Number => "number",
        Primitive::Boolean => "boolean",
        Primitive::File => "file",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Date(_) => "date",
        Value::DateTime(_) => "date-time",
        Value::Bytes(_) => "bytes",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Model(_) => "model",
    }
}

fn mismatch(expected: &str, found: &Value) -> ClientError {
    ClientError::schema(format!("expected {}, found {}", expected, value_kind(found)))
}

fn wire_mismatch(expected: &str, found: &JsonValue) -> ClientError {
    ClientError::schema(format!("expected {} on the wire, found {}", expected, found))
}
