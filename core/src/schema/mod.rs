//! # Schema
//!
//! Document shims, `$ref` handling, the definition graph and the Record Types
//! generated from it.

pub mod document;
pub mod graph;
pub mod refs;
pub mod types;

pub use graph::{DefId, Definition, DefinitionGraph, DefinitionKind, GraphBuilder, Primitive};
pub use types::{FieldSpec, ModelRegistry, RecordType, WireType};
