#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Shared helpers for turning `$ref` strings into table names.
//!
//! Only references into the current document are supported. A reference is
//! reduced to the name it points at; resolution itself is a name lookup in the
//! owning table, never a structural copy.

use crate::error::{ClientError, ClientResult};
use percent_encoding::percent_decode_str;

/// The table a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTable {
    /// `#/definitions/{name}` or `#/components/schemas/{name}`.
    Definitions,
    /// `#/parameters/{name}` or `#/components/parameters/{name}`.
    Parameters,
    /// `#/responses/{name}` or `#/components/responses/{name}`.
    Responses,
    /// `#/components/requestBodies/{name}`.
    RequestBodies,
}

impl RefTable {
    fn swagger2_section(self) -> Option<&'static str> {
        match self {
            RefTable::Definitions => Some("definitions"),
            RefTable::Parameters => Some("parameters"),
            RefTable::Responses => Some("responses"),
            RefTable::RequestBodies => None,
        }
    }

    fn components_section(self) -> &'static str {
        match self {
            RefTable::Definitions => "schemas",
            RefTable::Parameters => "parameters",
            RefTable::Responses => "responses",
            RefTable::RequestBodies => "requestBodies",
        }
    }
}

/// Extracts the table entry name a local `$ref` points at.
///
/// Bare names (`"Pet"`) are accepted for definitions, as written by legacy
/// documents.
pub fn extract_ref_name(ref_str: &str, table: RefTable) -> ClientResult<String> {
    let Some(pointer) = ref_str.strip_prefix('#') else {
        if table == RefTable::Definitions && !ref_str.contains('/') && !ref_str.is_empty() {
            return Ok(ref_str.to_string());
        }
        return Err(ClientError::schema(format!(
            "Unsupported reference '{}': only local references are resolved",
            ref_str
        )));
    };

    let segments: Vec<&str> = pointer.trim_start_matches('/').split('/').collect();
    let name = match segments.as_slice() {
        [section, name] if Some(*section) == table.swagger2_section() => *name,
        ["components", section, name] if *section == table.components_section() => *name,
        _ => {
            return Err(ClientError::schema(format!(
                "Reference '{}' does not point into {}",
                ref_str,
                table.components_section()
            )))
        }
    };

    let decoded = decode_pointer_segment(name);
    if decoded.is_empty() {
        return Err(ClientError::schema(format!(
            "Reference '{}' has an empty name",
            ref_str
        )));
    }
    Ok(decoded)
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swagger2_definition_ref() {
        let name = extract_ref_name("#/definitions/Pet", RefTable::Definitions).unwrap();
        assert_eq!(name, "Pet");
    }

    #[test]
    fn test_components_schema_ref() {
        let name = extract_ref_name("#/components/schemas/Pet", RefTable::Definitions).unwrap();
        assert_eq!(name, "Pet");
    }

    #[test]
    fn test_bare_definition_name() {
        assert_eq!(
            extract_ref_name("Category", RefTable::Definitions).unwrap(),
            "Category"
        );
        assert!(extract_ref_name("Category", RefTable::Parameters).is_err());
    }

    #[test]
    fn test_parameter_ref() {
        let name = extract_ref_name("#/parameters/Limit", RefTable::Parameters).unwrap();
        assert_eq!(name, "Limit");
        let name =
            extract_ref_name("#/components/parameters/Limit", RefTable::Parameters).unwrap();
        assert_eq!(name, "Limit");
    }

    #[test]
    fn test_wrong_section() {
        let err = extract_ref_name("#/responses/NotFound", RefTable::Definitions);
        assert!(matches!(err, Err(ClientError::Schema(_))));
    }

    #[test]
    fn test_external_ref_rejected() {
        let err = extract_ref_name("other.yaml#/definitions/Pet", RefTable::Definitions);
        assert!(err.is_err());
    }

    #[test]
    fn test_decode_pointer_segment_percent_encoding() {
        let encoded = "User%20Profile~1details";
        let decoded = decode_pointer_segment(encoded);
        assert_eq!(decoded, "User Profile/details");
    }
}
