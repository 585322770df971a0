#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helpers for deriving operation identifiers when `operationId` is missing.

use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)}").expect("Invalid regex constant"));

/// Derives an operation identifier from the HTTP method and path template.
///
/// e.g. `DELETE /pet/{petId}` -> `delete_pet_petId`
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let raw = format!("{}_{}", method.to_lowercase(), path).replace(['/', '{', '}'], "_");
    raw.replace("__", "_").trim_matches('_').to_string()
}

/// Returns the placeholder names of a path template, in order.
///
/// e.g. `/pet/{petId}/uploadImage` -> `["petId"]`
pub fn path_placeholders(path: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(path)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(derive_operation_id("DELETE", "/pet/{petId}"), "delete_pet_petId");
        assert_eq!(derive_operation_id("get", "/pet"), "get_pet");
        assert_eq!(
            derive_operation_id("POST", "/pet/{petId}/uploadImage"),
            "post_pet_petId_uploadImage"
        );
        assert_eq!(derive_operation_id("GET", "/"), "get");
    }

    #[test]
    fn test_path_placeholders() {
        assert_eq!(path_placeholders("/store/order/{orderId}"), vec!["orderId"]);
        assert_eq!(
            path_placeholders("/users/{userId}/pets/{petId}"),
            vec!["userId", "petId"]
        );
        assert!(path_placeholders("/pet").is_empty());
        assert!(path_placeholders("/broken/{id").is_empty());
    }

    #[test]
    fn test_placeholder_pattern_is_compiled_once() {
        let first: *const Regex = &*PLACEHOLDER;
        for _ in 0..3 {
            assert_eq!(path_placeholders("/pet/{petId}"), vec!["petId"]);
        }
        let second: *const Regex = &*PLACEHOLDER;
        assert!(std::ptr::eq(first, second));
    }
}
