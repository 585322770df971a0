#![deny(missing_docs)]

//! # Document Loading
//!
//! Reads schema documents from text, files or (with the `http` feature)
//! URLs. The origin is kept so the base URL can be derived from it.

use crate::error::{ClientError, ClientResult};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use url::Url;

/// A parsed document and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// The raw document.
    pub document: JsonValue,
    /// URL of the source (`file://` for local files), if known.
    pub origin: Option<String>,
}

/// Parses a JSON or YAML document.
pub fn parse_document(text: &str) -> ClientResult<JsonValue> {
    match serde_json::from_str(text) {
        Ok(document) => Ok(document),
        Err(_) => Ok(serde_yaml::from_str(text)?),
    }
}

/// Reads and parses a document from disk.
pub fn load_path(path: impl AsRef<Path>) -> ClientResult<LoadedDocument> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let document = parse_document(&text)?;
    let origin = fs::canonicalize(path)
        .ok()
        .and_then(|p| Url::from_file_path(p).ok())
        .map(String::from);
    tracing::debug!(path = %path.display(), "loaded document");
    Ok(LoadedDocument { document, origin })
}

/// Fetches and parses a document over HTTP.
#[cfg(feature = "http")]
pub async fn load_url(url: &str) -> ClientResult<LoadedDocument> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Transport(format!(
            "Failed to fetch '{}': status {}",
            url, status
        )));
    }
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let document = parse_document(&text)?;
    tracing::debug!(url, "loaded document");
    Ok(LoadedDocument {
        document,
        origin: Some(url.to_string()),
    })
}

/// Loads from a URL when `source` parses as an http(s) URL, otherwise from a
/// file path.
#[cfg(feature = "http")]
pub async fn load(source: &str) -> ClientResult<LoadedDocument> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => load_url(source).await,
        _ => load_path(source),
    }
}

/// Ensures a path value is not a URL when the `http` feature is disabled.
#[cfg(not(feature = "http"))]
pub async fn load(source: &str) -> ClientResult<LoadedDocument> {
    if Url::parse(source).is_ok_and(|u| matches!(u.scheme(), "http" | "https")) {
        return Err(ClientError::Transport(format!(
            "Loading '{}' requires the http feature",
            source
        )));
    }
    load_path(source)
}
