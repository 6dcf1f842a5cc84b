//! Typed YAML loading for the run configuration

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Deserialize `content`, reporting failures against `filename`
///
/// A document holding nothing but blank lines and comments reads as an empty
/// mapping, so every `#[serde(default)]` field takes its default.
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    let document = if is_blank_document(content) {
        tracing::debug!(file = filename, "Empty YAML document, using defaults");
        "{}"
    } else {
        content
    };
    serde_yml::from_str(document)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}

pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string())
}

fn is_blank_document(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}
