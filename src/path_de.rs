//! Deserialization that reports where in the document it failed.
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Deserialization failure with the JSON path of the offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

impl PathError {
    fn from_path_err(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        Self { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize an already parsed JSON node, keeping path context in errors.
pub fn from_value_with_path<T: DeserializeOwned>(value: &Value) -> Result<T, PathError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(PathError::from_path_err)
}

/// Deserialize JSON source text, keeping path context in errors.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(PathError::from_path_err)
}
