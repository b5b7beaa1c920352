//! Command implementations.

pub mod add;
pub mod list;
pub mod seed;

use std::path::Path;

use serde_json::Value;

use crate::error::CliError;

/// Read and parse a JSON file.
async fn read_json(path: &Path) -> Result<Value, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
