//! Errors that abort a command.

use std::path::PathBuf;

use marketplace_core::ValidationError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file is not JSON.
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Application document failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Category seed file is malformed.
    #[error("Invalid category at index {index}: {source}")]
    InvalidCategory {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Category seed file is not an array.
    #[error("{0} must contain a JSON array of categories")]
    NotAnArray(PathBuf),

    /// `--id` is not an object id.
    #[error("Invalid object id: {0}")]
    InvalidId(String),

    /// The referenced category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Another app already uses the slug.
    #[error("An app with slug '{0}' already exists (use --update to modify it)")]
    DuplicateSlug(String),

    /// The app to update does not exist.
    #[error("App not found: {0}")]
    AppNotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}
