use std::io;
use thiserror::Error;

/// Errors that can occur while reading, merging or writing DESCRIPTION
#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata is not a valid object: it should only contain string/number/boolean values.")]
    InvalidMetadata,

    #[error("Metadata must be a JSON object")]
    NotAnObject,
}
