//! Error types for schema compilation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while loading or compiling a custom type.
///
/// These are contract violations: a schema that produces one of them must not
/// be registered downstream.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The custom type JSON does not match the field model
    #[error("invalid custom type schema: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two fields compiled to the same structural path
    #[error("type path registered twice: {path}")]
    DuplicatePath { path: String },

    /// Two distinct paths produced the same generated type name
    #[error("type name '{name}' generated twice (second time at {path})")]
    DuplicateTypeName { name: String, path: String },

    /// A custom type declares more than one UID field
    #[error("custom type declares UID field '{second}' after '{first}'")]
    MultipleUids { first: String, second: String },
}
