//! Error types for document materialization

use thiserror::Error;

/// Result type for document-level operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Document-level failures. These are the only errors `materialize` returns;
/// everything below the document root degrades per field instead.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The raw document is not a JSON object
    #[error("raw document must be a JSON object, got {found}")]
    InvalidDocument { found: &'static str },

    /// The raw document carries no string `type`
    #[error("raw document has no string `type` field")]
    MissingDocumentType,
}

/// Why a single field degraded to `null`.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("expected {expected}, got {found}")]
    InvalidValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("link resolver failed: {0}")]
    LinkResolver(#[source] anyhow::Error),

    #[error("HTML serializer failed: {0}")]
    HtmlSerializer(#[source] anyhow::Error),

    #[error("remote file fetch failed: {0}")]
    Fetch(#[source] anyhow::Error),
}

/// JSON type name used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
