//! Error types for argument validation and tool execution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from validating call arguments against a tool schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required field was not supplied.
    #[error("missing required field `{field}`")]
    Missing { field: &'static str },

    /// A field was supplied with the wrong JSON type.
    #[error("field `{field}` must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    /// An enum field was supplied with a value outside its declared set.
    #[error("field `{field}` must be one of [{}], got `{value}`", .allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

impl SchemaError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            SchemaError::Missing { field }
            | SchemaError::InvalidType { field, .. }
            | SchemaError::InvalidEnum { field, .. } => *field,
        }
    }
}

/// Errors that turn a tool call into a failure envelope.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] SchemaError),

    /// The path resolves outside every allowed root.
    #[error("Access denied: {} is not in allowed directories", .0.display())]
    AccessDenied(PathBuf),

    #[error("{0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl ToolError {
    /// Classification token written into the envelope's `error.type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "UnknownTool",
            ToolError::InvalidArguments(_) => "InvalidArguments",
            ToolError::AccessDenied(_) => "PermissionError",
            ToolError::InvalidValue(_) => "ValueError",
            ToolError::Io(_) => "IoError",
            ToolError::Serialize(_) | ToolError::Panicked(_) => "HandlerError",
        }
    }
}
