//! Structured error types for panic-scope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("Failed to render diagnostic page: {0}")]
    RenderFailed(#[from] std::fmt::Error),

    #[error("Failed to serialize trace: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to read source file {path}: {error}")]
    SourceUnreadable { path: String, error: std::io::Error },

    #[error("Source file {path} is {size} bytes, above the {limit} byte limit")]
    SourceTooLarge { path: String, size: u64, limit: u64 },

    #[error("Failed to build diagnostic response: {0}")]
    Response(#[from] http::Error),
}
