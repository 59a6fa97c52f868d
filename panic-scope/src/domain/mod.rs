//! Domain model for panic-scope
//!
//! This module contains the core domain types and errors:
//! - The parsed stack [`Frame`]
//! - Structured error handling via [`DiagnosticError`]

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{file_name_of, Frame};

pub use errors::DiagnosticError;
