//! Domain model for see
//!
//! This module contains core domain types and errors that provide:
//! - Newtypes for the values that cross process boundaries
//! - A faithful view of how the traced child ended
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{ChildStatus, Pid};

pub use errors::{ExportError, LaunchError, TableError, TransportError};
