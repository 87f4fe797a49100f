//! Structured error types for see
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// A captured report that cannot be turned into a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("record {record} has {found} fields, expected {expected}")]
    ArityMismatch { record: usize, expected: usize, found: usize },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{} exists and is not a FIFO", .0.display())]
    NotAFifo(PathBuf),

    #[error("Failed to create FIFO at {}: {source}", path.display())]
    FifoCreation { path: PathBuf, source: std::io::Error },

    #[error("Failed to open FIFO at {}: {source}", path.display())]
    FifoOpen { path: PathBuf, source: std::io::Error },

    #[error("FIFO reader thread panicked")]
    ReaderPanicked,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Failed to launch {program}: {source}")]
    SpawnFailed { program: String, source: std::io::Error },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
