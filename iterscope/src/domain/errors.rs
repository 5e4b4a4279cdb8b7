//! Structured error types for iterscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::FrameIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("No event found for {0}")]
    MissingNode(String),

    #[error("Node index {index} is outside the node store (len {len})")]
    NodeOutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown report format: {0}")]
    UnknownFormat(String),

    #[error("Report extension must be lowercase with no leading dot: {0}")]
    InvalidExtension(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Sample {index} in {frame} references parent {parent}, which does not precede it")]
    InvalidSample { frame: FrameIndex, index: usize, parent: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange { field: &'static str, expected: &'static str, value: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
