//! Core view-engine error types (pure - no I/O variants).

use thiserror::Error;

/// Core view-engine errors (pure - no I/O variants).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("At least one view directory is required")]
    EmptyViewDirectories,

    #[error("Invalid view directory pattern: {0}")]
    Pattern(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid engine options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
