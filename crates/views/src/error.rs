//! View errors including I/O and JavaScript execution.

use std::path::PathBuf;

use reactviews_core::CoreError;
use thiserror::Error;

/// View errors including I/O and JavaScript execution.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Cannot find module '{specifier}'")]
    ModuleNotFound { specifier: String },

    #[error("Failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to transform {path}: {reason}")]
    Transform { path: PathBuf, reason: String },

    #[error("JavaScript execution error: {0}")]
    JsExecution(String),

    #[error("No markup was rendered")]
    NoMarkupRendered,

    #[error("Template transform is enabled but no source transform was provided")]
    NotRegistered,

    #[error("No view engine registered for extension '{0}'")]
    NoEngine(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ViewError>;

/// Sanitize error messages for client-facing responses.
///
/// Hides internal details while providing useful feedback.
pub fn sanitize_error(error: &ViewError) -> String {
    match error {
        // Safe to expose
        ViewError::ModuleNotFound { .. } => "View not found".to_string(),
        ViewError::Task(_) => "Service temporarily unavailable".to_string(),
        // Hide internal details
        ViewError::Load { .. } | ViewError::Transform { .. } => {
            "Failed to load view".to_string()
        }
        ViewError::JsExecution(_) => "Render failed".to_string(),
        ViewError::NoMarkupRendered => "Render produced no output".to_string(),
        ViewError::NotRegistered | ViewError::NoEngine(_) => {
            "Internal configuration error".to_string()
        }
        ViewError::Core(_) => "Invalid request".to_string(),
    }
}
