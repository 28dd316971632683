//! Pure view-engine logic - no I/O, no async, no side effects.
//!
//! This crate provides:
//! - Engine options with field-by-field defaults
//! - View directories and the eviction pattern built from them
//! - The per-render options model
//! - Prelude generation for the embedded JavaScript runtime
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use reactviews_core::{EngineOptions, PartialEngineOptions, RenderOptions, Settings};
//!
//! // Missing fields fall back to their defaults one by one
//! let partial = PartialEngineOptions::new().transform_templates(false);
//! let options = EngineOptions::from_partial(partial);
//! assert_eq!(options.doc_type, "<!DOCTYPE html>");
//!
//! // Per-render options as the host hands them over
//! let request = RenderOptions::new(Settings::new("/app/views").with_env("development"));
//! assert!(request.is_development());
//!
//! let pattern = request.views().pattern().unwrap();
//! assert!(pattern.matches(Path::new("/app/views/home.jsx")));
//! assert!(!pattern.matches(Path::new("/app/other/home.jsx")));
//! ```

mod error;
mod options;
mod prelude;
mod request;
mod views;

pub use error::{CoreError, Result};
pub use options::{
    EngineOptions, PartialEngineOptions, TransformConfig, DEFAULT_DOC_TYPE, SCOPE_KEY,
};
pub use prelude::{
    generate_polyfills, generate_prelude, generate_render_call, generate_transform_call,
    ENGINE_MODULE, LOCALS_CONTEXT_EXPORT,
};
pub use request::{RenderOptions, Settings, DEVELOPMENT};
pub use views::{ModulePattern, ViewDirectories};
