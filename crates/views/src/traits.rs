//! Collaborators the render pipeline is built from.

use std::path::{Path, PathBuf};

use reactviews_core::{TransformConfig, ViewDirectories};
use serde_json::Value;

use crate::error::Result;

/// Loads templates and renders them to static markup.
pub trait ViewRuntime: Send + Sync {
    /// Normalized handle to a loaded template, default export already unwrapped.
    type Component;

    /// Load the template module at `path`.
    fn load(&self, path: &Path) -> Result<Self::Component>;

    /// Render `component` with `props`, exposing `locals` through the locals
    /// context to every descendant.
    fn render_to_static_markup(
        &self,
        component: &Self::Component,
        props: &Value,
        locals: &Value,
    ) -> Result<String>;
}

/// One-time registration of a source transform over a set of directories.
pub trait SourceTransform: Send + Sync {
    /// Transform every template under `scope` with `config` from now on.
    fn register(&self, scope: &ViewDirectories, config: &TransformConfig) -> Result<()>;
}

/// Cache of loaded modules that the engine evicts from in development.
pub trait ModuleCache: Send + Sync {
    /// Filenames of every cached module.
    fn filenames(&self) -> Vec<PathBuf>;

    /// Drop the module loaded from `filename`. Returns whether it was cached.
    fn evict(&self, filename: &Path) -> bool;
}
