//! React view engine - Imperative Shell.
//!
//! This crate orchestrates I/O operations using pure functions from
//! `reactviews_core`. It renders JSX templates to static HTML with
//! `deno_core`, compiling them on demand and evicting them from the module
//! cache after every render in development.
//!
//! # Architecture
//!
//! - **Functional Core** (`reactviews_core`): Pure options, patterns, prelude
//! - **Imperative Shell** (this crate): Engine state, module loading, JsRuntime execution
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reactviews::{
//!     BabelCompiler, BabelTransform, Engine, JsViewRuntime, MemoryModuleCache, ModuleLoader,
//!     RenderOptions, Settings,
//! };
//!
//! let cache = MemoryModuleCache::new();
//! let loader = Arc::new(ModuleLoader::new(cache.clone()));
//! let runtime = JsViewRuntime::new("dist/renderer.js".as_ref(), loader.clone(), "development")?;
//! let compiler = BabelCompiler::new("dist/babel.js".as_ref(), "development")?;
//!
//! // Nothing is registered until the first render
//! let engine = Engine::builder(runtime)
//!     .transform(BabelTransform::new(loader, compiler))
//!     .cache(cache)
//!     .build()?;
//!
//! let options = RenderOptions::new(Settings::new("/app/views").with_env("development"))
//!     .with_locals(serde_json::json!({ "user": "ada" }));
//! let html = engine.render("/app/views/home.jsx".as_ref(), &options)?;
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! ```

mod cache;
mod config;
mod engine;
mod error;
mod host;
mod loader;
mod runtime;
mod traits;
mod transform;

#[cfg(test)]
mod test_support;

// Re-export core types for convenience
pub use reactviews_core::{
    CoreError, EngineOptions, ModulePattern, PartialEngineOptions, RenderOptions,
    Settings, TransformConfig, ViewDirectories, DEFAULT_DOC_TYPE, DEVELOPMENT, ENGINE_MODULE,
    LOCALS_CONTEXT_EXPORT,
};

// Export shell types
pub use cache::{LoadedModule, MemoryModuleCache};
pub use config::ViewsConfig;
pub use engine::{create_engine, invalidate_matching, Engine, EngineBuilder};
pub use error::{sanitize_error, Result, ViewError};
pub use host::{Rendered, ViewEngine, ViewEngines};
pub use loader::{resolve, ModuleLoader, ScopedTransform, SourceCompiler};
pub use runtime::{read_bundle, BabelCompiler, JsViewRuntime};
pub use traits::{ModuleCache, SourceTransform, ViewRuntime};
pub use transform::BabelTransform;
