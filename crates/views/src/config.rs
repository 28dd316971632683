//! View engine configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use reactviews_core::{PartialEngineOptions, Settings, DEVELOPMENT};

use crate::{
    cache::MemoryModuleCache,
    engine::Engine,
    error::{Result, ViewError},
    host::ViewEngines,
    loader::{normalize, ModuleLoader},
    runtime::{BabelCompiler, JsViewRuntime},
    transform::BabelTransform,
};

/// View engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewsConfig {
    /// Directory holding the templates (default: "views")
    pub views_dir: PathBuf,
    /// Environment name; "development" evicts view modules after each render
    pub env: String,
    /// Bundle defining `React` and `ReactDOMServer` (default: "dist/renderer.js")
    pub renderer_bundle: PathBuf,
    /// Babel standalone bundle. Templates load untransformed when unset.
    pub babel_bundle: Option<PathBuf>,
    /// Document type override
    pub doc_type: Option<String>,
    /// Template file extension (default: "jsx")
    pub extension: String,
}

impl ViewsConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `VIEWS_DIR` - Template directory (default: "views")
    /// - `VIEWS_ENV` - Environment name, falling back to `NODE_ENV` (default: "production")
    /// - `VIEWS_RENDERER_BUNDLE` - React renderer bundle (default: "dist/renderer.js")
    /// - `VIEWS_BABEL_BUNDLE` - Babel standalone bundle (optional)
    /// - `VIEWS_DOCTYPE` - Document type prefix (optional)
    /// - `VIEWS_EXTENSION` - Template extension (default: "jsx")
    pub fn from_env() -> Self {
        Self {
            views_dir: env::var("VIEWS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("views")),
            env: env::var("VIEWS_ENV")
                .or_else(|_| env::var("NODE_ENV"))
                .unwrap_or_else(|_| "production".to_string()),
            renderer_bundle: env::var("VIEWS_RENDERER_BUNDLE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dist/renderer.js")),
            babel_bundle: env::var("VIEWS_BABEL_BUNDLE").ok().map(PathBuf::from),
            doc_type: env::var("VIEWS_DOCTYPE").ok(),
            extension: env::var("VIEWS_EXTENSION").unwrap_or_else(|_| "jsx".to_string()),
        }
    }

    pub fn is_development(&self) -> bool {
        self.env == DEVELOPMENT
    }

    /// Engine options implied by this configuration.
    pub fn engine_options(&self) -> PartialEngineOptions {
        let options = PartialEngineOptions::new().transform_templates(self.babel_bundle.is_some());
        match &self.doc_type {
            Some(doc_type) => options.doc_type(doc_type.clone()),
            None => options,
        }
    }

    /// Build the JavaScript-backed engine and register it with a host registry.
    ///
    /// This is an I/O operation that reads the renderer and Babel bundles.
    pub fn build(&self) -> Result<ViewEngines> {
        let views_dir = std::path::absolute(&self.views_dir)
            .map(|dir| normalize(&dir))
            .map_err(|e| ViewError::Load {
                path: self.views_dir.clone(),
                reason: e.to_string(),
            })?;

        let cache = MemoryModuleCache::new();
        let loader = Arc::new(ModuleLoader::new(cache.clone()));
        let runtime =
            JsViewRuntime::new(&self.renderer_bundle, Arc::clone(&loader), self.env.clone())?;

        let mut builder = Engine::builder(runtime)
            .options(self.engine_options())
            .cache(cache);
        if let Some(bundle) = &self.babel_bundle {
            let compiler = BabelCompiler::new(bundle, self.env.clone())?;
            builder = builder.transform(BabelTransform::new(loader, compiler));
        }
        let engine = builder.build()?;

        tracing::info!(
            views = %views_dir.display(),
            env = %self.env,
            transform = self.babel_bundle.is_some(),
            "View engine configured"
        );

        Ok(ViewEngines::new(Settings::new(views_dir).with_env(self.env.clone()))
            .engine(&self.extension, engine))
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
