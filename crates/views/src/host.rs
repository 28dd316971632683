//! Host-side view-engine registry and axum integration.
//!
//! Mirrors the convention where a server maps file extensions to render
//! functions and resolves view names against its configured directories.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use reactviews_core::{RenderOptions, Settings};
use serde_json::{Map, Value};

use crate::{
    engine::Engine,
    error::{sanitize_error, Result, ViewError},
    traits::ViewRuntime,
};

/// Object-safe face of an engine, as stored in [`ViewEngines`].
pub trait ViewEngine: Send + Sync {
    fn render_view(&self, file_path: &Path, options: &RenderOptions) -> Result<String>;
}

impl<R: ViewRuntime> ViewEngine for Engine<R> {
    fn render_view(&self, file_path: &Path, options: &RenderOptions) -> Result<String> {
        self.render(file_path, options)
    }
}

/// Extension-to-engine registry plus the host settings sent with each render.
#[derive(Clone)]
pub struct ViewEngines {
    settings: Settings,
    engines: Arc<HashMap<String, Arc<dyn ViewEngine>>>,
    default_extension: Option<String>,
}

impl ViewEngines {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            engines: Arc::new(HashMap::new()),
            default_extension: None,
        }
    }

    /// Register `engine` for files ending in `extension` (leading dot optional).
    ///
    /// The first registered extension becomes the default for bare view names.
    pub fn engine(mut self, extension: &str, engine: impl ViewEngine + 'static) -> Self {
        let extension = extension.trim_start_matches('.').to_string();
        self.default_extension.get_or_insert_with(|| extension.clone());
        Arc::make_mut(&mut self.engines).insert(extension, Arc::new(engine));
        self
    }

    /// Extension appended to view names that have none.
    pub fn default_extension(mut self, extension: &str) -> Self {
        self.default_extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve a view name to a file in the first directory that has it.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let not_found = || ViewError::ModuleNotFound {
            specifier: name.to_string(),
        };

        let mut relative = PathBuf::from(name.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(not_found());
        }
        if relative.extension().is_none() {
            if let Some(extension) = &self.default_extension {
                relative.set_extension(extension);
            }
        }

        self.settings
            .views
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
            .ok_or_else(not_found)
    }

    /// Resolve and render a view on the current thread.
    pub fn render_blocking(
        &self,
        name: &str,
        locals: Value,
        props: Map<String, Value>,
    ) -> Result<String> {
        let path = self.resolve(name)?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let engine = self
            .engines
            .get(&extension)
            .ok_or(ViewError::NoEngine(extension))?;

        let mut options = RenderOptions::new(self.settings.clone()).with_locals(locals);
        options.props = props;

        engine.render_view(&path, &options)
    }

    /// Render a view without blocking the async runtime.
    pub async fn render(&self, name: &str, locals: Value) -> Result<Rendered> {
        self.render_with_props(name, locals, Map::new()).await
    }

    pub async fn render_with_props(
        &self,
        name: &str,
        locals: Value,
        props: Map<String, Value>,
    ) -> Result<Rendered> {
        let engines = self.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || engines.render_blocking(&name, locals, props))
            .await
            .map_err(|e| ViewError::Task(e.to_string()))?
            .map(Rendered)
    }
}

/// A rendered HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered(pub String);

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        Html(self.0).into_response()
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewError::ModuleNotFound { .. } => StatusCode::NOT_FOUND,
            ViewError::Task(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "View render failed");
        }

        (status, sanitize_error(&self)).into_response()
    }
}
