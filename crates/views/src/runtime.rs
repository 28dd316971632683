//! JsRuntime execution for template rendering and source transforms.
//!
//! This module contains the impure side-effect code that executes
//! JavaScript using deno_core's JsRuntime. A fresh runtime is created for
//! every render on the calling thread and for every transform on a thread
//! of its own.

use std::cell::RefCell;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deno_core::{extension, op2, JsRuntime, RuntimeOptions};
use reactviews_core::{
    generate_polyfills, generate_prelude, generate_render_call, generate_transform_call,
    TransformConfig,
};
use serde_json::{json, Value};

use crate::{
    cache::LoadedModule,
    error::{Result, ViewError},
    loader::{ModuleLoader, SourceCompiler},
    traits::ViewRuntime,
};

thread_local! {
    /// Output handed back by the last script (markup or transformed code).
    static OUTPUT: RefCell<Option<String>> = const { RefCell::new(None) };

    /// Loader serving `op_load_view` while a render runs on this thread.
    static ACTIVE_LOADER: RefCell<Option<Arc<ModuleLoader>>> = const { RefCell::new(None) };

    /// Latest loader error raised during the current render, with the
    /// message JS saw for it.
    static LOAD_ERROR: RefCell<Option<(String, ViewError)>> = const { RefCell::new(None) };
}

#[derive(Debug, thiserror::Error, deno_error::JsError)]
#[class(generic)]
#[error("{0}")]
struct LoadViewError(String);

/// Custom op to receive output from JavaScript.
#[op2(fast)]
fn op_set_output(#[string] output: String) {
    OUTPUT.with(|cell| {
        *cell.borrow_mut() = Some(output);
    });
}

/// Custom op resolving and loading a module for the CommonJS loader.
///
/// Returns `{ "filename": ..., "code": ... }` as JSON.
#[op2]
#[string]
fn op_load_view(
    #[string] parent: String,
    #[string] specifier: String,
) -> std::result::Result<String, LoadViewError> {
    let loader = ACTIVE_LOADER
        .with(|cell| cell.borrow().clone())
        .ok_or_else(|| LoadViewError("no view loader is active".to_string()))?;

    let parent = (!parent.is_empty()).then(|| PathBuf::from(parent));
    match loader.load(parent.as_deref(), &specifier) {
        Ok(module) => Ok(json!({
            "filename": module.filename.to_string_lossy(),
            "code": &*module.code,
        })
        .to_string()),
        Err(e) => {
            let message = e.to_string();
            LOAD_ERROR.with(|cell| {
                *cell.borrow_mut() = Some((message.clone(), e));
            });
            Err(LoadViewError(message))
        }
    }
}

/// Custom op forwarding `console` calls to `tracing`.
#[op2(fast)]
fn op_console(#[string] level: String, #[string] message: String) {
    match level.as_str() {
        "error" => tracing::error!(target: "reactviews::js", "{message}"),
        "warn" => tracing::warn!(target: "reactviews::js", "{message}"),
        "debug" => tracing::debug!(target: "reactviews::js", "{message}"),
        "trace" => tracing::trace!(target: "reactviews::js", "{message}"),
        _ => tracing::info!(target: "reactviews::js", "{message}"),
    }
}

extension!(
    reactviews_ext,
    ops = [op_set_output, op_load_view, op_console]
);

/// Clears the per-thread render state when dropped.
struct ThreadState;

impl ThreadState {
    fn enter(loader: Option<Arc<ModuleLoader>>) -> Self {
        ACTIVE_LOADER.with(|cell| *cell.borrow_mut() = loader);
        Self::reset();
        Self
    }

    fn reset() {
        OUTPUT.with(|cell| *cell.borrow_mut() = None);
        LOAD_ERROR.with(|cell| *cell.borrow_mut() = None);
    }
}

impl Drop for ThreadState {
    fn drop(&mut self) {
        ACTIVE_LOADER.with(|cell| *cell.borrow_mut() = None);
        Self::reset();
    }
}

/// Run `scripts` in order in a fresh runtime and return what they output.
fn execute(
    loader: Option<Arc<ModuleLoader>>,
    scripts: Vec<(&'static str, String)>,
) -> Result<String> {
    let _state = ThreadState::enter(loader);

    let mut runtime = JsRuntime::new(RuntimeOptions {
        extensions: vec![reactviews_ext::init()],
        ..Default::default()
    });

    for (name, code) in scripts {
        if let Err(e) = runtime.execute_script(name, code) {
            let exception = e.to_string();
            return Err(take_load_error(&exception)
                .unwrap_or(ViewError::JsExecution(exception)));
        }
    }

    OUTPUT
        .with(|cell| cell.borrow_mut().take())
        .ok_or(ViewError::NoMarkupRendered)
}

/// The loader error behind `exception`, if that is what escaped the script.
///
/// A loader error JS caught and replaced with its own throw is discarded.
fn take_load_error(exception: &str) -> Option<ViewError> {
    let (message, error) = LOAD_ERROR.with(|cell| cell.borrow_mut().take())?;
    exception.contains(&message).then_some(error)
}

/// Read a JavaScript bundle from disk.
pub fn read_bundle(path: &Path) -> Result<String> {
    let canonical = path.canonicalize().map_err(|e| ViewError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if canonical.extension() != Some(OsStr::new("js")) {
        return Err(ViewError::Load {
            path: path.to_path_buf(),
            reason: "Bundle must be a .js file".to_string(),
        });
    }

    std::fs::read_to_string(&canonical).map_err(|e| ViewError::Load {
        path: canonical.clone(),
        reason: e.to_string(),
    })
}

/// Renders templates with React inside an embedded V8 runtime.
///
/// The renderer bundle must define `globalThis.React` and
/// `globalThis.ReactDOMServer`.
#[derive(Debug, Clone)]
pub struct JsViewRuntime {
    renderer_bundle: Arc<String>,
    loader: Arc<ModuleLoader>,
    node_env: String,
}

impl JsViewRuntime {
    /// Create a runtime from a renderer bundle on disk.
    pub fn new(
        renderer_bundle: &Path,
        loader: Arc<ModuleLoader>,
        node_env: impl Into<String>,
    ) -> Result<Self> {
        let code = read_bundle(renderer_bundle)?;

        tracing::info!(bundle = %renderer_bundle.display(), "Renderer bundle loaded");

        Ok(Self::from_source(code, loader, node_env))
    }

    /// Create a runtime from renderer bundle source.
    pub fn from_source(
        code: String,
        loader: Arc<ModuleLoader>,
        node_env: impl Into<String>,
    ) -> Self {
        Self {
            renderer_bundle: Arc::new(code),
            loader,
            node_env: node_env.into(),
        }
    }

    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }
}

impl ViewRuntime for JsViewRuntime {
    type Component = Arc<LoadedModule>;

    fn load(&self, path: &Path) -> Result<Self::Component> {
        self.loader.load(None, &path.to_string_lossy())
    }

    fn render_to_static_markup(
        &self,
        component: &Self::Component,
        props: &Value,
        locals: &Value,
    ) -> Result<String> {
        let polyfills = generate_polyfills(&self.node_env)?;
        let prelude = generate_prelude()?;
        let render_call =
            generate_render_call(&component.filename, &props.to_string(), &locals.to_string())?;

        execute(
            Some(Arc::clone(&self.loader)),
            vec![
                ("<polyfills>", polyfills),
                ("<renderer>", self.renderer_bundle.to_string()),
                ("<prelude>", prelude),
                ("<render>", render_call),
            ],
        )
    }
}

/// Runs a Babel standalone bundle over template sources.
///
/// The bundle must define `globalThis.Babel.transform`.
#[derive(Debug, Clone)]
pub struct BabelCompiler {
    bundle: Arc<String>,
    node_env: String,
}

impl BabelCompiler {
    pub fn new(bundle: &Path, node_env: impl Into<String>) -> Result<Self> {
        let code = read_bundle(bundle)?;

        tracing::info!(bundle = %bundle.display(), "Transform bundle loaded");

        Ok(Self::from_source(code, node_env))
    }

    pub fn from_source(code: String, node_env: impl Into<String>) -> Self {
        Self {
            bundle: Arc::new(code),
            node_env: node_env.into(),
        }
    }
}

impl SourceCompiler for BabelCompiler {
    fn compile(&self, filename: &Path, source: &str, config: &TransformConfig) -> Result<String> {
        let transform_error = |reason: String| ViewError::Transform {
            path: filename.to_path_buf(),
            reason,
        };

        let options = config
            .unscoped()
            .with("filename", json!(filename.to_string_lossy()))
            .to_json()?;
        let polyfills = generate_polyfills(&self.node_env)?;
        let call = generate_transform_call(source, &options)?;

        tracing::debug!(filename = %filename.display(), "Transforming template");

        // Requires arrive while a render runtime is executing on this thread,
        // so the transform runtime gets a thread of its own.
        let bundle = self.bundle.to_string();
        let result = std::thread::scope(|scope| {
            scope
                .spawn(move || {
                    execute(
                        None,
                        vec![
                            ("<polyfills>", polyfills),
                            ("<transform-bundle>", bundle),
                            ("<transform>", call),
                        ],
                    )
                })
                .join()
        })
        .map_err(|_| transform_error("transform thread panicked".to_string()))?;

        result.map_err(|e| match e {
            ViewError::JsExecution(reason) => transform_error(reason),
            ViewError::NoMarkupRendered => transform_error("no code produced".to_string()),
            other => other,
        })
    }
}
