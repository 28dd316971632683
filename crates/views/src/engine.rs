//! The view engine: registration state and the render pipeline.
//!
//! An [`Engine`] owns its options, its runtime and a one-time registration
//! state. The first render builds the eviction pattern from the view
//! directories it was given and registers the source transform for them;
//! both stick for the life of the engine.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use reactviews_core::{
    EngineOptions, ModulePattern, PartialEngineOptions, RenderOptions, ViewDirectories,
};

use crate::{
    error::{Result, ViewError},
    traits::{ModuleCache, SourceTransform, ViewRuntime},
};

/// What the first render established.
#[derive(Debug)]
struct Registration {
    views: ViewDirectories,
    pattern: ModulePattern,
    transform_registered: bool,
}

#[derive(Debug)]
enum RegistrationState {
    Pending,
    Ready(Registration),
}

impl RegistrationState {
    /// Build the registration from `views` unless one exists already.
    fn get_or_init(&mut self, views: &ViewDirectories) -> Result<&mut Registration> {
        if let Self::Pending = self {
            *self = Self::Ready(Registration {
                views: views.clone(),
                pattern: views.pattern()?,
                transform_registered: false,
            });
        }

        match self {
            Self::Ready(registration) => Ok(registration),
            Self::Pending => unreachable!("registration initialized above"),
        }
    }
}

struct EngineInner<R> {
    options: EngineOptions,
    runtime: R,
    transform: Option<Arc<dyn SourceTransform>>,
    cache: Option<Arc<dyn ModuleCache>>,
    state: Mutex<RegistrationState>,
}

/// A configured render pipeline, shareable across threads.
pub struct Engine<R> {
    inner: Arc<EngineInner<R>>,
}

impl<R> Clone for Engine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ViewRuntime> Engine<R> {
    pub fn builder(runtime: R) -> EngineBuilder<R> {
        EngineBuilder {
            runtime,
            options: EngineOptions::default(),
            transform: None,
            cache: None,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn runtime(&self) -> &R {
        &self.inner.runtime
    }

    /// Render the template at `file_path` to a complete document.
    ///
    /// In development the cached modules under the view directories are
    /// evicted afterwards, whether or not the render succeeded.
    pub fn render(&self, file_path: &Path, options: &RenderOptions) -> Result<String> {
        let pattern = self.register(options.views())?;

        let result = self.render_document(file_path, options);

        if options.is_development() {
            if let Some(cache) = &self.inner.cache {
                let evicted = invalidate_matching(cache.as_ref(), &pattern);
                tracing::debug!(evicted, pattern = pattern.as_str(), "Evicted view modules");
            }
        }

        result
    }

    /// Callback form of [`Engine::render`]; `callback` runs exactly once,
    /// before this returns.
    pub fn render_file<F>(&self, file_path: &Path, options: &RenderOptions, callback: F)
    where
        F: FnOnce(Result<String>),
    {
        callback(self.render(file_path, options));
    }

    /// Build the pattern and register the transform on first use.
    fn register(&self, views: &ViewDirectories) -> Result<ModulePattern> {
        // Held across the transform registration so it runs at most once
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let registration = state.get_or_init(views)?;

        if self.inner.options.transform_templates && !registration.transform_registered {
            let transform = self
                .inner
                .transform
                .as_ref()
                .ok_or(ViewError::NotRegistered)?;
            let config = self.inner.options.transform.scoped_to(&registration.views);
            transform.register(&registration.views, &config)?;
            registration.transform_registered = true;

            tracing::info!(views = ?registration.views, "Source transform registered");
        }

        Ok(registration.pattern.clone())
    }

    fn render_document(&self, file_path: &Path, options: &RenderOptions) -> Result<String> {
        let component = self.inner.runtime.load(file_path)?;
        let props = options.props_value()?;
        let markup =
            self.inner
                .runtime
                .render_to_static_markup(&component, &props, &options.locals)?;

        Ok(format!("{}{}", self.inner.options.doc_type, markup))
    }
}

/// Builder for [`Engine`]. Nothing is registered until the first render.
pub struct EngineBuilder<R> {
    runtime: R,
    options: EngineOptions,
    transform: Option<Arc<dyn SourceTransform>>,
    cache: Option<Arc<dyn ModuleCache>>,
}

impl<R: ViewRuntime> EngineBuilder<R> {
    pub fn options(mut self, options: impl Into<EngineOptions>) -> Self {
        self.options = options.into();
        self
    }

    pub fn transform(mut self, transform: impl SourceTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn cache(mut self, cache: impl ModuleCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn build(self) -> Result<Engine<R>> {
        if self.options.transform_templates && self.transform.is_none() {
            return Err(ViewError::NotRegistered);
        }

        Ok(Engine {
            inner: Arc::new(EngineInner {
                options: self.options,
                runtime: self.runtime,
                transform: self.transform,
                cache: self.cache,
                state: Mutex::new(RegistrationState::Pending),
            }),
        })
    }
}

/// Create an engine from caller options, filling the gaps from the defaults.
pub fn create_engine<R: ViewRuntime>(
    options: PartialEngineOptions,
    runtime: R,
    transform: Option<Arc<dyn SourceTransform>>,
    cache: Option<Arc<dyn ModuleCache>>,
) -> Result<Engine<R>> {
    let mut builder = Engine::builder(runtime).options(options);
    builder.transform = transform;
    builder.cache = cache;
    builder.build()
}

/// Evict every cached module whose filename matches `pattern`.
///
/// Returns how many modules were evicted.
pub fn invalidate_matching(cache: &dyn ModuleCache, pattern: &ModulePattern) -> usize {
    cache
        .filenames()
        .into_iter()
        .filter(|filename| pattern.matches(filename))
        .filter(|filename| cache.evict(filename))
        .count()
}
