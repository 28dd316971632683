//! Module resolution and loading for the JavaScript runtime.
//!
//! Resolves `require` specifiers to files, applies the registered source
//! transform to files inside its scope and memoizes the result in the
//! [`MemoryModuleCache`].

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use reactviews_core::{TransformConfig, ViewDirectories};

use crate::{
    cache::{LoadedModule, MemoryModuleCache},
    error::{Result, ViewError},
};

/// Suffixes tried, in order, when a specifier does not name a file.
const RESOLVE_SUFFIXES: [&str; 5] = ["", ".js", ".jsx", "/index.js", "/index.jsx"];

/// Compiles one source file with a transform configuration.
pub trait SourceCompiler: Send + Sync {
    fn compile(&self, filename: &Path, source: &str, config: &TransformConfig) -> Result<String>;
}

/// A compiler bound to the directories it may touch.
#[derive(Clone)]
pub struct ScopedTransform {
    pub scope: ViewDirectories,
    pub config: TransformConfig,
    pub compiler: Arc<dyn SourceCompiler>,
}

impl std::fmt::Debug for ScopedTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTransform")
            .field("scope", &self.scope)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Loads template modules from disk through the shared cache.
#[derive(Debug, Default)]
pub struct ModuleLoader {
    cache: MemoryModuleCache,
    transform: RwLock<Option<ScopedTransform>>,
}

impl ModuleLoader {
    pub fn new(cache: MemoryModuleCache) -> Self {
        Self {
            cache,
            transform: RwLock::new(None),
        }
    }

    pub fn cache(&self) -> &MemoryModuleCache {
        &self.cache
    }

    /// Install the transform applied to files inside `transform.scope`.
    ///
    /// Returns the previously installed transform, if any.
    pub fn install_transform(&self, transform: ScopedTransform) -> Option<ScopedTransform> {
        self.transform
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(transform)
    }

    pub fn has_transform(&self) -> bool {
        self.transform
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Load `specifier` as required from `parent` (`None` for an entry point).
    pub fn load(&self, parent: Option<&Path>, specifier: &str) -> Result<Arc<LoadedModule>> {
        let filename = resolve(parent, specifier)?;

        if let Some(module) = self.cache.get(&filename) {
            tracing::debug!(filename = %filename.display(), "Module cache hit");
            return Ok(module);
        }

        tracing::debug!(filename = %filename.display(), "Module cache miss");

        let source = std::fs::read_to_string(&filename).map_err(|e| ViewError::Load {
            path: filename.clone(),
            reason: e.to_string(),
        })?;

        let transform = self
            .transform
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let module = match transform {
            Some(transform) if transform.scope.contains(&filename) => {
                let code = transform
                    .compiler
                    .compile(&filename, &source, &transform.config)?;
                LoadedModule {
                    filename,
                    code: Arc::from(code),
                    transformed: true,
                }
            }
            _ => LoadedModule {
                filename,
                code: Arc::from(source),
                transformed: false,
            },
        };

        Ok(self.cache.insert(module))
    }
}

/// Resolve a specifier to an existing file.
///
/// Absolute specifiers stand alone, relative ones (`./`, `../`) are joined
/// to the parent's directory. Bare specifiers are not resolved here.
pub fn resolve(parent: Option<&Path>, specifier: &str) -> Result<PathBuf> {
    let not_found = || ViewError::ModuleNotFound {
        specifier: specifier.to_string(),
    };

    let requested = Path::new(specifier);
    let base = if requested.is_absolute() {
        requested.to_path_buf()
    } else if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = parent.and_then(Path::parent).ok_or_else(not_found)?;
        dir.join(requested)
    } else if parent.is_none() {
        std::path::absolute(requested).map_err(|_| not_found())?
    } else {
        return Err(not_found());
    };

    let base = normalize(&base);
    RESOLVE_SUFFIXES
        .iter()
        .map(|suffix| {
            let mut candidate = OsString::from(base.as_os_str());
            candidate.push(suffix);
            PathBuf::from(candidate)
        })
        .find(|candidate| candidate.is_file())
        .ok_or_else(not_found)
}

/// Lexically remove `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::test_support::TempViews;

    /// Upper-cases the source and counts calls.
    #[derive(Default)]
    struct UpperCompiler {
        calls: AtomicUsize,
    }

    impl SourceCompiler for UpperCompiler {
        fn compile(&self, _: &Path, source: &str, _: &TransformConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(source.to_uppercase())
        }
    }

    #[test]
    fn test_normalize_removes_dot_segments() {
        assert_eq!(
            normalize(Path::new("/app/views/./partials/../layout.jsx")),
            PathBuf::from("/app/views/layout.jsx")
        );
    }

    #[test]
    fn test_resolve_tries_extensions_and_index() {
        let views = TempViews::new();
        let home = views.write("home.jsx", "");
        let layout = views.write("layout/index.js", "");

        assert_eq!(resolve(None, &home.to_string_lossy()).unwrap(), home);
        assert_eq!(resolve(Some(&home), "./home").unwrap(), home);
        assert_eq!(resolve(Some(&home), "./layout").unwrap(), layout);
        assert_eq!(resolve(Some(&layout), "../home.jsx").unwrap(), home);
    }

    #[test]
    fn test_resolve_rejects_bare_and_missing_specifiers() {
        let views = TempViews::new();
        let home = views.write("home.jsx", "");

        assert!(matches!(
            resolve(Some(&home), "lodash"),
            Err(ViewError::ModuleNotFound { .. })
        ));
        assert!(matches!(
            resolve(Some(&home), "./missing"),
            Err(ViewError::ModuleNotFound { specifier }) if specifier == "./missing"
        ));
    }

    #[test]
    fn test_load_caches_modules() {
        let views = TempViews::new();
        let home = views.write("home.js", "module.exports = 1;");
        let loader = ModuleLoader::new(MemoryModuleCache::new());

        let first = loader.load(None, &home.to_string_lossy()).unwrap();
        std::fs::write(&home, "module.exports = 2;").unwrap();
        let second = loader.load(None, &home.to_string_lossy()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*second.code, "module.exports = 1;");
        assert_eq!(loader.cache().len(), 1);
    }

    #[test]
    fn test_transform_applies_only_inside_scope() {
        let views = TempViews::new();
        let inside = views.write("views/home.jsx", "inside");
        let outside = views.write("lib/util.js", "outside");

        let compiler = Arc::new(UpperCompiler::default());
        let loader = ModuleLoader::new(MemoryModuleCache::new());
        let previous = loader.install_transform(ScopedTransform {
            scope: ViewDirectories::from(views.root.join("views")),
            config: TransformConfig::default(),
            compiler: compiler.clone(),
        });
        assert!(previous.is_none());
        assert!(loader.has_transform());

        let transformed = loader.load(None, &inside.to_string_lossy()).unwrap();
        let verbatim = loader.load(Some(&inside), "../lib/util").unwrap();

        assert!(transformed.transformed);
        assert_eq!(&*transformed.code, "INSIDE");
        assert!(!verbatim.transformed);
        assert_eq!(&*verbatim.code, "outside");
        assert_eq!(verbatim.filename, outside);

        // Cached modules are not transformed again
        loader.load(None, &inside.to_string_lossy()).unwrap();
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
    }
}
