//! In-memory cache of loaded template modules.
//!
//! Keys are normalized absolute filenames. Each entry holds the code that
//! was handed to the JavaScript runtime, after any source transform.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::ModuleCache;

/// A module as the runtime sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub filename: PathBuf,
    pub code: Arc<str>,
    /// Whether the source went through the registered transform.
    pub transformed: bool,
}

/// Thread-safe module cache shared between the loader and the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleCache {
    modules: Arc<RwLock<HashMap<PathBuf, Arc<LoadedModule>>>>,
}

impl MemoryModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &Path) -> Option<Arc<LoadedModule>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(filename)
            .cloned()
    }

    /// Cache `module` under its filename, returning the entry now stored.
    pub fn insert(&self, module: LoadedModule) -> Arc<LoadedModule> {
        let module = Arc::new(module);
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module.filename.clone(), Arc::clone(&module));
        module
    }

    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ModuleCache for MemoryModuleCache {
    fn filenames(&self) -> Vec<PathBuf> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn evict(&self, filename: &Path) -> bool {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(filename)
            .is_some()
    }
}
