//! Source transform registration backed by the module loader.

use std::sync::Arc;

use reactviews_core::{TransformConfig, ViewDirectories};

use crate::{
    error::Result,
    loader::{ModuleLoader, ScopedTransform, SourceCompiler},
    traits::SourceTransform,
};

/// Registers a compiler (Babel by default) with a [`ModuleLoader`].
///
/// After registration every module the loader reads from inside the scope
/// is compiled before it is cached.
#[derive(Clone)]
pub struct BabelTransform {
    loader: Arc<ModuleLoader>,
    compiler: Arc<dyn SourceCompiler>,
}

impl BabelTransform {
    pub fn new(loader: Arc<ModuleLoader>, compiler: impl SourceCompiler + 'static) -> Self {
        Self {
            loader,
            compiler: Arc::new(compiler),
        }
    }
}

impl SourceTransform for BabelTransform {
    fn register(&self, scope: &ViewDirectories, config: &TransformConfig) -> Result<()> {
        let previous = self.loader.install_transform(ScopedTransform {
            scope: scope.clone(),
            config: config.clone(),
            compiler: Arc::clone(&self.compiler),
        });

        if let Some(previous) = previous {
            tracing::warn!(
                previous = ?previous.scope,
                scope = ?scope,
                "Source transform registered again, replacing scope"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::cache::MemoryModuleCache;

    struct Identity;

    impl SourceCompiler for Identity {
        fn compile(&self, _: &Path, source: &str, _: &TransformConfig) -> Result<String> {
            Ok(source.to_string())
        }
    }

    #[test]
    fn test_register_installs_scoped_transform() {
        let loader = Arc::new(ModuleLoader::new(MemoryModuleCache::new()));
        let transform = BabelTransform::new(Arc::clone(&loader), Identity);
        assert!(!loader.has_transform());

        let views = ViewDirectories::from("/app/views");
        transform
            .register(&views, &TransformConfig::default().scoped_to(&views))
            .unwrap();
        assert!(loader.has_transform());

        // A second registration replaces the first
        let other = ViewDirectories::from("/app/other");
        transform.register(&other, &TransformConfig::default()).unwrap();
        let previous = loader
            .install_transform(ScopedTransform {
                scope: views.clone(),
                config: TransformConfig::default(),
                compiler: Arc::new(Identity),
            })
            .unwrap();
        assert_eq!(previous.scope, other);
    }
}
