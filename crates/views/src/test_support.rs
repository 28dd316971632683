//! Helpers shared by the unit tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// A view tree in a temporary directory, removed on drop.
pub struct TempViews {
    pub root: PathBuf,
    _dir: TempDir,
}

impl TempViews {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("reactviews-")
            .tempdir()
            .unwrap();
        Self {
            root: dir.path().to_path_buf(),
            _dir: dir,
        }
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }
}
