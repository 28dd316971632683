//! View directories and the filename pattern derived from them.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One view directory or an ordered list of them, as the host configures it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewDirectories {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl ViewDirectories {
    /// Iterate the directories in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        let dirs: &[PathBuf] = match self {
            Self::One(dir) => std::slice::from_ref(dir),
            Self::Many(dirs) => dirs,
        };
        dirs.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(dirs) => dirs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First directory, used to resolve view names.
    pub fn first(&self) -> Option<&Path> {
        self.iter().next()
    }

    /// Whether `path` lies inside one of the directories (component-wise).
    pub fn contains(&self, path: &Path) -> bool {
        self.iter().any(|dir| path.starts_with(dir))
    }

    /// Build the eviction pattern for these directories.
    pub fn pattern(&self) -> Result<ModulePattern> {
        ModulePattern::new(self)
    }
}

impl From<&str> for ViewDirectories {
    fn from(dir: &str) -> Self {
        Self::One(PathBuf::from(dir))
    }
}

impl From<String> for ViewDirectories {
    fn from(dir: String) -> Self {
        Self::One(PathBuf::from(dir))
    }
}

impl From<PathBuf> for ViewDirectories {
    fn from(dir: PathBuf) -> Self {
        Self::One(dir)
    }
}

impl From<&Path> for ViewDirectories {
    fn from(dir: &Path) -> Self {
        Self::One(dir.to_path_buf())
    }
}

impl<T: Into<PathBuf>> From<Vec<T>> for ViewDirectories {
    fn from(dirs: Vec<T>) -> Self {
        Self::Many(dirs.into_iter().map(Into::into).collect())
    }
}

/// Matches filenames that start with any of the configured view directories.
///
/// Each directory is escaped and anchored at the start, so the match is a
/// literal string prefix: `/app/views` also matches `/app/views2/page.jsx`.
#[derive(Clone, Debug)]
pub struct ModulePattern {
    regex: Regex,
}

impl ModulePattern {
    pub fn new(views: &ViewDirectories) -> Result<Self> {
        if views.is_empty() {
            return Err(CoreError::EmptyViewDirectories);
        }

        let source = views
            .iter()
            .map(|dir| format!("^{}", regex::escape(&dir.to_string_lossy())))
            .collect::<Vec<_>>()
            .join("|");

        let regex = Regex::new(&source).map_err(|e| CoreError::Pattern(e.to_string()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, filename: &Path) -> bool {
        self.regex.is_match(&filename.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
