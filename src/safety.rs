use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps every write inside the migration root.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical path to the root directory
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Path is outside root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize().map_err(|source| SafetyError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

impl RootGuard {
    /// Canonicalize `root` and require it to be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(SafetyError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// Check that `path` resolves to somewhere under the root.
    ///
    /// Relative paths are taken relative to the root. Returns the
    /// canonical path.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        self.revalidate(&absolute)
    }

    /// Re-canonicalize and re-check a discovered path before it is read
    /// and rewritten.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(path)?;
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        }
        Ok(canonical)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
