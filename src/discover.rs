//! Recursive discovery of candidate source files.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// File-name suffix selected for migration (without the dot).
pub const TARGET_EXTENSION: &str = "dart";

#[derive(Error, Debug)]
#[error("Failed to read directory entry: {0}")]
pub struct DiscoverError(#[from] walkdir::Error);

impl DiscoverError {
    /// The path the walker was looking at, if known.
    pub fn path(&self) -> Option<&Path> {
        self.0.path()
    }
}

/// Files found under a root, plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Selected files in traversal order
    pub files: Vec<PathBuf>,
    pub errors: Vec<DiscoverError>,
}

/// Does the file name end in `.<extension>`?
///
/// A file named exactly `.dart` does not count.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    name.len() > extension.len() + 1
        && name
            .strip_suffix(extension)
            .is_some_and(|stem| stem.ends_with('.'))
}

/// Walk `root` recursively and collect every regular file ending in
/// `.<extension>`.
///
/// No directory is excluded: hidden folders, build output and VCS
/// metadata are walked like anything else. Directory symlinks are not
/// followed; a symlink whose target is a regular file is selected under
/// the link's path. Entries are visited in file-name order within each
/// directory.
pub fn discover_files(root: &Path, extension: &str) -> Discovery {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                discovery.errors.push(DiscoverError::from(err));
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());

        if is_file && has_extension(entry.path(), extension) {
            discovery.files.push(entry.into_path());
        }
    }

    debug!(
        root = %root.display(),
        files = discovery.files.len(),
        errors = discovery.errors.len(),
        "discovery finished"
    );

    discovery
}
