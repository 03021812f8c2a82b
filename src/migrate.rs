//! Migration driver: discover files, rewrite each one, tally the results.
//!
//! Files are handled one at a time in traversal order. A file that cannot
//! be read, decoded or written is logged and skipped; the rest of the batch
//! still runs.

use crate::discover::{discover_files, DiscoverError, TARGET_EXTENSION};
use crate::edit::{apply_edits, EditError, EditResult};
use crate::rule::find_matches;
use crate::safety::{RootGuard, SafetyError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Discover(#[from] DiscoverError),
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileOutcome reports whether the file was rewritten"]
pub enum FileOutcome {
    /// At least one call was rewritten and the file was saved
    Fixed {
        file: PathBuf,
        replacements: usize,
        original: String,
        rewritten: String,
    },
    /// Nothing matched; the file was not written
    Unchanged { file: PathBuf },
}

impl FileOutcome {
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::Fixed { file, .. } | FileOutcome::Unchanged { file } => file,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, FileOutcome::Fixed { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Fixed { file, .. } => write!(f, "Fixed: {}", file.display()),
            FileOutcome::Unchanged { file } => write!(f, "Unchanged: {}", file.display()),
        }
    }
}

/// Per-file progress handed to the caller as the run goes.
#[derive(Debug)]
pub enum FileReport<'a> {
    Done(&'a FileOutcome),
    Failed {
        file: Option<&'a Path>,
        error: &'a MigrateError,
    },
}

/// Totals for one run.
#[derive(Debug, Default)]
pub struct Summary {
    /// Rewritten files, in traversal order
    pub fixed: Vec<PathBuf>,
    pub unchanged: usize,
    /// Files (or unreadable directory entries) that were skipped
    pub failed: Vec<(Option<PathBuf>, MigrateError)>,
}

impl Summary {
    pub fn fixed_count(&self) -> usize {
        self.fixed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Rewrite the deprecated calls in one file.
///
/// The file is only written when at least one call matched.
pub fn fix_file(path: &Path) -> Result<FileOutcome, MigrateError> {
    let bytes = fs::read(path).map_err(|source| MigrateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let original = String::from_utf8(bytes).map_err(|source| MigrateError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let matches = find_matches(&original);
    debug!(file = %path.display(), matches = matches.len(), "scanned");

    if matches.is_empty() {
        return Ok(FileOutcome::Unchanged {
            file: path.to_path_buf(),
        });
    }

    let edits = matches.iter().map(|m| m.to_edit(path)).collect();

    match apply_edits(path, edits)? {
        EditResult::Applied {
            edits_applied,
            new_content,
            ..
        } => Ok(FileOutcome::Fixed {
            file: path.to_path_buf(),
            replacements: edits_applied,
            original,
            rewritten: new_content,
        }),
        EditResult::AlreadyApplied { .. } => Ok(FileOutcome::Unchanged {
            file: path.to_path_buf(),
        }),
    }
}

/// Runs the migration over one root directory.
#[derive(Debug, Clone)]
pub struct Migrator {
    guard: RootGuard,
    extension: String,
}

impl Migrator {
    /// Validate `root` and prepare a run over its `.dart` files.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        Ok(Self {
            guard: RootGuard::new(root)?,
            extension: TARGET_EXTENSION.to_string(),
        })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Resolve `path` inside the root before it is read, then fix it.
    fn fix_guarded(&self, path: &Path) -> Result<FileOutcome, MigrateError> {
        let target = self.guard.revalidate(path)?;
        let outcome = fix_file(&target)?;
        // Report under the discovered path, not the canonical one.
        Ok(match outcome {
            FileOutcome::Fixed {
                replacements,
                original,
                rewritten,
                ..
            } => FileOutcome::Fixed {
                file: path.to_path_buf(),
                replacements,
                original,
                rewritten,
            },
            FileOutcome::Unchanged { .. } => FileOutcome::Unchanged {
                file: path.to_path_buf(),
            },
        })
    }

    /// Process every candidate file, calling `report` after each one.
    pub fn run<F>(&self, mut report: F) -> Summary
    where
        F: FnMut(FileReport<'_>),
    {
        let discovery = discover_files(self.guard.root(), &self.extension);
        let mut summary = Summary::default();

        for err in discovery.errors {
            let path = err.path().map(Path::to_path_buf);
            let error = MigrateError::from(err);
            warn!(error = %error, "skipping unreadable entry");
            report(FileReport::Failed {
                file: path.as_deref(),
                error: &error,
            });
            summary.failed.push((path, error));
        }

        for path in discovery.files {
            match self.fix_guarded(&path) {
                Ok(outcome) => {
                    report(FileReport::Done(&outcome));
                    match outcome {
                        FileOutcome::Fixed { file, .. } => summary.fixed.push(file),
                        FileOutcome::Unchanged { .. } => summary.unchanged += 1,
                    }
                }
                Err(error) => {
                    warn!(file = %path.display(), error = %error, "skipping file");
                    report(FileReport::Failed {
                        file: Some(&path),
                        error: &error,
                    });
                    summary.failed.push((Some(path), error));
                }
            }
        }

        debug!(
            fixed = summary.fixed_count(),
            unchanged = summary.unchanged,
            skipped = summary.skipped_count(),
            "migration finished"
        );

        summary
    }
}
