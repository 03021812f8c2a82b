use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Spans longer than this are verified by hash instead of by copy.
const HASH_THRESHOLD: usize = 1024;

/// A single verified byte-span replacement inside one file.
///
/// Every rewrite the migration performs is expressed as a set of these.
/// The rule module decides *where* to edit; this module only decides
/// whether the span still holds what the rule saw, and writes the result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is applied"]
pub struct Edit {
    /// File the span belongs to
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text to put at [byte_start, byte_end)
    pub new_text: String,
    /// What the span must currently contain
    pub expected_before: EditVerification,
}

/// How an edit checks the span before overwriting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of the expected text
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected) => xxh3_64(text.as_bytes()) == *expected,
        }
    }

    /// Exact match for short spans, hash above 1 KiB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > HASH_THRESHOLD {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Before-text verification failed at {file}:{byte_start} (found {found:?})")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("File is not writable: {0}")]
    ReadOnly(PathBuf),

    #[error("Edits for {0} span more than one file")]
    MixedFiles(PathBuf),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Edit would create malformed UTF-8")]
    InvalidUtf8Edit,
}

/// Outcome of applying the edits of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for applied/already-applied"]
pub enum EditResult {
    /// The file was rewritten
    Applied {
        file: PathBuf,
        edits_applied: usize,
        new_content: String,
    },
    /// Every span already held its new text; the file was not written
    AlreadyApplied { file: PathBuf },
}

impl Edit {
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl AsRef<str>,
    ) -> Self {
        Self::with_verification(
            file,
            byte_start,
            byte_end,
            new_text,
            EditVerification::from_text(expected_before.as_ref()),
        )
    }

    pub fn with_verification(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        verification: EditVerification,
    ) -> Self {
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: verification,
        }
    }

    /// Check the span against `content`.
    ///
    /// Returns `true` if the span already holds `new_text`.
    fn check(&self, content: &[u8]) -> Result<bool, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        let current = std::str::from_utf8(&content[self.byte_start..self.byte_end])?;
        if current == self.new_text {
            return Ok(true);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(false)
    }

    /// Apply this edit on its own.
    pub fn apply(self) -> Result<EditResult, EditError> {
        let file = self.file.clone();
        apply_edits(&file, vec![self])
    }
}

/// Splice `edits` into `content` in memory.
///
/// Returns the new content and how many edits changed something, or
/// `None` when every span already held its new text.
pub fn splice(content: &[u8], mut edits: Vec<Edit>) -> Result<Option<(String, usize)>, EditError> {
    // Bottom-to-top so earlier offsets stay valid.
    edits.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));

    for pair in edits.windows(2) {
        let (later, earlier) = (&pair[0], &pair[1]);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::InvalidByteRange {
                byte_start: later.byte_start,
                byte_end: earlier.byte_end,
                file_len: content.len(),
            });
        }
    }

    let mut pending = Vec::with_capacity(edits.len());
    for edit in edits {
        if !edit.check(content)? {
            pending.push(edit);
        }
    }

    if pending.is_empty() {
        return Ok(None);
    }

    let mut new_content = content.to_vec();
    for edit in &pending {
        new_content.splice(
            edit.byte_start..edit.byte_end,
            edit.new_text.as_bytes().iter().copied(),
        );
    }

    let text = String::from_utf8(new_content).map_err(|_| EditError::InvalidUtf8Edit)?;
    Ok(Some((text, pending.len())))
}

/// Apply all edits for `file` in one atomic write.
///
/// The file is re-read and every span verified first; if any check fails
/// nothing is written.
pub fn apply_edits(file: &Path, edits: Vec<Edit>) -> Result<EditResult, EditError> {
    if let Some(stray) = edits.iter().find(|edit| edit.file != file) {
        return Err(EditError::MixedFiles(stray.file.clone()));
    }

    let original = fs::read(file)?;

    match splice(&original, edits)? {
        None => Ok(EditResult::AlreadyApplied {
            file: file.to_path_buf(),
        }),
        Some((new_content, edits_applied)) => {
            atomic_write(file, new_content.as_bytes())?;
            Ok(EditResult::Applied {
                file: file.to_path_buf(),
                edits_applied,
                new_content,
            })
        }
    }
}

/// Write via a temp file in the same directory, fsync, then rename over `path`.
///
/// `path` itself must be writable; the rename would otherwise bypass its
/// permissions.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let metadata = fs::metadata(path)?;
    if metadata.permissions().readonly() {
        return Err(EditError::ReadOnly(path.to_path_buf()));
    }
    fs::OpenOptions::new().write(true).open(path)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Carry the original permissions over; NamedTempFile creates 0600.
    fs::set_permissions(temp.path(), metadata.permissions())?;

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
