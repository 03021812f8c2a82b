//! The `withOpacity` → `withValues(alpha: ...)` rewrite rule.
//!
//! Matching is purely textual: `.withOpacity(` followed by one or more
//! characters from `[0-9.]` and a closing `)`. Occurrences inside Dart
//! comments or string literals are rewritten as well.

use crate::edit::{Edit, EditVerification};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Regular expression for the deprecated call. Group 1 is the alpha value.
pub const OPACITY_PATTERN: &str = r"\.withOpacity\(([0-9.]+)\)";

static OPACITY_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(OPACITY_PATTERN).expect("opacity pattern is a valid regex"));

/// One located `.withOpacity(<number>)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityMatch {
    /// Byte range of the whole call, including the leading dot
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text
    pub text: String,
    /// The captured numeric argument, verbatim
    pub alpha: String,
}

impl OpacityMatch {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let whole = caps.get(0).expect("group 0 is always present");
        Self {
            byte_start: whole.start(),
            byte_end: whole.end(),
            text: whole.as_str().to_string(),
            alpha: caps[1].to_string(),
        }
    }

    /// The text this call is rewritten to.
    pub fn replacement(&self) -> String {
        replacement_for(&self.alpha)
    }

    /// Build the edit that swaps this call for its replacement in `file`.
    pub fn to_edit(&self, file: impl Into<PathBuf>) -> Edit {
        Edit::with_verification(
            file,
            self.byte_start,
            self.byte_end,
            self.replacement(),
            EditVerification::from_text(&self.text),
        )
    }
}

/// `.withValues(alpha: <alpha>)`
pub fn replacement_for(alpha: &str) -> String {
    format!(".withValues(alpha: {alpha})")
}

/// Every deprecated call in `source`, in source order.
pub fn find_matches(source: &str) -> Vec<OpacityMatch> {
    OPACITY_CALL
        .captures_iter(source)
        .map(|caps| OpacityMatch::from_captures(&caps))
        .collect()
}

/// Rewrite all deprecated calls in `source`.
///
/// Borrows the input unchanged when there is nothing to rewrite.
pub fn rewrite_source(source: &str) -> Cow<'_, str> {
    OPACITY_CALL.replace_all(source, |caps: &Captures<'_>| replacement_for(&caps[1]))
}
