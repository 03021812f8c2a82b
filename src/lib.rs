//! Opacity Migrate: rewrites deprecated Flutter `withOpacity` calls
//!
//! Walks a Dart source tree and turns every `.withOpacity(<number>)` into
//! `.withValues(alpha: <number>)`, keeping the number exactly as written.
//!
//! # Architecture
//!
//! Span acquisition and span application are kept apart. The [`rule`]
//! module finds calls and turns each into an [`Edit`]; the [`edit`]
//! module verifies the spans against the file on disk and writes the
//! result. [`migrate`] strings the two together over the files that
//! [`discover`] finds.
//!
//! # Safety
//!
//! - Files without a match are never written
//! - Each span is re-verified against the file before writing
//! - Atomic file writes (tempfile + fsync + rename)
//! - Writes are confined to the root directory
//! - One failing file does not stop the run
//!
//! # Example
//!
//! ```no_run
//! use opacity_migrate::{FileReport, Migrator};
//!
//! let migrator = Migrator::new("app/lib")?;
//! let summary = migrator.run(|report| {
//!     if let FileReport::Done(outcome) = report {
//!         if outcome.is_fixed() {
//!             println!("{outcome}");
//!         }
//!     }
//! });
//! println!("Total files fixed: {}", summary.fixed_count());
//! # Ok::<(), opacity_migrate::SafetyError>(())
//! ```

pub mod discover;
pub mod edit;
pub mod migrate;
pub mod rule;
pub mod safety;

// Re-exports
pub use discover::{discover_files, has_extension, DiscoverError, Discovery, TARGET_EXTENSION};
pub use edit::{apply_edits, Edit, EditError, EditResult, EditVerification};
pub use migrate::{fix_file, FileOutcome, FileReport, MigrateError, Migrator, Summary};
pub use rule::{find_matches, replacement_for, rewrite_source, OpacityMatch, OPACITY_PATTERN};
pub use safety::{RootGuard, SafetyError};
