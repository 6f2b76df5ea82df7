//! Compilation errors

use crate::importer::ImportError;
use thiserror::Error;

/// Result of a compiler-facing loader operation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal failures surfaced by the type-loading API.
///
/// Recoverable conditions (a candidate with no matching manifest) never
/// appear here; the loader absorbs them and moves on to the next candidate.
/// What remains is genuinely fatal: malformed manifest content, unreadable
/// files, or conflicting type definitions.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A located manifest could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),
}
