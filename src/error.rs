//! Error taxonomy shared by the fingerprinting and rewriting core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the core modules.
pub type AssetResult<T> = Result<T, AssetError>;

/// Fatal conditions raised by the core. Non-fatal conditions (unresolved references,
/// missing bundled scripts) are logged and reported instead of returned.
#[derive(Debug, Error)]
pub enum AssetError {
  /// A source file could not be read.
  #[error("failed to read {}: {source}", path.display())]
  Read {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: io::Error,
  },
  /// Build output could not be written.
  #[error("failed to write {}: {source}", path.display())]
  Write {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: io::Error,
  },
  /// A path could not be interpreted for resolution.
  #[error("invalid asset path {}: {reason}", path.display())]
  InvalidPath {
    /// Offending path.
    path: PathBuf,
    /// Short description of the problem.
    reason: &'static str,
  },
}

impl AssetError {
  pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Read {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Write {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn invalid(path: impl Into<PathBuf>, reason: &'static str) -> Self {
    Self::InvalidPath {
      path: path.into(),
      reason,
    }
  }
}
