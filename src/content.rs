//! Read access to asset content, injected into the fingerprinting and bundling code.

use std::fs;
use std::io;
use std::path::Path;

/// Capability for reading source content during a build.
pub trait ContentSource {
  /// Read the full byte content of a file.
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Returns `true` when a regular file exists at `path`.
  fn exists(&self, path: &Path) -> bool;
}

/// Content source backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContent;

impl ContentSource for FsContent {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn exists(&self, path: &Path) -> bool {
    path.is_file()
  }
}

#[cfg(test)]
pub(crate) use memory::MemoryContent;
