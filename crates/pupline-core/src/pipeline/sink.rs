//! Where encoded derivatives are persisted.

use std::io;
use std::path::Path;

/// Destination for encoded artifacts.
///
/// The processor only talks to this trait, so persistence failures for a
/// single derivative can be injected without touching the filesystem.
pub trait ArtifactSink: Send + Sync {
    /// Make sure the item directory exists.
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Persist one encoded artifact.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Remove an artifact written earlier.
    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Writes artifacts to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl ArtifactSink for FsSink {
    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }
}
