//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with in-memory implementations.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Output written aside and moved into place only on [`StagedFile::commit`].
///
/// Dropping a staged file without committing discards everything written,
/// the target path is left untouched.
pub trait StagedFile: Write + Send {
    /// Flush and atomically replace the target with the staged content.
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Start writing a replacement for `path`.
    fn stage(&self, path: &Path) -> io::Result<Box<dyn StagedFile>>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn stage(&self, path: &Path) -> io::Result<Box<dyn StagedFile>> {
        // Same directory as the target so the final rename stays on one filesystem
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        Ok(Box::new(TempFileStage {
            writer: BufWriter::new(temp),
            target: path.to_path_buf(),
        }))
    }
}

/// Staged output backed by a named temp file next to the target.
struct TempFileStage {
    writer: BufWriter<NamedTempFile>,
    target: PathBuf,
}

impl Write for TempFileStage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl StagedFile for TempFileStage {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let TempFileStage { writer, target } = *self;
        let temp = writer.into_inner().map_err(|e| e.into_error())?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}
